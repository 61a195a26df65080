//! Authentication Module
//!
//! Accounts, bcrypt password hashing and JWT sessions.
//!
//! - **`users`** - `User`, roles, statuses and their queries
//! - **`sessions`** - token issue and verification
//! - **`handlers`** - register, login, me, create-admin, public profiles

pub mod users;

pub mod sessions;

pub mod handlers;

pub use handlers::{create_admin, get_me, get_profile, get_user_stories, login, register};
pub use handlers::{AuthResponse, LoginRequest, RegisterRequest, RegisterResponse, UserResponse};
pub use users::{User, UserRole, UserStatus};
