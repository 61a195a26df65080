//! Authentication Handlers
//!
//! ```text
//! handlers/
//! ├── types.rs        - Request/response bodies and validation
//! ├── register.rs     - POST /api/auth/register
//! ├── login.rs        - POST /api/auth/login
//! ├── me.rs           - GET /api/auth/me
//! ├── create_admin.rs - POST /api/auth/create-admin
//! └── profile.rs      - GET /api/users/{id}, GET /api/users/{id}/stories
//! ```

pub mod types;

pub mod register;

pub mod login;

pub mod me;

pub mod create_admin;

pub mod profile;

pub use types::{AuthResponse, LoginRequest, RegisterRequest, RegisterResponse, UserResponse};

pub use create_admin::create_admin;
pub use login::login;
pub use me::get_me;
pub use profile::{get_profile, get_user_stories};
pub use register::register;
