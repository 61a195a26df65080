//! Admin Module
//!
//! Account moderation for admins. Featuring stories is open to moderators
//! as well and lives in `backend::community`.

pub mod handlers;

pub use handlers::{approve_user, change_role, delete_user, list_users, reject_user, suspend_user};
