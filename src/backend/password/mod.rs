//! Password Analyzer
//!
//! The scoring itself lives in `shared::password`; this module serves it
//! over HTTP and keeps the saved history.

pub mod db;

pub mod handlers;

pub use handlers::{check_password, delete_history, list_history, save_history};
