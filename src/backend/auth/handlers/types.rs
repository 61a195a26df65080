/**
 * Authentication Handler Types
 *
 * Request and response bodies shared by the register, login, me and
 * create-admin handlers, plus the validation rules for new accounts.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::auth::users::{User, UserRole, UserStatus};
use crate::shared::SharedError;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 50;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Registration request (also used by create-admin)
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    /// Plain-text password, hashed before storage
    pub password: String,
}

impl RegisterRequest {
    /// Check field formats, returning the trimmed username and email
    pub fn validate(&self) -> Result<(String, String), SharedError> {
        let username = self.username.trim();
        let length = username.chars().count();
        if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&length) {
            return Err(SharedError::validation(
                "username",
                format!(
                    "Username must be between {} and {} characters",
                    MIN_USERNAME_LEN, MAX_USERNAME_LEN
                ),
            ));
        }

        let email = self.email.trim();
        if !is_valid_email(email) {
            return Err(SharedError::validation("email", "Invalid email address"));
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SharedError::validation(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }

        Ok((username.to_string(), email.to_string()))
    }
}

/// Basic `local@domain.tld` shape check
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        }
        None => false,
    }
}

/// Login request
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by login: a token plus the account it belongs to
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

/// Returned by register and create-admin
#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

/// User response (without sensitive data)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}
