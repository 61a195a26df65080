/**
 * User Model and Database Operations
 *
 * Accounts carry a role (`community`, `moderator`, `admin`, in increasing
 * order of privilege) and a moderation status. New registrations start as
 * `pending` and cannot log in until an admin approves them.
 */

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use uuid::Uuid;

use crate::shared::SharedError;

/// Privilege level of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Community,
    Moderator,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// True when this role grants at least the privileges of `required`
    pub fn satisfies(&self, required: UserRole) -> bool {
        *self >= required
    }
}

impl FromStr for UserRole {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "community" => Ok(Self::Community),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(SharedError::validation("role", format!("Unknown role '{}'", other))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation state of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Approved,
    Suspended,
    Rejected,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Suspended => "suspended",
            Self::Rejected => "rejected",
        }
    }

    /// Message shown to an account that may not sign in, `None` if it may
    pub fn login_denial(&self) -> Option<&'static str> {
        match self {
            Self::Approved => None,
            Self::Pending => Some("Your account is pending approval by an administrator"),
            Self::Suspended => Some("Your account has been suspended"),
            Self::Rejected => Some("Your account registration was rejected"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "suspended" => Ok(Self::Suspended),
            "rejected" => Ok(Self::Rejected),
            other => Err(SharedError::validation("status", format!("Unknown status '{}'", other))),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User struct representing a row of the `users` table
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never sent to clients
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: role.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            status: status.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, status, created_at, updated_at";

/// Insert a new user
///
/// # Errors
/// A unique violation is returned when the username or email is taken.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
    role: UserRole,
    status: UserStatus,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(status.as_str())
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Get user by email (case-insensitive)
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower(?)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Get user by username (case-insensitive)
pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lower(username) = lower(?)"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Get user by ID
pub async fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// All users, newest first
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Whether any admin account exists
pub async fn admin_exists(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Change a user's moderation status; `None` if the user does not exist
pub async fn update_user_status(
    pool: &SqlitePool,
    id: Uuid,
    status: UserStatus,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET status = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(status.as_str())
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Change a user's role; `None` if the user does not exist
pub async fn update_user_role(
    pool: &SqlitePool,
    id: Uuid,
    role: UserRole,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET role = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(role.as_str())
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Delete a user and the hearts they gave
///
/// Story heart counters are decremented for every heart removed, inside the
/// same transaction, so `stories.hearts` keeps matching the `hearts` table.
/// Returns false if no such user existed.
pub async fn delete_user(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE stories
        SET hearts = hearts - 1
        WHERE id IN (SELECT story_id FROM hearts WHERE user_id = ?)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM hearts WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::server::config::in_memory_database;

    async fn seed(pool: &SqlitePool, name: &str) -> User {
        create_user(
            pool,
            name,
            &format!("{}@example.com", name),
            "hash",
            UserRole::Community,
            UserStatus::Pending,
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(UserRole::Admin.satisfies(UserRole::Moderator));
        assert!(UserRole::Moderator.satisfies(UserRole::Moderator));
        assert!(!UserRole::Community.satisfies(UserRole::Moderator));
    }

    #[test]
    fn test_role_and_status_parse() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("owner".parse::<UserRole>().is_err());
        assert_eq!("suspended".parse::<UserStatus>().unwrap(), UserStatus::Suspended);
        assert!(UserStatus::Approved.login_denial().is_none());
        assert!(UserStatus::Pending.login_denial().is_some());
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let pool = in_memory_database().await.unwrap();
        let user = seed(&pool, "ada").await;

        assert_eq!(user.role, UserRole::Community);
        assert_eq!(user.status, UserStatus::Pending);

        let by_email = get_user_by_email(&pool, "ADA@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        let by_name = get_user_by_username(&pool, "Ada").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(get_user_by_id(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let pool = in_memory_database().await.unwrap();
        seed(&pool, "ada").await;
        let err = create_user(&pool, "ada", "other@example.com", "h", UserRole::Community, UserStatus::Pending)
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("Expected unique violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_and_role_updates() {
        let pool = in_memory_database().await.unwrap();
        let user = seed(&pool, "ada").await;
        assert!(!admin_exists(&pool).await.unwrap());

        let approved = update_user_status(&pool, user.id, UserStatus::Approved).await.unwrap().unwrap();
        assert_eq!(approved.status, UserStatus::Approved);

        let promoted = update_user_role(&pool, user.id, UserRole::Admin).await.unwrap().unwrap();
        assert_eq!(promoted.role, UserRole::Admin);
        assert!(admin_exists(&pool).await.unwrap());

        assert!(update_user_status(&pool, Uuid::new_v4(), UserStatus::Approved).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let pool = in_memory_database().await.unwrap();
        let user = seed(&pool, "ada").await;
        assert!(delete_user(&pool, user.id).await.unwrap());
        assert!(!delete_user(&pool, user.id).await.unwrap());
        assert!(list_users(&pool).await.unwrap().is_empty());
    }
}
