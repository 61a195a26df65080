/**
 * Database Configuration
 *
 * Opens the SQLite pool and brings the schema up to date with the
 * migrations embedded from `migrations/`.
 *
 * Unlike other services the database is required: the server refuses to
 * start without it, since every HTTP endpoint except the password checker
 * reads or writes it.
 */

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Connect to `database_url` and run pending migrations
///
/// # Errors
///
/// Fails if the URL is invalid, the file cannot be opened or created, or a
/// migration does not apply.
///
/// # Example
///
/// ```rust,no_run
/// use storyloom::backend::server::config::load_database;
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = load_database("sqlite://storyloom.db?mode=rwc").await?;
/// # Ok(())
/// # }
/// ```
pub async fn load_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;
    tracing::info!("Database connection pool created successfully");

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Private in-memory database, used by tests and throwaway instances
///
/// A single connection is kept open forever; with SQLite's `:memory:` every
/// connection would otherwise see its own empty database.
pub async fn in_memory_database() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(pool).await?;
    tracing::info!("Database migrations completed successfully");
    Ok(())
}
