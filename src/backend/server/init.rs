/**
 * Server Initialization
 *
 * Builds the Axum application from a validated `AppConfig`:
 * 1. Open the database and run migrations
 * 2. Create the room registry and broadcast dispatcher
 * 3. Assemble the router
 */

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// Create and configure the Axum application
///
/// # Errors
///
/// Returns the database error if the pool cannot be opened or migrated.
pub async fn create_app(config: AppConfig) -> Result<Router<()>, sqlx::Error> {
    tracing::info!("Initializing storyloom backend server");

    let db_pool = load_database(&config.database_url).await?;
    let app_state = AppState::new(config, db_pool);

    tracing::info!("Room registry and broadcast dispatcher initialized");

    Ok(create_router(app_state))
}
