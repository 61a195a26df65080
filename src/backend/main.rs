/**
 * storyloom Server Entry Point
 *
 * Loads `.env`, initializes tracing, reads the configuration from the
 * environment and serves the Axum app.
 */

use storyloom::backend::server::create_app;
use storyloom::shared::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    // RUST_LOG wins; otherwise info for everything
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("Server initialization started");

    let config = AppConfig::from_env()?;
    let addr = config.socket_addr();

    let app = create_app(config).await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
