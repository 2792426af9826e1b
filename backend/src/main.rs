use axum::http::Method;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

mod config;
mod context;
mod domain;
mod rest;
mod storage;

use config::AppConfig;
use rest::AppState;
use storage::DbConnection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = AppConfig::from_env();

    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url).await?;

    let admin_id = db.seed_admin("Administrador").await?;
    info!("Admin account id: {admin_id}");

    let state = AppState::new(db, config.clone());

    // The API sits behind a reverse proxy; browsers still need CORS for
    // the admin frontend during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", rest::api_router())
        .layer(cors)
        .with_state(state);

    info!("Starting server on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
