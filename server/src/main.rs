//! Blog API server: loads settings, connects the pool and serves the JSON API.
//!
//! Run from repo root: `cargo run -p blog-server`

use blog_core::{app, config, models, AppState, Database};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blog_core=info,blog_server=info")),
        )
        .init();

    let config = config::load()?;
    let schemas = models::registry()?;
    let db = Database::connect(
        &config.db.database_url(),
        config.db.max_connections,
        config.db.min_connections,
    )
    .await?;

    if config.db.create_tables {
        for schema in schemas.schemas() {
            match db.execute(&schema.ddl(), &[], true).await {
                Ok(_) => tracing::info!(table = %schema.table(), "created table"),
                Err(e) => tracing::warn!(table = %schema.table(), error = %e, "create table skipped"),
            }
        }
    }

    let bind = config.server.bind.clone();
    let router = app(AppState::new(db, schemas, config))?;
    let listener = TcpListener::bind(&bind).await?;
    tracing::info!("server started at http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
