// Portfolio content server - blog posts, engagement counters and projects

use axum::Router;
use std::path::Path;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use portfolio_content::{
    app_state::AppState,
    blog_interface::create_blog_router,
    config::Config,
    data_seeder::seed_from_file,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("portfolio_content=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    ensure_database_dir(&config.database.url)?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    if let Some(seed_file) = &config.seed_file {
        seed_from_file(app_state.store.as_ref(), seed_file).await?;
    }

    // Build main application router
    let app = Router::new()
        .nest("/api/v1", create_blog_router(app_state.blog.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    // Start server
    let addr = config.server_address();
    info!("portfolio content server listening on http://{}", addr);
    info!("  GET  /api/v1/posts?category=&tag=");
    info!("  GET  /api/v1/posts/{{id}}");
    info!("  POST /api/v1/posts/{{id}}/like");
    info!("  GET  /api/v1/posts/{{id}}/navigate/{{direction}}");
    info!("  GET  /api/v1/projects | /api/v1/team-projects | /api/v1/health");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// SQLite creates the database file but not its parent directory
fn ensure_database_dir(url: &str) -> anyhow::Result<()> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
