use std::path::Path;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::ServerConfig;

/// Full application router: `/api` routes plus the optional static front end
pub fn app(state: AppState, static_dir: Option<&str>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().nest("/api", api::router().with_state(state));

    if let Some(dir) = static_dir {
        if Path::new(dir).is_dir() {
            app = app.fallback_service(ServeDir::new(dir));
        } else {
            tracing::warn!("Static directory {} not found, serving API only", dir);
        }
    }

    app.layer(TraceLayer::new_for_http()).layer(cors)
}

pub async fn run(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = app(state, config.static_dir.as_deref());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", config.port);

    axum::serve(listener, app)
        .await
        .with_context(|| "Web server terminated")?;
    Ok(())
}
