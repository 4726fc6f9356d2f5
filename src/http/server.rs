//! HTTP server for the search API and static page

use super::handler::{graph_handler, query_handler, status_handler, AppState};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use rust_embed::RustEmbed;
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(RustEmbed)]
#[folder = "src/http/static/"]
struct Assets;

async fn static_handler() -> impl IntoResponse {
    match Assets::get("index.html") {
        Some(page) => Html(String::from_utf8_lossy(page.data.as_ref()).into_owned()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// HTTP server managing the search API and static assets
pub struct HttpServer {
    state: AppState,
    address: String,
    port: u16,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(state: AppState, address: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            address: address.into(),
            port,
        }
    }

    /// All routes, with permissive CORS
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/", get(static_handler))
            .route("/api/query", post(query_handler))
            .route("/api/graph", get(graph_handler))
            .route("/api/status", get(status_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let app = Self::router(self.state.clone());

        let addr = format!("{}:{}", self.address, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Search API available at http://{}", addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
