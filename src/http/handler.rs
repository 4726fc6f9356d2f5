//! HTTP handlers for the search API

use crate::search::{Match, ProfileIndex, QueryService, SearchError};
use crate::visualize::Visualization;
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Read-only state shared by all requests
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
    pub index: Arc<ProfileIndex>,
    pub visualization: Arc<Visualization>,
    pub top_k: usize,
}

impl AppState {
    pub fn new(
        service: QueryService,
        index: ProfileIndex,
        visualization: Visualization,
        top_k: usize,
    ) -> Self {
        Self {
            service: Arc::new(service),
            index: Arc::new(index),
            visualization: Arc::new(visualization),
            top_k,
        }
    }
}

/// Request for a semantic search
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Search hits as `[identity, score]` pairs
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub matches: Vec<Match>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Handler for semantic search queries
pub async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let query = match payload {
        Ok(Json(request)) => request.query.unwrap_or_default(),
        Err(rejection) => {
            warn!(error = %rejection, "Rejected query body");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    if query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No query provided");
    }

    info!(query = %query, "Search request");

    // embedding calls block; keep them off the async workers
    let top_k = state.top_k;
    let result = tokio::task::spawn_blocking(move || {
        state.service.search_index(&state.index, &query, top_k)
    })
    .await;

    match result {
        Ok(Ok(matches)) => Json(QueryResponse { matches }).into_response(),
        Ok(Err(SearchError::EmptyQuery)) => {
            error_response(StatusCode::BAD_REQUEST, "No query provided")
        }
        Ok(Err(e)) if e.is_invalid_query() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Ok(Err(e)) if e.is_service_unavailable() => {
            warn!(error = %e, "Embedding service unavailable");
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Search failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            error!(error = %e, "Search task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Search task failed")
        }
    }
}

/// Handler for the community graph artifact
pub async fn graph_handler(State(state): State<AppState>) -> Response {
    Json(state.visualization.as_ref()).into_response()
}

/// Handler for system status
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.service.encoder().model_name(),
        "profiles": state.index.len(),
        "communities": state.visualization.communities,
        "top_k": state.top_k,
    }))
}
