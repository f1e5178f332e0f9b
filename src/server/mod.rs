//! HTTP surface: axum router exposing the gateway.

pub mod sse;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::types::ResponsesRequest;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// Build the router for a gateway.
pub fn router(gateway: Arc<Gateway>) -> Router {
    let base = gateway.config().base_path.clone();
    Router::new()
        .route(&format!("{base}/responses"), post(create_response))
        .route(&format!("{base}/models"), get(list_models))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { gateway })
}

/// Bind and serve until the listener closes.
pub async fn serve(addr: &str, gateway: Arc<Gateway>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "gateway listening");
    axum::serve(listener, router(gateway)).await
}

/// Handle the "create response" operation, streaming or not.
pub async fn create_response(
    State(state): State<AppState>,
    Json(request): Json<ResponsesRequest>,
) -> Response {
    if request.stream {
        match state.gateway.respond_stream(&request).await {
            Ok(events) => sse::stream_response(events),
            Err(error) => error_response(&error),
        }
    } else {
        match state.gateway.respond(&request).await {
            Ok(record) => (StatusCode::OK, Json(record)).into_response(),
            Err(error) => error_response(&error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    pub id: String,
    pub object: &'static str,
    pub owned_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelEntry>,
}

/// List the single model this gateway serves.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList {
        object: "list",
        data: vec![ModelEntry {
            id: state.gateway.config().model_name.clone(),
            object: "model",
            owned_by: state.gateway.engine_name().to_string(),
        }],
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub agent: String,
    pub version: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        agent: state.gateway.config().name.clone(),
        version: state.gateway.config().version.clone(),
    })
}

/// Map a gateway error to a status code and structured body. Only reached
/// before any streaming byte is sent; mid-stream failures surface as the
/// stream's terminal error event.
fn error_response(error: &GatewayError) -> Response {
    let status = if error.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        match error {
            GatewayError::EngineTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    };
    (status, Json(json!({ "error": error.payload() }))).into_response()
}
