//! HTTP compile service
//!
//! Exposes the executor to the editor front-end over JSON.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use coderoom::{ExecuteError, ExecutionRequest, ExecutionResult, Executor};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Code and language are required")]
    MissingFields,

    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingFields => StatusCode::BAD_REQUEST,
            ApiError::Execute(ref e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Execute(ref e) => {
                error!(error = %e, "execution failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

/// Body of `POST /api/compile`
///
/// Fields default to empty so that missing ones produce the service's own
/// 400 response.
#[derive(Debug, Deserialize)]
pub struct CompileRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompileResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: ExecutionResult,
}

pub fn create_app(executor: Executor) -> Router {
    Router::new()
        .route("/api/compile", post(compile))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(executor)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "compile service listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn compile(
    State(executor): State<Executor>,
    Json(payload): Json<CompileRequest>,
) -> Result<Json<CompileResponse>, ApiError> {
    if payload.code.is_empty() || payload.language.is_empty() {
        return Err(ApiError::MissingFields);
    }

    let request = ExecutionRequest {
        code: payload.code,
        language: payload.language,
        input: payload.input,
    };
    let result = executor.execute(&request).await?;

    Ok(Json(CompileResponse {
        success: true,
        result,
    }))
}
