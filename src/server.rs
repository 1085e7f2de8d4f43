//! HTTP API over the in-process calculator

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ViewerError;
use crate::library::ProfileLibrary;
use crate::transport::{HealthResponse, LocalCalculator, RecalculationRequest};

type AppState = Arc<LocalCalculator>;

/// Create the API router
pub fn create_router(calculator: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/calculate/section-json", post(calculate))
        .route("/api/section-library", get(section_library))
        .route("/api/download_json/:tower_id", get(download))
        .layer(cors)
        .with_state(calculator)
}

/// `{"error": msg}` with 400 for rejected requests, 500 otherwise
struct ApiError(ViewerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ViewerError::Domain(_) | ViewerError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<ViewerError> for ApiError {
    fn from(e: ViewerError) -> Self {
        ApiError(e)
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn calculate(
    State(calculator): State<AppState>,
    Json(request): Json<RecalculationRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = calculator.calculate(&request.tower, &request.element_sections)?;
    Ok(Json(payload))
}

async fn section_library(State(calculator): State<AppState>) -> Json<ProfileLibrary> {
    Json(calculator.library().clone())
}

async fn download(
    State(calculator): State<AppState>,
    Path(tower_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let data = calculator.saved_geometry(&tower_id)?;
    Ok(Json(json!({
        "message": "Geometry retrieved",
        "tower_id": tower_id,
        "data": data,
    })))
}
