//! HTTP transport.
//!
//! Thin layer: every handler validates its input into a query type, calls the
//! matching data or prediction operation and serialises the result. Error
//! kinds map to distinct status codes (see [`status_for`]).

pub mod handlers;

use axum::body::Body;
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::error::ServiceError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home_handler))
        .route("/recommend", post(handlers::recommend_handler))
        .route("/filters", get(handlers::filters_handler))
        .route("/college-stats", get(handlers::college_stats_handler))
        .route("/branch-trend", get(handlers::branch_trend_handler))
        .route("/debug-columns", get(handlers::debug_columns_handler))
        .route("/predict", post(handlers::predict_handler))
        .layer(from_fn(cors_middleware))
        .with_state(state)
}

/// Allow any origin. Preflight requests are answered here with 204.
async fn cors_middleware(req: Request<Body>, next: Next) -> Response {
    let mut resp = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    let headers = resp.headers_mut();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
    resp
}

pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Validation { .. } => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Prediction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = match &self {
            ServiceError::Validation { message, fields } => {
                json!({"error": message, "fields": fields})
            }
            ServiceError::Prediction(details) => {
                json!({"error": "Prediction failed", "details": details})
            }
            ServiceError::NotFound(message) | ServiceError::Internal(message) => {
                json!({"error": message})
            }
        };
        (status, Json(body)).into_response()
    }
}
