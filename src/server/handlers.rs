use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde::Serialize;
use serde_json::{Value, json};

use crate::data::facets::facets;
use crate::data::filter::{RecommendQuery, Recommendation, recommend};
use crate::data::stats::{StatsQuery, StatsRow, branch_trend_for, college_stats};
use crate::error::{ServiceError, ServiceResult};
use crate::predict::predict;
use crate::profile::UserProfile;
use crate::state::AppState;

/// Run a CPU-bound operation off the async workers.
async fn run_blocking<T, F>(op: &'static str, f: F) -> ServiceResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("{op}: worker failed: {e}");
        ServiceError::Internal(format!("{op} failed"))
    })?
}

fn respond<T: Serialize>(op: &str, result: ServiceResult<T>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(err) => {
            if matches!(err, ServiceError::Validation { .. } | ServiceError::NotFound(_)) {
                warn!("{op}: {err}");
            }
            err.into_response()
        }
    }
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

pub(crate) async fn home_handler() -> &'static str {
    "CET College Recommender API is running."
}

pub(crate) async fn recommend_handler(State(state): State<AppState>, body: Bytes) -> Response {
    respond("recommend", recommend_body(state, &body).await)
}

async fn recommend_body(state: AppState, body: &[u8]) -> ServiceResult<Vec<Recommendation>> {
    let profile = UserProfile::from_json(body)?;
    let query = RecommendQuery::from_profile(&profile)?;
    run_blocking("recommend", move || Ok(recommend(&state.store, &query))).await
}

pub(crate) async fn filters_handler(State(state): State<AppState>) -> Response {
    Json(facets(&state.store)).into_response()
}

pub(crate) async fn college_stats_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    respond("college-stats", college_stats_body(state, params).await)
}

async fn college_stats_body(
    state: AppState,
    params: HashMap<String, String>,
) -> ServiceResult<Vec<StatsRow>> {
    let query = StatsQuery::from_params(
        param(&params, "college"),
        param(&params, "branch"),
        param(&params, "percentile"),
    )?;
    run_blocking("college-stats", move || Ok(college_stats(&state.store, &query))).await
}

pub(crate) async fn branch_trend_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let result = run_blocking("branch-trend", move || {
        branch_trend_for(
            &state.store,
            &state.trend,
            param(&params, "college"),
            param(&params, "branch"),
        )
    })
    .await;
    respond("branch-trend", result)
}

pub(crate) async fn debug_columns_handler(State(state): State<AppState>) -> Response {
    Json(json!({"columns": state.store.history_columns})).into_response()
}

pub(crate) async fn predict_handler(State(state): State<AppState>, body: Bytes) -> Response {
    respond("predict", predict_body(state, &body).await)
}

async fn predict_body(state: AppState, body: &[u8]) -> ServiceResult<Value> {
    let profile = UserProfile::from_json(body)?;
    let predictor = state.predictor.clone();
    let college = run_blocking("predict", move || predict(predictor.as_ref(), &profile)).await?;
    Ok(json!({"predicted_college": college}))
}
