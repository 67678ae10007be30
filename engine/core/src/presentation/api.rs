// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP control and status surface for the flock manager.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::application::manager::FlockManager;
use crate::domain::error::FlockError;
use crate::domain::flock::{FlockConfig, FlockData, FlockSummary};
use crate::domain::monkey::MonkeyData;

pub struct AppState {
    pub manager: Arc<FlockManager>,
}

pub fn app(manager: Arc<FlockManager>) -> Router {
    let state = Arc::new(AppState { manager });

    Router::new()
        .route("/flocks", get(list_flocks).post(create_flock))
        .route(
            "/flocks/{name}",
            get(get_flock).put(replace_flock).delete(delete_flock),
        )
        .route("/flocks/{name}/start", post(start_flock))
        .route("/flocks/{name}/stop", post(stop_flock))
        .route("/flocks/{name}/summary", get(flock_summary))
        .route("/flocks/{name}/monkeys", get(list_monkeys))
        .route("/flocks/{name}/monkeys/{monkey}", get(get_monkey))
        .route("/summary", get(summary))
        .with_state(state)
}

/// Flock errors mapped onto HTTP statuses.
struct ApiError(FlockError);

impl From<FlockError> for ApiError {
    fn from(err: FlockError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FlockError::FlockNotFound(_) | FlockError::MonkeyNotFound(_) => StatusCode::NOT_FOUND,
            FlockError::FlockExists(_) => StatusCode::CONFLICT,
            FlockError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FlockError::TokenService(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn list_flocks(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.manager.list_flocks().await)
}

async fn create_flock(
    State(state): State<Arc<AppState>>,
    Json(config): Json<FlockConfig>,
) -> Result<(StatusCode, Json<FlockData>), ApiError> {
    let name = config.name.clone();
    state.manager.create_flock(config).await?;
    let flock = state.manager.get_flock(&name).await?;
    Ok((StatusCode::CREATED, Json(flock.dump())))
}

async fn get_flock(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<FlockData>, ApiError> {
    Ok(Json(state.manager.get_flock(&name).await?.dump()))
}

async fn replace_flock(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(config): Json<FlockConfig>,
) -> Result<Json<FlockData>, ApiError> {
    state.manager.replace_flock(&name, config).await?;
    Ok(Json(state.manager.get_flock(&name).await?.dump()))
}

async fn delete_flock(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.delete_flock(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_flock(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.start_flock(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stop_flock(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.manager.stop_flock(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn flock_summary(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<FlockSummary>, ApiError> {
    Ok(Json(state.manager.get_flock(&name).await?.summary()))
}

async fn list_monkeys(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.manager.get_flock(&name).await?.list_monkeys()))
}

async fn get_monkey(
    State(state): State<Arc<AppState>>,
    Path((name, monkey)): Path<(String, String)>,
) -> Result<Json<MonkeyData>, ApiError> {
    Ok(Json(state.manager.get_flock(&name).await?.get_monkey(&monkey)?))
}

async fn summary(State(state): State<Arc<AppState>>) -> Json<Vec<FlockSummary>> {
    Json(state.manager.summarize_flocks().await)
}
