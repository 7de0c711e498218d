use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::api::errors::ApiError;
use crate::core::metrics;
use crate::core::redis::RedisHealth;
use crate::core::state::AppState;
use crate::core::time::format_primitive;
use crate::repositories;
use crate::schemas::{DbTestResponse, HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{} is running and ready!", state.settings().api().project_name),
        version: state.settings().api().version.clone(),
    })
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();

    match state.redis().health().await {
        RedisHealth::Unhealthy(error) => {
            components.insert("redis".to_string(), format!("unhealthy: {error}"));
            status = "degraded".to_string();
        }
        other => {
            components.insert("redis".to_string(), other.label().to_string());
        }
    }

    match repositories::health::database_time(state.db()).await {
        Ok(_) => {
            components.insert("database".to_string(), "ok".to_string());
        }
        Err(err) => {
            components.insert("database".to_string(), format!("unhealthy: {err}"));
            status = "unhealthy".to_string();
        }
    }

    Json(HealthResponse { service: "veriviva-api".to_string(), status, components })
}

pub(crate) async fn db_test(State(state): State<AppState>) -> Result<Json<DbTestResponse>, ApiError> {
    let now = repositories::health::database_time(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Database connection failed"))?;

    Ok(Json(DbTestResponse {
        status: "success".to_string(),
        message: "Database connected".to_string(),
        time: format_primitive(now),
    }))
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
