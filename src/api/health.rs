use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    model: ComponentHealth,
    data: ComponentHealth,
    documents: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ComponentHealth {
    fn healthy(detail: Option<String>) -> Self {
        Self {
            status: "healthy",
            detail,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy",
            detail: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// GET /health/live
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /health/ready
///
/// The model is loaded before the router exists, so this always answers
/// 200. A missing data directory reports `degraded`.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let model = match state.forecasts.engine().summary() {
        Some(s) => ComponentHealth::healthy(Some(format!("{} trees, {}", s.num_trees, s.objective))),
        None => ComponentHealth::healthy(None),
    };

    let dir = state.forecasts.data_dir();
    let data = if dir.is_dir() {
        let days = state.forecasts.available_dates().len();
        ComponentHealth::healthy(Some(format!("{days} days available")))
    } else {
        ComponentHealth::unhealthy(format!("{} is not a directory", dir.display()))
    };

    let documents = ComponentHealth::healthy(Some(
        if state.chat.is_grounded() {
            "grounded"
        } else {
            "general knowledge only"
        }
        .to_string(),
    ));

    let healthy = model.is_healthy() && data.is_healthy();
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        timestamp: chrono::Utc::now(),
        checks: HealthChecks {
            model,
            data,
            documents,
        },
    };
    (StatusCode::OK, Json(response))
}
