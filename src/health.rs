//! `GET /health` and `GET /ready` endpoint handlers.
//!
//! `/health` always answers 200 with a [`HealthResponse`] describing the
//! configuration state, cache readiness and observed change counts.
//! `/ready` answers 200 only once the configuration state is
//! `succeeded`, and 503 otherwise, for use as a readiness probe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::configuration::{ChangeCounts, ConfigurationState};
use crate::lifecycle::ComponentStatus;
use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub configuration: ConfigurationHealth,
}

#[derive(Serialize, Deserialize)]
pub struct ConfigurationHealth {
    pub service: String,
    pub state: ConfigurationState,
    pub cache_ready: bool,
    pub store: String,
    pub root: String,
    pub changes: ChangeCounts,
}

#[derive(Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub state: ConfigurationState,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let service = &state.service;
    let status = match service.status() {
        ComponentStatus::Error => "degraded",
        ComponentStatus::Stopping | ComponentStatus::Stopped | ComponentStatus::Terminated => {
            "stopping"
        }
        _ => "healthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        configuration: ConfigurationHealth {
            service: service.name().to_string(),
            state: service.configuration_state(),
            cache_ready: service.is_configuration_cache_ready(),
            store: state.store.to_string(),
            root: state.root.clone(),
            changes: service.configuration_changes(),
        },
    })
}

pub async fn readiness_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let configuration = state.service.configuration_state();
    let ready = configuration == ConfigurationState::Succeeded;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadinessResponse {
            ready,
            state: configuration,
        }),
    )
}
