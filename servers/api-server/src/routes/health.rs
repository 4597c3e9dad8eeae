//! Health check endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health status enumeration.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some systems degraded but functional
    Degraded,
    /// Critical systems down
    Unhealthy,
}

/// Dependency health check result.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyHealth {
    /// Name of the dependency
    pub name: String,
    /// Health status
    pub status: HealthStatus,
    /// Response time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status
    pub status: HealthStatus,
    /// Service version
    pub version: String,
    /// Service name
    pub service: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Dependency health checks
    pub dependencies: Vec<DependencyHealth>,
    /// Current timestamp
    pub timestamp: String,
}

/// Check fleet-repository connectivity and measure latency.
async fn check_train_repository(state: &AppState) -> DependencyHealth {
    let start = Instant::now();
    let result = state.train_repo.list().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => DependencyHealth {
            name: "train_repository".to_string(),
            status: if latency_ms > 1000 {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
            latency_ms: Some(latency_ms),
            error: None,
        },
        Err(e) => DependencyHealth {
            name: "train_repository".to_string(),
            status: HealthStatus::Unhealthy,
            latency_ms: Some(latency_ms),
            error: Some(e.to_string()),
        },
    }
}

/// Check whether the external optimizer is configured (not whether it is
/// reachable: unreachability is a normal, silently-handled fallback path,
/// not a degraded health state).
fn check_optimizer_configuration(state: &AppState) -> DependencyHealth {
    DependencyHealth {
        name: "external_optimizer".to_string(),
        status: HealthStatus::Healthy,
        latency_ms: None,
        error: if state.optimizer_client.is_configured() {
            None
        } else {
            Some("not configured; falling back to local optimizer".to_string())
        },
    }
}

fn determine_overall_status(dependencies: &[DependencyHealth]) -> HealthStatus {
    let has_unhealthy = dependencies.iter().any(|d| d.status == HealthStatus::Unhealthy);
    let has_degraded = dependencies.iter().any(|d| d.status == HealthStatus::Degraded);

    if has_unhealthy {
        HealthStatus::Unhealthy
    } else if has_degraded {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime_seconds = state.boot_time.elapsed().as_secs();

    let dependencies = vec![check_train_repository(&state).await, check_optimizer_configuration(&state)];
    let overall_status = determine_overall_status(&dependencies);

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "induction-planning-engine".to_string(),
        uptime_seconds,
        dependencies,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (status_code, Json(response))
}
