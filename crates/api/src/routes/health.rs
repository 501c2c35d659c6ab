//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::config::StorageBackend;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: StoreHealth,
}

/// Backing store health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreHealth {
    pub backend: &'static str,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

fn backend_name(backend: StorageBackend) -> &'static str {
    match backend {
        StorageBackend::Postgres => "postgres",
        StorageBackend::Memory => "memory",
    }
}

/// Full health check.
///
/// GET /api/health
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let connected = state.store.ping().await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: StoreHealth {
            backend: backend_name(state.config.storage.backend),
            connected,
            latency_ms: connected.then_some(latency_ms),
        },
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness probe: the process is up.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe: the store answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if state.store.ping().await.is_ok() {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.3.0".to_string(),
            store: StoreHealth {
                backend: "memory",
                connected: true,
                latency_ms: Some(1),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["store"]["backend"], "memory");
        assert_eq!(json["store"]["latency_ms"], 1);
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(backend_name(StorageBackend::Postgres), "postgres");
        assert_eq!(backend_name(StorageBackend::Memory), "memory");
    }
}
