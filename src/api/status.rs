//! Status Routes
//!
//! Health checks and the keep-alive ticker.
//!
//! Routes:
//! - GET /health - Basic health check
//! - GET /ping - Uptime and server identity
//! - GET /health/ready - Readiness check (database reachable)

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{config, db, AppState};

static STARTUP_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize startup time. Call this once at server start.
pub fn init_startup_time() {
    let _ = STARTUP_TIME.get_or_init(Instant::now);
}

/// Get uptime in seconds since server start.
fn get_uptime_seconds() -> u64 {
    STARTUP_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// `D days, H hours, M minutes`
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    format!("{} days, {} hours, {} minutes", days, hours, minutes)
}

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ping", get(ping))
        .route("/health/ready", get(readiness_check))
}

/// Log the uptime on a fixed interval so hosted instances see traffic.
///
/// Returns `None` when the interval is zero.
pub fn start_keep_alive(interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let uptime = get_uptime_seconds();
            tracing::info!(
                uptime_seconds = uptime,
                uptime = %format_uptime(uptime),
                "Keep-alive"
            );
        }
    }))
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub uptime_formatted: String,
    pub server: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<DependencyCheck>,
}

#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub name: String,
    pub healthy: bool,
    pub latency_ms: u64,
    pub message: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Basic health check.
///
/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Server is running",
        timestamp: Utc::now(),
    })
}

/// GET /ping
async fn ping() -> Json<PingResponse> {
    let uptime = get_uptime_seconds();
    Json(PingResponse {
        status: "alive",
        timestamp: Utc::now(),
        uptime,
        uptime_formatted: format_uptime(uptime),
        server: config::config().server.name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check.
///
/// GET /health/ready
///
/// Returns 503 when the database does not answer.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(&state).await;
    let ready = database.healthy;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            checks: vec![database],
        }),
    )
}

async fn check_database(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    let result = db::health_check(&state.db).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    DependencyCheck {
        name: "database".into(),
        healthy: result.is_ok(),
        latency_ms,
        message: result.err().map(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0 days, 0 hours, 0 minutes");
        assert_eq!(format_uptime(90_061), "1 days, 1 hours, 1 minutes");
    }

    #[tokio::test]
    async fn test_keep_alive_disabled_at_zero() {
        assert!(start_keep_alive(0).is_none());
    }
}
