//! Read-only views of process state and configuration.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::ConfigReflection;
use crate::state::AppState;

const RUNTIME: &str = concat!("rust/", env!("CARGO_PKG_NAME"));

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub ok: bool,
    pub version: String,
    pub uptime: u64,
    pub uptime_seconds: u64,
    pub runtime: String,
}

/// `GET /api/status`
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let uptime = state.lifecycle.uptime_seconds();
    Json(StatusResponse {
        ok: true,
        version: state.lifecycle.version().to_string(),
        uptime,
        uptime_seconds: uptime,
        runtime: format!(
            "{} ({}-{})",
            RUNTIME,
            std::env::consts::ARCH,
            std::env::consts::OS
        ),
    })
}

/// `GET /api/config`
pub async fn config(State(state): State<AppState>) -> Json<ConfigReflection> {
    Json(state.config.reflection())
}
