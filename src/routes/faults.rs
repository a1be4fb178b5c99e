//! Deliberately pathological endpoints used to demonstrate orchestrator
//! behavior: CPU starvation and unexpected process death.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Number;

use crate::coerce::json_number;
use crate::config::CRASH_DELAY_MS;
use crate::lifecycle::{run_work, schedule_crash, work_duration_ms};
use crate::middleware::RequestId;
use crate::state::AppState;

const CRASH_MESSAGE: &str = "This pod will crash in 1 second for demo purposes";
const CRASH_NOTE: &str = "Kubernetes will restart this container automatically";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkResponse {
    pub ok: bool,
    /// The coerced duration, whole values without a fraction
    pub work_ms: Number,
}

#[derive(Debug, Serialize)]
pub struct CrashResponse {
    pub message: String,
    pub pod: String,
    pub note: String,
}

/// `POST /api/work?ms=<n>`
///
/// In blocking mode this holds the runtime thread for the whole duration.
/// A SIGTERM received meanwhile is only acted on once the loop has finished.
///
/// The query is read as raw pairs so that no input, repeated keys included,
/// can fail extraction; the first `ms` wins.
pub async fn work(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<WorkResponse> {
    let raw_ms = params
        .iter()
        .find(|(key, _)| key == "ms")
        .map(|(_, value)| value.as_str());
    let work_ms = work_duration_ms(raw_ms);
    let mode = state.config.work_mode;
    tracing::info!(work_ms, mode = ?mode, "Starting synthetic CPU work");

    let start = Instant::now();
    run_work(mode, Duration::from_secs_f64(work_ms / 1000.0)).await;
    tracing::debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Synthetic CPU work finished"
    );

    Json(WorkResponse {
        ok: true,
        // Always finite: work_duration_ms clamps into [1, MAX_WORK_MS]
        work_ms: json_number(work_ms).unwrap_or_else(|| Number::from(1u64)),
    })
}

/// `POST /api/crash`
///
/// Answers immediately, then ends the process through the configured fault
/// injector after [`CRASH_DELAY_MS`].
pub async fn crash(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Json<CrashResponse> {
    let pod = state.config.pod_name();
    tracing::warn!(
        pod = %pod,
        request_id = %request_id,
        delay_ms = CRASH_DELAY_MS,
        "Crash requested"
    );

    schedule_crash(
        Arc::clone(&state.fault),
        Duration::from_millis(CRASH_DELAY_MS),
        pod.clone(),
    );

    Json(CrashResponse {
        message: CRASH_MESSAGE.to_string(),
        pod,
        note: CRASH_NOTE.to_string(),
    })
}
