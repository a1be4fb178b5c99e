//! Health check endpoints for container orchestration.
//!
//! Both probes answer from the router alone and never touch the item store,
//! so a slow or broken database does not get the pod restarted.

/// Liveness probe: the process is up and can respond to HTTP.
pub async fn healthz() -> &'static str {
    "ok"
}

/// Readiness probe: the router is accepting traffic.
pub async fn readyz() -> &'static str {
    "ok"
}
