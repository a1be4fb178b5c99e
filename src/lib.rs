//! workshop-api: an item-management service for container orchestration demos.
//!
//! Persists items in SQLite and exposes them over a small JSON API, alongside
//! liveness/readiness probes, graceful SIGTERM handling, and two deliberate
//! faults: a CPU-bound busy-wait and a delayed self-termination.

pub mod coerce;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
