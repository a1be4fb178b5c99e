//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::lifecycle::{FaultInjector, Lifecycle};
use crate::store::ItemStore;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Everything here is built once at startup and never mutated afterwards;
/// the store handles its own synchronization.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: ItemStore,
    pub lifecycle: Arc<Lifecycle>,
    /// Used by the crash endpoint to end the process
    pub fault: Arc<dyn FaultInjector>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: ItemStore,
        lifecycle: Lifecycle,
        fault: Arc<dyn FaultInjector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            lifecycle: Arc::new(lifecycle),
            fault,
        }
    }
}
