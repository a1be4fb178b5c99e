//! Process lifecycle state and the two synthetic fault behaviors.
//!
//! [`Lifecycle`] holds what is fixed for one running instance (start time and
//! version). The rest of the module implements the demo faults:
//!
//! - **Busy-wait** ([`run_work`]): burns CPU for a requested duration. In
//!   [`WorkMode::Blocking`] the loop never yields, so on the single-threaded
//!   runtime every other request, health probes included, queues behind it.
//!   [`WorkMode::Yielding`] spins the same way but hands control back to the
//!   scheduler between iterations, keeping probes responsive while still
//!   consuming CPU.
//! - **Crash** ([`schedule_crash`]): terminates the process after a fixed
//!   delay through a [`FaultInjector`], so the HTTP response is flushed first
//!   and the orchestrator then observes an unexpected exit.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::coerce::number_from_text;
use crate::config::{CRASH_EXIT_CODE, DEFAULT_WORK_MS, MAX_WORK_MS};

/// Immutable per-instance state consulted by the status endpoint.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    started_at: Instant,
    version: String,
}

impl Lifecycle {
    /// Capture the start instant now.
    pub fn new(version: impl Into<String>) -> Self {
        Self::started_at(Instant::now(), version)
    }

    pub fn started_at(started_at: Instant, version: impl Into<String>) -> Self {
        Self {
            started_at,
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whole seconds since start, rounded down.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// How `POST /api/work` spends its time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkMode {
    /// Spin without ever yielding; stalls the whole runtime thread
    Blocking,
    /// Spin, yielding to other tasks between iterations
    Yielding,
}

impl FromStr for WorkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocking" => Ok(Self::Blocking),
            "yielding" => Ok(Self::Yielding),
            other => Err(format!("unknown work mode '{}'", other)),
        }
    }
}

/// Coerce the raw `ms` query value into a busy-wait duration in milliseconds.
///
/// Absent means [`DEFAULT_WORK_MS`]. Anything that is not a finite number,
/// or is below one, becomes 1. Fractions are kept.
pub fn work_duration_ms(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return DEFAULT_WORK_MS as f64;
    };

    let value = number_from_text(raw);
    if !value.is_finite() {
        return 1.0;
    }
    value.clamp(1.0, MAX_WORK_MS as f64)
}

/// Burn CPU for `duration` according to `mode`.
pub async fn run_work(mode: WorkMode, duration: Duration) {
    match mode {
        WorkMode::Blocking => busy_wait(duration),
        WorkMode::Yielding => yielding_wait(duration).await,
    }
}

/// Spin on the current thread until `duration` has elapsed.
pub fn busy_wait(duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}

async fn yielding_wait(duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        std::hint::spin_loop();
        tokio::task::yield_now().await;
    }
}

/// Something that can end the process on purpose.
pub trait FaultInjector: Send + Sync + 'static {
    fn terminate(&self);
}

/// Exits the process immediately with [`CRASH_EXIT_CODE`], skipping graceful shutdown.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl FaultInjector for ProcessExit {
    fn terminate(&self) {
        std::process::exit(CRASH_EXIT_CODE);
    }
}

/// Fire `injector` once `delay` has passed.
///
/// The task is detached from the request, so client disconnects do not cancel it.
pub fn schedule_crash(
    injector: Arc<dyn FaultInjector>,
    delay: Duration,
    pod: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        tracing::warn!(pod = %pod, "Intentional crash triggered for workshop demo");
        injector.terminate();
    })
}
