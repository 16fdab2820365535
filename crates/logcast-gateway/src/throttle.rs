//! Leading + trailing edge throttle.
//!
//! Contract, for an interval `T`:
//!
//! - A call with no run in the previous `T` runs the action immediately.
//! - Calls within `T` of the last run do not run it; instead exactly one
//!   trailing run is scheduled for the end of that window. Further calls
//!   while it is pending are absorbed.
//! - So the action runs at most once per `T`, and every call is followed by
//!   a run no later than `T` after it.
//!
//! `T == 0` disables throttling: every call runs the action.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{trace, warn};

#[cfg(test)]
#[path = "throttle_tests.rs"]
mod tests;

#[derive(Debug, Default)]
struct ThrottleState {
    /// When the action last started.
    last_run: Option<Instant>,

    /// A trailing run is scheduled.
    trailing: bool,
}

/// Rate limiter around a single action.
pub struct Throttle {
    /// Minimum spacing between runs.
    interval: Duration,

    /// The throttled action.
    action: Arc<dyn Fn() + Send + Sync>,

    /// Shared with the trailing timer task.
    state: Arc<Mutex<ThrottleState>>,

    /// The no-runtime fallback has been reported.
    inline_warned: AtomicBool,
}

impl Throttle {
    pub fn new<F>(interval: Duration, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            interval,
            action: Arc::new(action),
            state: Arc::new(Mutex::new(ThrottleState::default())),
            inline_warned: AtomicBool::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Whether a trailing run is scheduled.
    pub fn pending(&self) -> bool {
        self.state.lock().trailing
    }

    /// Request a run of the action.
    ///
    /// Outside a tokio runtime no timer can be scheduled, so a call that
    /// would be deferred runs the action right away. The first such call
    /// logs a warning, since throttling is then effectively off.
    pub fn call(&self) {
        if !self.is_enabled() {
            (self.action)();
            return;
        }

        let now = Instant::now();
        let mut state = self.state.lock();
        if state.trailing {
            return;
        }

        let deadline = match state.last_run {
            Some(last) if now < last + self.interval => last + self.interval,
            _ => {
                state.last_run = Some(now);
                drop(state);
                (self.action)();
                return;
            }
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            state.last_run = Some(now);
            drop(state);
            if !self.inline_warned.swap(true, Ordering::Relaxed) {
                warn!(
                    "No tokio runtime, throttled calls run inline (interval {:?})",
                    self.interval
                );
            }
            (self.action)();
            return;
        };

        state.trailing = true;
        drop(state);
        trace!("Trailing run scheduled");

        let shared = self.state.clone();
        let action = self.action.clone();
        handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            {
                let mut state = shared.lock();
                state.trailing = false;
                state.last_run = Some(Instant::now());
            }
            action();
        });
    }
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("interval", &self.interval)
            .field("state", &*self.state.lock())
            .finish()
    }
}
