//! Reconciliation Poller
//!
//! After a state-changing call the remote resource settles on its own
//! schedule. [`reconcile`] re-fetches it at a fixed interval until a
//! terminal predicate holds or the attempt budget runs out.

use crate::domain::remote::{RemoteVolume, RemoteVolumeAttachment};
use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Delay between two refreshes
pub const SLEEP_TIME: Duration = Duration::from_secs(5);
/// First attempt index of the polling budget
pub const MIN_RETRY_COUNT: u32 = 0;
/// Attempt index at which polling gives up
pub const MAX_RETRY_COUNT: u32 = 60;

/// Timing and budget for one reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub min_retry: u32,
    pub max_retry: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: SLEEP_TIME,
            min_retry: MIN_RETRY_COUNT,
            max_retry: MAX_RETRY_COUNT,
        }
    }
}

impl PollPolicy {
    /// Number of refreshes allowed
    pub fn attempts(&self) -> u32 {
        self.max_retry.saturating_sub(self.min_retry)
    }

    /// Upper bound on time spent sleeping
    pub fn worst_case(&self) -> Duration {
        self.interval * self.attempts()
    }
}

/// A polled value that can report the state it was last seen in
pub trait Observed {
    fn observed_state(&self) -> String;
}

impl Observed for RemoteVolume {
    fn observed_state(&self) -> String {
        self.state.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}

impl Observed for RemoteVolumeAttachment {
    fn observed_state(&self) -> String {
        self.state.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}

/// Refresh `initial` until `is_terminal` holds.
///
/// An already-terminal value returns at once without sleeping. Each
/// attempt sleeps once and refreshes once. A refresh error ends polling
/// immediately and is returned unchanged. When the budget is exhausted the
/// error carries the last observed state.
pub async fn reconcile<T, P, R, Fut>(
    policy: &PollPolicy,
    operation: &str,
    initial: T,
    is_terminal: P,
    mut refresh: R,
) -> Result<T>
where
    T: Observed,
    P: Fn(&T) -> bool,
    R: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if is_terminal(&initial) {
        return Ok(initial);
    }

    let mut current = initial;
    for attempt in 1..=policy.attempts() {
        tokio::time::sleep(policy.interval).await;
        current = refresh().await?;
        debug!(
            "{}: attempt {}/{} observed state '{}'",
            operation,
            attempt,
            policy.attempts(),
            current.observed_state()
        );
        if is_terminal(&current) {
            return Ok(current);
        }
    }

    Err(Error::ReconciliationTimeout {
        operation: operation.to_string(),
        last_state: current.observed_state(),
    })
}
