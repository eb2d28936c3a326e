//! Bounded element waits.
//!
//! Every page interaction first polls the element until it reaches a
//! [`Condition`] or the timeout runs out. There are no retries beyond the
//! polling itself.

use crate::driver::{ElementState, PageDriver};
use crate::locator::Locator;
use crate::result::{Lookup, ProbeResult};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default timeout for required interactions (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for best-effort visibility / presence checks (5 seconds)
pub const DEFAULT_CHECK_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// State an element must reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// In the DOM, rendered or not
    Present,
    /// In the DOM and rendered
    Visible,
    /// Rendered and enabled
    Clickable,
    /// Not rendered (missing from the DOM counts)
    Absent,
}

impl Condition {
    /// Whether an element state satisfies this condition
    #[must_use]
    pub const fn is_met(self, state: &ElementState) -> bool {
        match self {
            Self::Present => state.present,
            Self::Visible => state.visible,
            Self::Clickable => state.is_clickable(),
            Self::Absent => !state.visible,
        }
    }

    /// Past-tense name used in messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timeout and polling interval for a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Maximum time to wait
    pub timeout: Duration,
    /// Delay between polls
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Poll `locator` until `condition` holds.
///
/// Returns `Found` with the satisfying state, `NotFound` when no element ever
/// matched, or `TimedOut` when one matched but never met the condition. For
/// [`Condition::Absent`] a missing element is the success case. Driver errors
/// abort the wait.
pub async fn wait_for(
    driver: &dyn PageDriver,
    locator: &Locator,
    condition: Condition,
    options: &WaitOptions,
) -> ProbeResult<Lookup<ElementState>> {
    let start = Instant::now();
    let mut seen = false;

    loop {
        let state = driver.element_state(locator).await?;
        if condition.is_met(&state) {
            debug!(%locator, %condition, elapsed_ms = elapsed_ms(start), "wait satisfied");
            return Ok(Lookup::Found(state));
        }
        seen |= state.present;

        if start.elapsed() >= options.timeout {
            let waited_ms = elapsed_ms(start);
            debug!(%locator, %condition, waited_ms, seen, "wait gave up");
            return Ok(if seen {
                Lookup::TimedOut { waited_ms }
            } else {
                Lookup::NotFound
            });
        }
        tokio::time::sleep(options.poll_interval).await;
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
