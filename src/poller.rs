//! Verification poller
//!
//! "Wait until the remote state says X, or give up" for eventually-consistent
//! services. The remote state is checked at t=0 and then every
//! [`Poller::interval`] (5 s), sleeping in [`Poller::tick`] (1 s) slices so a
//! Ctrl-C is noticed quickly. When the timeout window is used up the operator
//! decides through the gateway whether to keep waiting (a fresh window
//! starts) or stop. The loop is explicit; long waits never grow the stack.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RescueError, Result};
use crate::gateway::{Gateway, Notice, Prompt};

/// Default spacing between two checks of the remote state
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Default sleep slice between interrupt checks
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

// ============================================================================
// Clock
// ============================================================================

/// Source of time for polling. Tests and rehearsals use [`ManualClock`].
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// Wall clock with real sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock: `sleep` advances time instantly.
///
/// Clones share one timeline, so the simulated cloud can stamp resources with
/// the same time the session sees.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualTime>>,
}

#[derive(Debug)]
struct ManualTime {
    now: DateTime<Utc>,
    slept: Duration,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualTime {
                now: start,
                slept: Duration::ZERO,
            })),
        }
    }

    fn time(&self) -> MutexGuard<'_, ManualTime> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total virtual time spent sleeping
    pub fn total_slept(&self) -> Duration {
        self.time().slept
    }

    pub fn advance(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        let mut time = self.time();
        time.now += step;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.time().now
    }

    fn sleep(&self, duration: Duration) {
        self.time().slept += duration;
        self.advance(duration);
    }
}

// ============================================================================
// Timeout
// ============================================================================

/// How long one polling window may last before asking the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timeout {
    /// Configured as `-1`: never ask, only the predicate ends the wait
    #[default]
    Unbounded,
    Seconds(u64),
}

impl Timeout {
    /// Convert the configured number of seconds (`-1` = unbounded).
    pub fn from_seconds(seconds: i64) -> std::result::Result<Self, String> {
        match seconds {
            -1 => Ok(Self::Unbounded),
            s if s >= 0 => Ok(Self::Seconds(s as u64)),
            s => Err(format!(
                "timeout must be -1 (unbounded) or a number of seconds >= 0, got {}",
                s
            )),
        }
    }

    pub fn as_seconds(&self) -> i64 {
        match self {
            Self::Unbounded => -1,
            Self::Seconds(s) => i64::try_from(*s).unwrap_or(i64::MAX),
        }
    }

    fn limit(&self) -> Option<Duration> {
        match self {
            Self::Unbounded => None,
            Self::Seconds(s) => Some(Duration::from_secs(*s)),
        }
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::Seconds(s) => write!(f, "{}s", s),
        }
    }
}

impl FromStr for Timeout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unbounded") {
            return Ok(Self::Unbounded);
        }
        let seconds: i64 = trimmed
            .trim_end_matches('s')
            .parse()
            .map_err(|_| format!("invalid timeout '{}'", s))?;
        Self::from_seconds(seconds)
    }
}

// ============================================================================
// Interrupt
// ============================================================================

/// Flag set by the Ctrl-C handler and consumed by the poller.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag; returns true if it was already set.
    pub fn trip(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_tripped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag; returns whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Polling policy shared by every check of a session.
#[derive(Debug, Clone)]
pub struct Poller {
    pub interval: Duration,
    pub tick: Duration,
    pub timeout: Timeout,
    interrupt: Interrupt,
}

impl Poller {
    pub fn new(timeout: Timeout) -> Self {
        Self {
            interval: DEFAULT_CHECK_INTERVAL,
            tick: DEFAULT_TICK,
            timeout,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Poll `predicate` until it returns `desired`.
    ///
    /// An interrupt left over from before the call is cleared first. Returns `Ok(desired)` once the remote state matches. Predicate errors
    /// propagate immediately.
    ///
    /// # Errors
    ///
    /// - `TimeoutExceeded` if the window ran out and the operator stopped waiting
    /// - `OperatorAbort` on Ctrl-C or `exit` at the keep-waiting prompt
    pub fn poll<P>(
        &self,
        clock: &dyn Clock,
        gateway: &mut dyn Gateway,
        waiting_for: &str,
        desired: bool,
        mut predicate: P,
    ) -> Result<bool>
    where
        P: FnMut() -> Result<bool>,
    {
        let started = clock.now();
        let mut window_start = started;
        let mut polls = 0usize;

        // Only a Ctrl-C raised during this wait counts
        if self.interrupt.take() {
            debug!(waiting_for, "discarding interrupt raised outside a wait");
        }
        debug!(waiting_for, desired, timeout = %self.timeout, "poll start");

        loop {
            polls += 1;
            if predicate()? == desired {
                let elapsed_secs = elapsed(started, clock.now()).as_secs();
                info!(waiting_for, polls, elapsed_secs, "poll satisfied");
                return Ok(desired);
            }

            if let Some(limit) = self.timeout.limit() {
                let waited = elapsed(window_start, clock.now());
                if waited >= limit {
                    let waited_secs = elapsed(started, clock.now()).as_secs();
                    warn!(waiting_for, polls, waited_secs, "poll window exhausted");
                    let question = format!(
                        "Still waiting for {} after {}s. Keep waiting?",
                        waiting_for, waited_secs
                    );
                    let prompt = Prompt::new(&question).with_help(
                        "Remote services can take a long time to settle. Answer yes to wait \
                         another timeout window, no to stop this step (it will be marked failed).",
                    );
                    if gateway.confirm(&prompt)? {
                        gateway.notify(Notice::Info, "Continuing to wait...");
                        window_start = clock.now();
                    } else {
                        return Err(RescueError::TimeoutExceeded {
                            waiting_for: waiting_for.to_string(),
                            waited_secs,
                        });
                    }
                }
            }

            self.sleep_interval(clock)?;
        }
    }

    /// Sleep one check interval in tick-sized slices, honoring Ctrl-C.
    fn sleep_interval(&self, clock: &dyn Clock) -> Result<()> {
        let tick = if self.tick.is_zero() {
            self.interval
        } else {
            self.tick
        };
        let mut remaining = self.interval;
        loop {
            if self.interrupt.take() {
                warn!("interrupt received while polling");
                return Err(RescueError::OperatorAbort);
            }
            if remaining.is_zero() {
                return Ok(());
            }
            let slice = tick.min(remaining);
            clock.sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
    }
}

fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timeout_from_seconds() {
        assert_eq!(Timeout::from_seconds(-1), Ok(Timeout::Unbounded));
        assert_eq!(Timeout::from_seconds(0), Ok(Timeout::Seconds(0)));
        assert_eq!(Timeout::from_seconds(300), Ok(Timeout::Seconds(300)));
        assert!(Timeout::from_seconds(-2).is_err());
    }

    #[test]
    fn test_timeout_parse_and_display() {
        assert_eq!("-1".parse::<Timeout>(), Ok(Timeout::Unbounded));
        assert_eq!("unbounded".parse::<Timeout>(), Ok(Timeout::Unbounded));
        assert_eq!("90s".parse::<Timeout>(), Ok(Timeout::Seconds(90)));
        assert_eq!(Timeout::Seconds(90).to_string(), "90s");
        assert_eq!(Timeout::Unbounded.as_seconds(), -1);
        assert!("soon".parse::<Timeout>().is_err());
    }

    #[test]
    fn test_manual_clock_advances_on_sleep() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.sleep(Duration::from_secs(5));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(5));
        assert_eq!(clock.total_slept(), Duration::from_secs(5));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let shared = clock.clone();
        clock.sleep(Duration::from_secs(30));
        assert_eq!(shared.now(), start + chrono::Duration::seconds(30));
        assert_eq!(shared.total_slept(), Duration::from_secs(30));
    }

    #[test]
    fn test_interrupt_trip_and_take() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.trip());
        assert!(interrupt.trip());
        assert!(interrupt.take());
        assert!(!interrupt.is_tripped());
    }
}
