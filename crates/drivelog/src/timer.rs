//! Trip timer.
//!
//! The timer measures wall-clock time between `start()` and `stop()` and,
//! while running, pushes a formatted `HH:MM:SS` reading to a
//! [`DisplaySink`] on a fixed period. Elapsed time is always recomputed from
//! the absolute start epoch, so slow or skipped ticks never cause drift.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::ports::DisplaySink;

/// Display period used when none is configured.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

const MS_PER_SECOND: u64 = 1000;

/// Source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in milliseconds.
    fn now_ms(&self) -> i64;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    #[must_use]
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    /// Move the clock forward by `ms`.
    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the clock to `ms`.
    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Format `ms` as `HH:MM:SS`, flooring to whole seconds.
///
/// Hours are not wrapped: 100 hours renders as `100:00:00`.
#[must_use]
pub fn format_elapsed(ms: u64) -> String {
    let total_seconds = ms / MS_PER_SECOND;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parse an `HH:MM:SS` reading back into whole seconds.
///
/// Returns `None` unless minutes and seconds are two digits below 60 and
/// hours have at least two digits.
#[must_use]
pub fn parse_elapsed(text: &str) -> Option<u64> {
    let mut parts = text.split(':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || h.len() < 2 || m.len() != 2 || s.len() != 2 {
        return None;
    }
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !(all_digits(h) && all_digits(m) && all_digits(s)) {
        return None;
    }
    let hours: u64 = h.parse().ok()?;
    let minutes: u64 = m.parse().ok()?;
    let seconds: u64 = s.parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Mutable timer state shared with the tick task.
#[derive(Debug, Default)]
struct TimerState {
    running: bool,
    start_epoch_ms: Option<i64>,
    elapsed_ms: u64,
}

impl TimerState {
    fn measure(&self, now_ms: i64) -> u64 {
        self.start_epoch_ms
            .map_or(self.elapsed_ms, |start| {
                u64::try_from(now_ms - start).unwrap_or(0)
            })
    }
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Elapsed-time tracker with a periodic display tick.
///
/// Ticks run on a tokio task. The tick and [`Timer::stop`] take the same
/// lock, and a tick only reaches the sink while the timer is marked running,
/// so no tick is displayed after `stop()` returns.
pub struct Timer {
    clock: Arc<dyn Clock>,
    display: Arc<dyn DisplaySink>,
    tick_interval: Duration,
    state: Arc<Mutex<TimerState>>,
    ticker: Option<JoinHandle<()>>,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("clock", &self.clock)
            .field("tick_interval", &self.tick_interval)
            .field("state", &self.state)
            .field("ticking", &self.ticker.is_some())
            .finish_non_exhaustive()
    }
}

impl Timer {
    /// Create a stopped timer at zero.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        display: Arc<dyn DisplaySink>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            clock,
            display,
            tick_interval,
            state: Arc::new(Mutex::new(TimerState::default())),
            ticker: None,
        }
    }

    /// Whether the timer is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    /// Elapsed milliseconds: live while running, frozen after `stop()`.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        lock(&self.state).measure(self.clock.now_ms())
    }

    /// Elapsed time as a [`Duration`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms())
    }

    /// Start (or resume) the timer. No-op if it is already running.
    ///
    /// Display ticks need a tokio runtime; outside one the timer still
    /// measures time but shows no live readings.
    pub fn start(&mut self) {
        {
            let mut state = lock(&self.state);
            if state.running {
                trace!("Timer already running");
                return;
            }
            let elapsed = i64::try_from(state.elapsed_ms).unwrap_or(i64::MAX);
            state.running = true;
            state.start_epoch_ms = Some(self.clock.now_ms() - elapsed);
        }
        debug!(
            interval_ms = self.tick_interval.as_millis(),
            "Timer started"
        );

        match Handle::try_current() {
            Ok(handle) => {
                self.ticker = Some(handle.spawn(tick_loop(
                    Arc::clone(&self.state),
                    Arc::clone(&self.clock),
                    Arc::clone(&self.display),
                    self.tick_interval,
                )));
            }
            Err(_) => debug!("No async runtime; timer display ticks disabled"),
        }
    }

    /// Stop the timer and freeze the elapsed time. No-op if not running.
    pub fn stop(&mut self) {
        {
            let mut state = lock(&self.state);
            if !state.running {
                trace!("Timer not running");
                return;
            }
            state.elapsed_ms = state.measure(self.clock.now_ms());
            state.running = false;
            state.start_epoch_ms = None;
            debug!(elapsed_ms = state.elapsed_ms, "Timer stopped");
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    /// Zero the elapsed time and show `00:00:00`.
    pub fn reset(&mut self) {
        let mut state = lock(&self.state);
        state.elapsed_ms = 0;
        if state.running {
            state.start_epoch_ms = Some(self.clock.now_ms());
        }
        self.display.show_elapsed(&format_elapsed(0));
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

async fn tick_loop(
    state: Arc<Mutex<TimerState>>,
    clock: Arc<dyn Clock>,
    display: Arc<dyn DisplaySink>,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let mut guard = lock(&state);
        if !guard.running {
            break;
        }
        guard.elapsed_ms = guard.measure(clock.now_ms());
        display.show_elapsed(&format_elapsed(guard.elapsed_ms));
    }
    trace!("Timer tick task finished");
}
