//=========================================================================
// Clock
//=========================================================================
//
// Pausable monotonic clock that paces the frame driver.
//
// Timeline:
// ```text
//            |<------- pause_total ------->|
//   ──*──────*─────────────────────────────*──────────*──> wall time
//   base   pause()                     unpause()     now
//
//   time() = now - base - pause_total
// ```
//
// Every instant is sampled through a `TimeSource`, so the same clock runs
// on the real monotonic clock or on a hand-advanced one for deterministic
// simulation.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

//=== TimeSource ==========================================================

/// Supplies "now" to a [`Clock`].
pub trait TimeSource {
    /// Returns the current instant. Must never go backwards.
    fn now(&self) -> Instant;
}

/// Real monotonic time via [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicTimeSource;

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced time source.
///
/// Clones share the same timeline, so a test (or a replay driver) can keep
/// one handle and hand the other to the engine.
///
/// ```
/// use std::time::Duration;
/// use frame_driver::core::clock::{Clock, ManualTimeSource};
///
/// let time = ManualTimeSource::new();
/// let mut clock = Clock::with_source(time.clone());
/// clock.start();
///
/// time.advance(Duration::from_millis(16));
/// clock.tick();
/// assert_eq!(clock.delta_time(), Duration::from_millis(16));
/// ```
#[derive(Debug, Clone)]
pub struct ManualTimeSource {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Moves the shared timeline forward.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Total amount the timeline has been advanced.
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

//=== Clock ===============================================================

/// Monotonic frame clock with pause/resume and per-tick delta.
///
/// `delta_time()` only changes on [`Clock::tick`], and `time()` never
/// counts time spent paused.
pub struct Clock {
    source: Box<dyn TimeSource>,
    paused: bool,

    base_time: Instant,
    pause_time: Instant,
    prev_time: Instant,
    current_time: Instant,

    pause_total: Duration,
    delta_time: Duration,
}

impl Clock {
    //--- Construction -----------------------------------------------------

    /// Creates a clock on the real monotonic clock.
    pub fn new() -> Self {
        Self::with_source(MonotonicTimeSource)
    }

    /// Creates a clock sampling the given source. The clock is started.
    pub fn with_source<T>(source: T) -> Self
    where
        T: TimeSource + 'static,
    {
        Self::from_boxed(Box::new(source))
    }

    pub(crate) fn from_boxed(source: Box<dyn TimeSource>) -> Self {
        let now = source.now();
        Self {
            source,
            paused: false,
            base_time: now,
            pause_time: now,
            prev_time: now,
            current_time: now,
            pause_total: Duration::ZERO,
            delta_time: Duration::ZERO,
        }
    }

    //--- Control ----------------------------------------------------------

    /// Zeroes the clock at the current instant and clears any pause.
    pub fn start(&mut self) {
        let now = self.source.now();
        self.base_time = now;
        self.pause_time = now;
        self.prev_time = now;
        self.current_time = now;
        self.pause_total = Duration::ZERO;
        self.delta_time = Duration::ZERO;
        self.paused = false;
    }

    /// Freezes the clock. No-op if already paused.
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.pause_time = self.source.now();
        self.paused = true;
    }

    /// Resumes the clock, excluding the paused span. No-op if running.
    pub fn unpause(&mut self) {
        if !self.paused {
            return;
        }
        self.current_time = self.source.now();
        self.pause_total += self.current_time.saturating_duration_since(self.pause_time);

        // The next delta starts here, not at the tick before the pause.
        self.prev_time = self.current_time;
        self.paused = false;
    }

    /// Measures the delta since the previous tick. No-op while paused.
    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        self.current_time = self.source.now();
        self.delta_time = self.current_time.saturating_duration_since(self.prev_time);
        self.prev_time = self.current_time;
    }

    //--- Queries ----------------------------------------------------------

    /// Running time since [`Clock::start`], excluding every paused span.
    ///
    /// Frozen while paused; resampled on every call while running.
    pub fn time(&self) -> Duration {
        let end = if self.paused {
            self.pause_time
        } else {
            self.source.now()
        };
        end.saturating_duration_since(self.base_time)
            .saturating_sub(self.pause_total)
    }

    /// Duration measured by the last [`Clock::tick`]; zero while paused.
    pub fn delta_time(&self) -> Duration {
        if self.paused {
            Duration::ZERO
        } else {
            self.delta_time
        }
    }

    /// [`Clock::time`] in seconds.
    pub fn time_seconds(&self) -> f64 {
        self.time().as_secs_f64()
    }

    /// [`Clock::delta_time`] in seconds.
    pub fn delta_seconds(&self) -> f64 {
        self.delta_time().as_secs_f64()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Total time spent paused since [`Clock::start`].
    pub fn pause_total(&self) -> Duration {
        self.pause_total
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("paused", &self.paused)
            .field("time", &self.time())
            .field("delta_time", &self.delta_time)
            .field("pause_total", &self.pause_total)
            .finish()
    }
}

//=========================================================================
// Tests
//=========================================================================
