//! Scoped timing for the processing stages.
//!
//! A [`TimingGuard`] records when it was created and logs the elapsed time
//! under the [`TELEMETRY_TARGET`] log target when dropped. Guards are inert
//! unless telemetry was switched on with [`configure`] and the logger accepts
//! the requested level.

use std::{
    borrow::Cow,
    sync::atomic::{AtomicU8, Ordering},
    time::{Duration, Instant},
};

use log::{Level, LevelFilter, log, log_enabled};

/// Log target used for every timing entry.
pub const TELEMETRY_TARGET: &str = "tryon::telemetry";

// 0 means disabled; otherwise the maximum level index (1 = error .. 5 = trace).
static TELEMETRY_THRESHOLD: AtomicU8 = AtomicU8::new(0);

/// RAII helper that logs how long a stage took when dropped.
pub struct TimingGuard {
    label: Cow<'static, str>,
    level: Level,
    start: Instant,
    active: bool,
}

impl TimingGuard {
    /// Returns `true` when the guard will emit a log entry on drop.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Elapsed time since the guard was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Consume the guard without logging and return the elapsed time.
    pub fn finish(mut self) -> Duration {
        self.active = false;
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.active {
            log!(
                target: TELEMETRY_TARGET,
                self.level,
                "{} completed in {:.2?}",
                self.label,
                self.start.elapsed()
            );
        }
    }
}

/// Start timing a stage; logs at `level` when telemetry allows it.
pub fn timing_guard(label: impl Into<Cow<'static, str>>, level: Level) -> TimingGuard {
    timing_guard_if(label, level, true)
}

/// Like [`timing_guard`] but with an extra caller-controlled switch.
pub fn timing_guard_if(
    label: impl Into<Cow<'static, str>>,
    level: Level,
    enabled: bool,
) -> TimingGuard {
    let active = enabled && telemetry_allows(level) && log_enabled!(target: TELEMETRY_TARGET, level);
    TimingGuard {
        label: label.into(),
        level,
        start: Instant::now(),
        active,
    }
}

/// Switch telemetry on or off and set the most verbose level it may log at.
pub fn configure(enabled: bool, level: LevelFilter) {
    let threshold = if enabled { level as u8 } else { 0 };
    TELEMETRY_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// Returns whether telemetry logging is currently enabled.
pub fn telemetry_enabled() -> bool {
    TELEMETRY_THRESHOLD.load(Ordering::Relaxed) > 0
}

/// The configured telemetry level, `Off` when disabled.
pub fn telemetry_level() -> LevelFilter {
    match TELEMETRY_THRESHOLD.load(Ordering::Relaxed) {
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}

/// Returns `true` when telemetry is on and `level` is within the threshold.
pub fn telemetry_allows(level: Level) -> bool {
    let threshold = TELEMETRY_THRESHOLD.load(Ordering::Relaxed);
    threshold > 0 && (level as u8) <= threshold
}
