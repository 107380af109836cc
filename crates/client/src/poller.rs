//! Adaptive health-check scheduling.
//!
//! [`AdaptivePoller`] is the timing state machine only: it decides *when*
//! the next probe is due and never performs IO itself. The async driver in
//! [`crate::monitor`] owns one poller and acts on its decisions.

use tokio::time::{Duration, Instant};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(5_000);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_millis(60_000);
pub const DEFAULT_GROWTH_FACTOR: f64 = 1.5;
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_millis(60_000);
/// Upper bound accepted for `max_interval`.
pub const MAX_INTERVAL_LIMIT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PollingConfigError {
    #[error("minimum interval must be greater than zero")]
    ZeroMinInterval,
    #[error("minimum interval {min:?} exceeds maximum interval {max:?}")]
    MinAboveMax { min: Duration, max: Duration },
    #[error("maximum interval {max:?} exceeds the limit of {limit:?}")]
    MaxTooLarge { max: Duration, limit: Duration },
    #[error("growth factor must be a finite number >= 1, got {0}")]
    InvalidGrowthFactor(f64),
}

/// Tunables of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollingConfig {
    min_interval: Duration,
    max_interval: Duration,
    growth_factor: f64,
    idle_threshold: Duration,
}

impl PollingConfig {
    pub fn new(
        min_interval: Duration,
        max_interval: Duration,
        growth_factor: f64,
        idle_threshold: Duration,
    ) -> Result<Self, PollingConfigError> {
        if min_interval.is_zero() {
            return Err(PollingConfigError::ZeroMinInterval);
        }
        if min_interval > max_interval {
            return Err(PollingConfigError::MinAboveMax {
                min: min_interval,
                max: max_interval,
            });
        }
        if max_interval > MAX_INTERVAL_LIMIT {
            return Err(PollingConfigError::MaxTooLarge {
                max: max_interval,
                limit: MAX_INTERVAL_LIMIT,
            });
        }
        if !growth_factor.is_finite() || growth_factor < 1.0 {
            return Err(PollingConfigError::InvalidGrowthFactor(growth_factor));
        }
        Ok(Self {
            min_interval,
            max_interval,
            growth_factor,
            idle_threshold,
        })
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    pub fn growth_factor(&self) -> f64 {
        self.growth_factor
    }

    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
        }
    }
}

/// Two-state scheduler: idle (no deadline) or scheduled (exactly one deadline).
///
/// Invariant: `min_interval <= current_interval <= max_interval`.
#[derive(Debug, Clone)]
pub struct AdaptivePoller {
    config: PollingConfig,
    current: Duration,
    deadline: Option<Instant>,
}

impl AdaptivePoller {
    pub fn new(config: PollingConfig) -> Self {
        Self {
            config,
            current: config.min_interval,
            deadline: None,
        }
    }

    /// idle -> scheduled. The caller probes immediately; the first delayed
    /// tick is due one minimum interval from `now`.
    pub fn start(&mut self, now: Instant) {
        self.current = self.config.min_interval;
        self.deadline = Some(now + self.current);
    }

    /// Called after the probe of a due tick completed. Picks the next
    /// interval from how long the operator has been idle and schedules it.
    pub fn tick(&mut self, now: Instant, idle_for: Duration) -> Duration {
        self.current = if idle_for > self.config.idle_threshold {
            Duration::try_from_secs_f64(self.current.as_secs_f64() * self.config.growth_factor)
                .unwrap_or(self.config.max_interval)
                .clamp(self.config.min_interval, self.config.max_interval)
        } else {
            self.config.min_interval
        };
        self.deadline = Some(now + self.current);
        self.current
    }

    /// Operator interaction. Returns `true` when the pending deadline was
    /// replaced and the caller must run an out-of-band probe; at the minimum
    /// interval (or when idle) nothing changes.
    pub fn on_activity(&mut self, now: Instant) -> bool {
        if self.deadline.is_none() || self.current <= self.config.min_interval {
            return false;
        }
        self.current = self.config.min_interval;
        self.deadline = Some(now + self.current);
        true
    }

    /// Re-arm the pending deadline one current interval from `now`, e.g.
    /// once an out-of-band probe has finished. No-op while idle.
    pub fn reschedule(&mut self, now: Instant) {
        if self.deadline.is_some() {
            self.deadline = Some(now + self.current);
        }
    }

    /// scheduled -> idle.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn current_interval(&self) -> Duration {
        self.current
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }
}
