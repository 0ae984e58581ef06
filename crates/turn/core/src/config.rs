use crate::error::ConfigError;
use crate::phase::{Phase, PhaseOrder};

/// Scheduler configuration and tunable limits.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Phases every turn runs through, strictly ascending.
    pub phases: Vec<Phase>,
    /// Upper bound on action steps executed by a single tick.
    ///
    /// Guards against an action that keeps enqueueing synchronous actions
    /// into the active phase and would otherwise never yield the tick.
    pub max_steps_per_tick: usize,
    /// Diagnostics kept before the oldest are evicted.
    pub diagnostic_capacity: usize,
    /// Undrained events kept before the oldest are evicted.
    pub event_capacity: usize,
    /// Convert panicking steps into diagnostics instead of unwinding the driver.
    pub catch_panics: bool,
    /// Initial game-clock time scale.
    pub speed: f64,
}

impl SchedulerConfig {
    pub const DEFAULT_MAX_STEPS_PER_TICK: usize = 1024;
    pub const DEFAULT_DIAGNOSTIC_CAPACITY: usize = 256;
    pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        Self {
            phases: PhaseOrder::standard().as_slice().to_vec(),
            max_steps_per_tick: Self::DEFAULT_MAX_STEPS_PER_TICK,
            diagnostic_capacity: Self::DEFAULT_DIAGNOSTIC_CAPACITY,
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
            catch_panics: true,
            speed: crate::clock::GameClock::DEFAULT_SPEED,
        }
    }

    #[must_use]
    pub fn with_phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.phases = phases.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_max_steps_per_tick(mut self, max_steps_per_tick: usize) -> Self {
        self.max_steps_per_tick = max_steps_per_tick;
        self
    }

    #[must_use]
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Checks every limit and returns the validated phase order.
    pub fn validate(&self) -> Result<PhaseOrder, ConfigError> {
        let order = PhaseOrder::new(self.phases.iter().copied())?;

        if self.max_steps_per_tick == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_steps_per_tick",
            });
        }
        if self.diagnostic_capacity == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "diagnostic_capacity",
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "event_capacity",
            });
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }

        Ok(order)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let order = SchedulerConfig::default().validate().unwrap();
        assert_eq!(order, PhaseOrder::standard());
    }

    #[test]
    fn rejects_zero_limits_and_bad_speed() {
        let config = SchedulerConfig::new().with_max_steps_per_tick(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroLimit {
                field: "max_steps_per_tick"
            })
        );

        let config = SchedulerConfig::new().with_speed(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSpeed(_))
        ));

        let config = SchedulerConfig::new().with_phases([Phase::End, Phase::Start]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PhaseOrderNotAscending { .. })
        ));
    }
}
