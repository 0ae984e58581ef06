//! Scaled game clock driving time-based continuations.

use std::time::Duration;

use crate::error::ConfigError;

/// Game time as seen by the scheduler.
///
/// Each scheduler tick advances the clock by `delta * speed`. While paused,
/// or when the speed is zero, game time holds still, so every
/// `ContinueAfter` suspension stays pending without erroring.
#[derive(Clone, Debug, PartialEq)]
pub struct GameClock {
    now: Duration,
    speed: f64,
    paused: bool,
    ticks: u64,
}

impl GameClock {
    pub const DEFAULT_SPEED: f64 = 1.0;

    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            speed: Self::DEFAULT_SPEED,
            paused: false,
            ticks: 0,
        }
    }

    pub fn with_speed(speed: f64) -> Result<Self, ConfigError> {
        let mut clock = Self::new();
        clock.set_speed(speed)?;
        Ok(clock)
    }

    /// Elapsed (scaled) game time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of ticks processed while a turn was active.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True when game time cannot advance (paused or zero speed).
    pub fn is_holding(&self) -> bool {
        self.paused || self.speed == 0.0
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Sets the global speed multiplier. `0.0` holds time like a pause.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(ConfigError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Starts a new tick, advancing game time by the scaled `delta`.
    pub(crate) fn advance(&mut self, delta: Duration) {
        self.ticks += 1;
        if !self.is_holding() {
            self.now += delta.mul_f64(self.speed);
        }
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_scaled_delta() {
        let mut clock = GameClock::with_speed(2.0).unwrap();
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Duration::from_millis(500));
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn pause_holds_time_but_counts_ticks() {
        let mut clock = GameClock::new();
        clock.set_paused(true);
        for _ in 0..10 {
            clock.advance(Duration::from_secs(1));
        }
        assert_eq!(clock.now(), Duration::ZERO);
        assert_eq!(clock.ticks(), 10);
        assert!(clock.is_holding());
    }

    #[test]
    fn zero_speed_holds_time() {
        let mut clock = GameClock::new();
        clock.set_speed(0.0).unwrap();
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn rejects_negative_and_non_finite_speed() {
        let mut clock = GameClock::new();
        assert!(clock.set_speed(-1.0).is_err());
        assert!(clock.set_speed(f64::NAN).is_err());
        assert!(clock.set_speed(f64::INFINITY).is_err());
        assert_eq!(clock.speed(), GameClock::DEFAULT_SPEED);
    }
}
