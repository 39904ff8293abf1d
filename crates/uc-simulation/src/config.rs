use crate::error::{SimError, SimResult};

/// Train speed constants. Speed is always derived from these and the
/// checkpoint count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedConfig {
    /// Speed before the first checkpoint, in world units per second.
    pub base: f32,
    /// Speed added per checkpoint reached.
    pub increment: f32,
    /// Multiplier applied while boosted.
    pub boost_multiplier: f32,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            base: 0.05,
            increment: 0.05,
            boost_multiplier: 2.0,
        }
    }
}

/// Fire propagation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireConfig {
    /// Seconds a car burns before fire spreads to its neighbours.
    pub ignite_delay_secs: f64,
    /// Per-tick chance that an unburnt car on the rail catches fire by itself.
    pub spontaneous_chance: f64,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            ignite_delay_secs: 4.0,
            spontaneous_chance: 0.0,
        }
    }
}

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Seconds of game time per simulation tick.
    pub seconds_per_tick: f64,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Train speed constants.
    pub speed: SpeedConfig,
    /// Seconds between [`start`](crate::Simulation::start) and the train moving.
    pub initial_delay_secs: f64,
    /// Fire propagation settings.
    pub fire: FireConfig,
    /// Ticks a wrecked car stays in the network before removal.
    pub removal_grace_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            seconds_per_tick: 0.02,
            max_events: 0,
            speed: SpeedConfig::default(),
            initial_delay_secs: 8.0,
            fire: FireConfig::default(),
            removal_grace_ticks: 2,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of seconds per simulation tick.
    pub fn with_seconds_per_tick(mut self, seconds: f64) -> Self {
        self.seconds_per_tick = seconds;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Set the train speed constants.
    pub fn with_speed(mut self, speed: SpeedConfig) -> Self {
        self.speed = speed;
        self
    }

    /// Set the delay before the train starts.
    pub fn with_initial_delay(mut self, seconds: f64) -> Self {
        self.initial_delay_secs = seconds;
        self
    }

    /// Set the fire propagation settings.
    pub fn with_fire(mut self, fire: FireConfig) -> Self {
        self.fire = fire;
        self
    }

    /// Set how long wrecked cars linger before removal.
    pub fn with_removal_grace_ticks(mut self, ticks: u64) -> Self {
        self.removal_grace_ticks = ticks;
        self
    }

    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfiguration(msg));

        if !self.seconds_per_tick.is_finite() || self.seconds_per_tick <= 0.0 {
            return invalid(format!(
                "seconds per tick must be positive, got {}",
                self.seconds_per_tick
            ));
        }
        let negative = |v: f32| v.is_nan() || v < 0.0;
        if negative(self.speed.base) || negative(self.speed.increment) {
            return invalid(format!(
                "speeds must be non-negative, got base {} and increment {}",
                self.speed.base, self.speed.increment
            ));
        }
        if self.speed.boost_multiplier.is_nan() || self.speed.boost_multiplier < 1.0 {
            return invalid(format!(
                "boost multiplier must be at least 1, got {}",
                self.speed.boost_multiplier
            ));
        }
        let negative_secs = |v: f64| v.is_nan() || v < 0.0;
        if negative_secs(self.initial_delay_secs) || negative_secs(self.fire.ignite_delay_secs) {
            return invalid("delays must be non-negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.fire.spontaneous_chance) {
            return invalid(format!(
                "ignition chance must be within [0, 1], got {}",
                self.fire.spontaneous_chance
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = SimConfig::default();
        assert_eq!(config.seed, 42);
        assert!((config.seconds_per_tick - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.max_events, 0);
        assert_eq!(config.removal_grace_ticks, 2);
        assert!((config.speed.base - 0.05).abs() < f32::EPSILON);
        assert!((config.fire.ignite_delay_secs - 4.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_builder_chain() {
        let config = SimConfig::default()
            .with_seed(123)
            .with_seconds_per_tick(0.1)
            .with_max_events(500)
            .with_initial_delay(3.0)
            .with_removal_grace_ticks(5);
        assert_eq!(config.seed, 123);
        assert!((config.seconds_per_tick - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.max_events, 500);
        assert!((config.initial_delay_secs - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.removal_grace_ticks, 5);
    }

    #[test]
    fn zero_tick_length_invalid() {
        let err = SimConfig::default()
            .with_seconds_per_tick(0.0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfiguration(_)));
    }

    #[test]
    fn negative_speed_invalid() {
        let config = SimConfig::default().with_speed(SpeedConfig {
            base: -1.0,
            ..SpeedConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn slowing_boost_invalid() {
        let config = SimConfig::default().with_speed(SpeedConfig {
            boost_multiplier: 0.5,
            ..SpeedConfig::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn ignition_chance_bounded() {
        let config = SimConfig::default().with_fire(FireConfig {
            spontaneous_chance: 1.5,
            ..FireConfig::default()
        });
        assert!(config.validate().is_err());
    }
}
