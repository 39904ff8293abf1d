/// Tracks simulation time: a monotonic tick counter and elapsed seconds.
///
/// Delays are converted to whole ticks with [`ticks_for`](Self::ticks_for)
/// so that timers count integers instead of accumulating floats.
#[derive(Debug, Clone)]
pub struct SimClock {
    tick: u64,
    seconds_per_tick: f64,
}

impl SimClock {
    /// Create a new clock at tick 0 with the given tick duration.
    pub fn new(seconds_per_tick: f64) -> Self {
        Self {
            tick: 0,
            seconds_per_tick,
        }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Total elapsed seconds since simulation start.
    pub fn elapsed_secs(&self) -> f64 {
        self.tick as f64 * self.seconds_per_tick
    }

    /// Return the configured tick duration in seconds.
    pub fn seconds_per_tick(&self) -> f64 {
        self.seconds_per_tick
    }

    /// Number of whole ticks closest to `seconds`. Negative durations are zero.
    pub fn ticks_for(&self, seconds: f64) -> u64 {
        if seconds <= 0.0 || self.seconds_per_tick <= 0.0 {
            return 0;
        }
        (seconds / self.seconds_per_tick).round() as u64
    }
}
