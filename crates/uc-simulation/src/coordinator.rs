use std::collections::HashMap;

use uc_core::car::CarId;
use uc_core::rail::SegmentId;

use crate::clock::SimClock;
use crate::config::SpeedConfig;
use crate::error::{SimError, SimResult};
use crate::event::SimEventKind;

/// Seconds counted down, one event each, before the train starts.
pub const COUNTDOWN_SECS: u32 = 5;

/// An event the coordinator wants published, with its description.
pub type Announcement = (SimEventKind, String);

/// Where the train is in its start sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPhase {
    /// [`start`](Coordinator::start) has not been called.
    NotStarted,
    /// Unconditional wait before the countdown.
    Delay {
        /// Ticks until the countdown begins.
        ticks_left: u64,
    },
    /// Counting down; only progresses while the simulation is not paused.
    Countdown {
        /// Seconds left on the countdown.
        remaining: u32,
        /// Ticks until the next second elapses.
        ticks_left: u64,
    },
    /// The train is free to drive.
    Started,
}

/// The single source of truth for speed, pause state, and checkpoint progress.
///
/// Only [`Simulation`](crate::Simulation) constructs a coordinator. Systems
/// reach it through [`SimContext`](crate::SimContext).
#[derive(Debug, Clone)]
pub struct Coordinator {
    speed: SpeedConfig,
    checkpoint_count: u32,
    /// Checkpoint segments already counted, with the car that first crossed.
    reached: HashMap<SegmentId, Option<CarId>>,
    editing: bool,
    paused: bool,
    boosted: bool,
    phase: StartPhase,
    ticks_per_second: u64,
}

impl Coordinator {
    pub(crate) fn new(speed: SpeedConfig, clock: &SimClock) -> Self {
        Self {
            speed,
            checkpoint_count: 0,
            reached: HashMap::new(),
            editing: false,
            paused: false,
            boosted: false,
            phase: StartPhase::NotStarted,
            ticks_per_second: clock.ticks_for(1.0).max(1),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Speed every car drives at right now.
    pub fn speed(&self) -> f32 {
        if self.boosted {
            self.speed.boost_multiplier * self.canonical_speed()
        } else {
            self.canonical_speed()
        }
    }

    /// `base + increment * checkpoint_count`, ignoring any boost.
    pub fn canonical_speed(&self) -> f32 {
        self.speed.base + self.speed.increment * self.checkpoint_count as f32
    }

    pub fn checkpoint_count(&self) -> u32 {
        self.checkpoint_count
    }

    /// Whether the world is stopped at a checkpoint for editing.
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Whether cars must hold still: a manual pause or checkpoint editing.
    pub fn is_paused(&self) -> bool {
        self.paused || self.editing
    }

    pub fn is_boosted(&self) -> bool {
        self.boosted
    }

    pub fn phase(&self) -> StartPhase {
        self.phase
    }

    /// Whether the start countdown has completed.
    pub fn has_started(&self) -> bool {
        self.phase == StartPhase::Started
    }

    pub fn has_reached(&self, segment: SegmentId) -> bool {
        self.reached.contains_key(&segment)
    }

    // -----------------------------------------------------------------------
    // Start sequence
    // -----------------------------------------------------------------------

    /// Begin the start sequence. Calling it again has no effect.
    ///
    /// The train waits `max(delay - 5, 0)` seconds, then counts down five
    /// seconds that only elapse while the simulation is not paused.
    pub fn start(&mut self, initial_delay_secs: f64, clock: &SimClock) -> Vec<Announcement> {
        if self.phase != StartPhase::NotStarted {
            return Vec::new();
        }
        let wait = (initial_delay_secs - f64::from(COUNTDOWN_SECS)).max(0.0);
        let ticks_left = clock.ticks_for(wait);
        log::info!("train starts in {initial_delay_secs:.1}s");
        if ticks_left == 0 {
            return self.begin_countdown();
        }
        self.phase = StartPhase::Delay { ticks_left };
        Vec::new()
    }

    /// Advance the start sequence by one tick.
    pub fn advance_countdown(&mut self) -> Vec<Announcement> {
        match self.phase {
            StartPhase::NotStarted | StartPhase::Started => Vec::new(),
            StartPhase::Delay { ticks_left } => {
                if ticks_left <= 1 {
                    self.begin_countdown()
                } else {
                    self.phase = StartPhase::Delay {
                        ticks_left: ticks_left - 1,
                    };
                    Vec::new()
                }
            }
            StartPhase::Countdown {
                remaining,
                ticks_left,
            } => {
                if self.is_paused() {
                    return Vec::new();
                }
                if ticks_left > 1 {
                    self.phase = StartPhase::Countdown {
                        remaining,
                        ticks_left: ticks_left - 1,
                    };
                    return Vec::new();
                }
                let remaining = remaining - 1;
                if remaining == 0 {
                    self.phase = StartPhase::Started;
                    log::info!("train started at speed {}", speed_text(self.speed()));
                    return vec![(SimEventKind::TrainStarted, "The train departs".to_string())];
                }
                self.phase = StartPhase::Countdown {
                    remaining,
                    ticks_left: self.ticks_per_second,
                };
                vec![countdown_tick(remaining)]
            }
        }
    }

    fn begin_countdown(&mut self) -> Vec<Announcement> {
        self.phase = StartPhase::Countdown {
            remaining: COUNTDOWN_SECS,
            ticks_left: self.ticks_per_second,
        };
        vec![countdown_tick(COUNTDOWN_SECS)]
    }

    // -----------------------------------------------------------------------
    // Checkpoints
    // -----------------------------------------------------------------------

    /// Count a checkpoint and enter editing mode.
    ///
    /// Each checkpoint segment counts once. Ignored while already editing.
    pub fn reach_checkpoint(&mut self, segment: SegmentId) -> Vec<Announcement> {
        self.cross(segment, None)
    }

    /// Count `car` crossing a checkpoint.
    ///
    /// The first car across a segment latches it. Later crossings count only
    /// when made by that same car, so a lead car lapping a loop scores every
    /// lap while the wagons behind it never do.
    pub fn reach_checkpoint_by(&mut self, segment: SegmentId, car: CarId) -> Vec<Announcement> {
        self.cross(segment, Some(car))
    }

    fn cross(&mut self, segment: SegmentId, car: Option<CarId>) -> Vec<Announcement> {
        if self.editing {
            return Vec::new();
        }
        match self.reached.get(&segment) {
            None => {
                self.reached.insert(segment, car);
            }
            Some(latched) if latched.is_some() && *latched == car => {}
            Some(_) => return Vec::new(),
        }
        self.checkpoint_count += 1;
        self.editing = true;
        self.boosted = false;
        log::info!(
            "checkpoint {} reached on segment {segment}",
            self.checkpoint_count
        );
        vec![
            self.speed_changed(),
            (
                SimEventKind::CheckpointEntered {
                    segment,
                    count: self.checkpoint_count,
                },
                format!("Checkpoint {} reached", self.checkpoint_count),
            ),
        ]
    }

    /// Leave editing mode and resume at the canonical speed.
    pub fn continue_from_checkpoint(&mut self) -> SimResult<Vec<Announcement>> {
        if !self.editing {
            return Err(SimError::NotEditing);
        }
        self.editing = false;
        self.boosted = false;
        log::info!("continuing after checkpoint {}", self.checkpoint_count);
        Ok(vec![
            self.speed_changed(),
            (
                SimEventKind::CheckpointExited {
                    count: self.checkpoint_count,
                },
                format!("Leaving checkpoint {}", self.checkpoint_count),
            ),
        ])
    }

    // -----------------------------------------------------------------------
    // Speed and pause
    // -----------------------------------------------------------------------

    /// Boost the train until the next checkpoint. Empty if already boosted.
    pub fn speed_up(&mut self) -> Vec<Announcement> {
        if self.boosted {
            return Vec::new();
        }
        self.boosted = true;
        vec![self.speed_changed()]
    }

    /// Manually pause the world. Empty if already paused.
    pub fn pause(&mut self) -> Vec<Announcement> {
        if self.paused {
            return Vec::new();
        }
        self.paused = true;
        vec![(SimEventKind::Paused, "Simulation paused".to_string())]
    }

    /// Lift a manual pause. Checkpoint editing is unaffected.
    pub fn resume(&mut self) -> Vec<Announcement> {
        if !self.paused {
            return Vec::new();
        }
        self.paused = false;
        vec![(SimEventKind::Resumed, "Simulation resumed".to_string())]
    }

    fn speed_changed(&self) -> Announcement {
        let speed = self.speed();
        (
            SimEventKind::SpeedChanged {
                speed,
                boosted: self.boosted,
            },
            format!("Speed: {}", speed_text(speed)),
        )
    }
}

fn countdown_tick(remaining: u32) -> Announcement {
    (
        SimEventKind::CountdownTick { remaining },
        format!("Starting in {remaining}..."),
    )
}

/// Display text for a speed value.
pub fn speed_text(speed: f32) -> String {
    format!("{speed:.2}")
}
