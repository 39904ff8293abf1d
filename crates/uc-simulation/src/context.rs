use rand::rngs::StdRng;
use uc_core::car::CarId;
use uc_core::network::RailNetwork;
use uc_core::rail::SegmentId;

use crate::clock::SimClock;
use crate::coordinator::{Announcement, Coordinator};
use crate::event::{EventLog, SimEvent, SimEventKind};

/// Mutable context passed to each system during a tick.
pub struct SimContext<'a> {
    pub network: &'a mut RailNetwork,
    pub coordinator: &'a mut Coordinator,
    pub clock: &'a SimClock,
    pub events: &'a mut EventLog,
    pub rng: &'a mut StdRng,
}

impl SimContext<'_> {
    /// Emit a simulation event at the current tick.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .push(SimEvent::new(self.clock.tick(), kind, description));
    }

    /// Emit everything the coordinator announced, in order.
    pub fn publish(&mut self, announcements: Vec<Announcement>) {
        for (kind, description) in announcements {
            self.emit(kind, description);
        }
    }

    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Whole ticks in `seconds` of simulated time.
    pub fn ticks_for(&self, seconds: f64) -> u64 {
        self.clock.ticks_for(seconds)
    }

    pub fn is_paused(&self) -> bool {
        self.coordinator.is_paused()
    }

    /// Report `car` crossing a checkpoint. Returns `true` if it was counted.
    pub fn reach_checkpoint(&mut self, segment: SegmentId, car: CarId) -> bool {
        let announcements = self.coordinator.reach_checkpoint_by(segment, car);
        let counted = !announcements.is_empty();
        self.publish(announcements);
        counted
    }
}
