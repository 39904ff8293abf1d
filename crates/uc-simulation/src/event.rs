use std::fmt;

use uc_core::car::CarId;
use uc_core::rail::SegmentId;

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEventKind {
    // Start-up
    /// One second of the start countdown began.
    CountdownTick {
        /// Seconds left before the train starts.
        remaining: u32,
    },
    /// The start countdown finished; cars begin driving.
    TrainStarted,

    // Driving
    /// A car started (or resumed) driving.
    CarStartedDriving {
        /// The car that started.
        car: CarId,
    },
    /// A car suspended driving because the world is paused.
    CarPausedDriving {
        /// The car that paused.
        car: CarId,
    },
    /// A car was handed off onto a new segment.
    SegmentEntered {
        /// The car that moved.
        car: CarId,
        /// The segment it entered.
        segment: SegmentId,
    },
    /// A car ran off the end of the rail.
    CarDied {
        /// The car that died.
        car: CarId,
        /// The last segment it was on.
        segment: SegmentId,
    },
    /// A wrecked car was removed from the network.
    CarRemoved {
        /// The removed car.
        car: CarId,
    },

    // Coordinator
    /// A checkpoint was reached and editing began.
    CheckpointEntered {
        /// The checkpoint segment.
        segment: SegmentId,
        /// Checkpoints reached so far, including this one.
        count: u32,
    },
    /// Editing ended and driving continues.
    CheckpointExited {
        /// Checkpoints reached so far.
        count: u32,
    },
    /// The published train speed changed.
    SpeedChanged {
        /// The new speed.
        speed: f32,
        /// Whether the speed includes a boost.
        boosted: bool,
    },
    /// The simulation was paused manually.
    Paused,
    /// A manual pause ended.
    Resumed,

    // Fire
    /// A car caught fire.
    CarIgnited {
        /// The burning car.
        car: CarId,
        /// The neighbour the fire spread from, if any.
        source: Option<CarId>,
    },
    /// A car's fire was put out.
    CarExtinguished {
        /// The car that was extinguished.
        car: CarId,
    },

    // Editing
    /// A car was lifted off the rail.
    CarPickedUp {
        /// The car that was lifted.
        car: CarId,
    },
    /// A car was placed onto a segment.
    CarPlaced {
        /// The placed car.
        car: CarId,
        /// The segment it was placed on.
        segment: SegmentId,
    },
}

impl SimEventKind {
    /// Check whether a given car is involved in this event.
    pub fn involves(&self, id: CarId) -> bool {
        match self {
            Self::CarStartedDriving { car }
            | Self::CarPausedDriving { car }
            | Self::SegmentEntered { car, .. }
            | Self::CarDied { car, .. }
            | Self::CarRemoved { car }
            | Self::CarExtinguished { car }
            | Self::CarPickedUp { car }
            | Self::CarPlaced { car, .. } => *car == id,
            Self::CarIgnited { car, source } => *car == id || *source == Some(id),
            Self::CountdownTick { .. }
            | Self::TrainStarted
            | Self::CheckpointEntered { .. }
            | Self::CheckpointExited { .. }
            | Self::SpeedChanged { .. }
            | Self::Paused
            | Self::Resumed => false,
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    /// The simulation tick when this event occurred.
    pub tick: u64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event with the given tick, kind, and description.
    pub fn new(tick: u64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            description: description.into(),
        }
    }
}

/// Receives every event the moment it is published.
pub trait EventListener {
    /// Called once per published event, in publication order.
    fn on_event(&mut self, event: &SimEvent);
}

impl<F: FnMut(&SimEvent)> EventListener for F {
    fn on_event(&mut self, event: &SimEvent) {
        self(event)
    }
}

/// Accumulates events during a simulation run and forwards them to
/// subscribers.
#[derive(Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
    listeners: Vec<Box<dyn EventListener>>,
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &self.events.len())
            .field("max_events", &self.max_events)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
            listeners: Vec::new(),
        }
    }

    /// Register a listener. Listeners are notified in subscription order.
    pub fn subscribe(&mut self, listener: impl EventListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Notify listeners, then append the event, dropping the oldest events if
    /// the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given car.
    pub fn events_for_car(&self, id: CarId) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events. Subscriptions are kept.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
