use rand::SeedableRng;
use rand::rngs::StdRng;
use uc_core::car::{CarId, Placement};
use uc_core::network::RailNetwork;
use uc_core::rail::SegmentId;

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::coordinator::{Announcement, Coordinator};
use crate::drive::DriveSystem;
use crate::error::{SimError, SimResult};
use crate::event::{EventListener, EventLog, SimEvent, SimEventKind};
use crate::fire::FireSystem;
use crate::interaction::{self, Bucket, Interaction, Item, ItemKind, Tool};
use crate::system::System;

/// The top-level simulation orchestrator.
///
/// Owns the rail network, the coordinator, clock, RNG, event log, and
/// registered systems. Drives the tick loop and is the only way to issue
/// commands to the coordinator from outside.
pub struct Simulation {
    network: RailNetwork,
    coordinator: Coordinator,
    clock: SimClock,
    rng: StdRng,
    events: EventLog,
    systems: Vec<Box<dyn System>>,
    initial_delay_secs: f64,
    initialized: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.clock.tick())
            .field("systems", &self.systems.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Simulation {
    /// Create a new simulation from a network and configuration, with no
    /// systems registered.
    pub fn new(network: RailNetwork, config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        network
            .validate()
            .map_err(|e| SimError::InvalidConfiguration(e.to_string()))?;

        let clock = SimClock::new(config.seconds_per_tick);
        let coordinator = Coordinator::new(config.speed, &clock);
        let rng = StdRng::seed_from_u64(config.seed);
        let events = EventLog::new(config.max_events);
        Ok(Self {
            network,
            coordinator,
            clock,
            rng,
            events,
            systems: Vec::new(),
            initial_delay_secs: config.initial_delay_secs,
            initialized: false,
        })
    }

    /// Create a simulation with the drive and fire systems registered.
    pub fn standard(network: RailNetwork, config: SimConfig) -> SimResult<Self> {
        let mut sim = Self::new(network, config.clone())?;
        sim.add_system(DriveSystem::new(config.removal_grace_ticks));
        sim.add_system(FireSystem::new(config.fire));
        Ok(sim)
    }

    /// Register a system. Systems are ticked in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Register a listener for every event published from now on.
    pub fn subscribe(&mut self, listener: impl EventListener + 'static) {
        self.events.subscribe(listener);
    }

    /// Initialize all registered systems.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let mut ctx = SimContext {
                network: &mut self.network,
                coordinator: &mut self.coordinator,
                clock: &self.clock,
                events: &mut self.events,
                rng: &mut self.rng,
            };
            let result = system.init(&mut ctx);
            self.systems[i] = system;
            result?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> SimResult<()> {
        if !self.initialized {
            self.init()?;
        }

        self.clock.advance();
        let countdown = self.coordinator.advance_countdown();
        self.publish(countdown);

        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let mut ctx = SimContext {
                network: &mut self.network,
                coordinator: &mut self.coordinator,
                clock: &self.clock,
                events: &mut self.events,
                rng: &mut self.rng,
            };
            let result = system.tick(&mut ctx);
            self.systems[i] = system;
            result?;
        }
        Ok(())
    }

    /// Advance the simulation by `n` ticks.
    pub fn run(&mut self, n: u64) -> SimResult<()> {
        for _ in 0..n {
            self.tick()?;
        }
        Ok(())
    }

    fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .push(SimEvent::new(self.clock.tick(), kind, description));
    }

    fn publish(&mut self, announcements: Vec<Announcement>) {
        for (kind, description) in announcements {
            self.emit(kind, description);
        }
    }

    // -----------------------------------------------------------------------
    // Coordinator commands
    // -----------------------------------------------------------------------

    /// Begin the start countdown. The train moves `initial_delay_secs` later.
    pub fn start(&mut self, initial_delay_secs: f64) {
        let announcements = self.coordinator.start(initial_delay_secs, &self.clock);
        self.publish(announcements);
    }

    /// Begin the start countdown with [`SimConfig::initial_delay_secs`].
    pub fn start_with_configured_delay(&mut self) {
        self.start(self.initial_delay_secs);
    }

    /// Count a checkpoint and stop for editing. Returns `false` if it was
    /// already counted or the simulation is already editing.
    pub fn reach_checkpoint(&mut self, segment: SegmentId) -> bool {
        let announcements = self.coordinator.reach_checkpoint(segment);
        let counted = !announcements.is_empty();
        self.publish(announcements);
        counted
    }

    /// Finish editing and resume driving at the new canonical speed.
    pub fn continue_from_checkpoint(&mut self) -> SimResult<()> {
        let announcements = self.coordinator.continue_from_checkpoint()?;
        self.publish(announcements);
        Ok(())
    }

    /// Boost the train until the next checkpoint. Returns `false` if already
    /// boosted.
    pub fn speed_up(&mut self) -> bool {
        let announcements = self.coordinator.speed_up();
        let boosted = !announcements.is_empty();
        self.publish(announcements);
        boosted
    }

    pub fn pause(&mut self) -> bool {
        let announcements = self.coordinator.pause();
        let changed = !announcements.is_empty();
        self.publish(announcements);
        changed
    }

    pub fn resume(&mut self) -> bool {
        let announcements = self.coordinator.resume();
        let changed = !announcements.is_empty();
        self.publish(announcements);
        changed
    }

    // -----------------------------------------------------------------------
    // Fire
    // -----------------------------------------------------------------------

    /// Set a car on fire. Returns `false` if it cannot burn or already does.
    pub fn ignite(&mut self, car: CarId) -> bool {
        let Some(fire) = find_system_mut::<FireSystem>(&mut self.systems) else {
            return false;
        };
        if !fire.ignite(&self.network, car) {
            return false;
        }
        let name = self.network.car_name(car);
        log::info!("{name} was set on fire");
        self.emit(
            SimEventKind::CarIgnited { car, source: None },
            format!("{name} caught fire"),
        );
        true
    }

    /// Put out a burning car with one charge from `bucket`. Not possible
    /// while editing.
    pub fn extinguish(&mut self, car: CarId, bucket: &mut Bucket) -> bool {
        if self.coordinator.is_editing() {
            return false;
        }
        let Some(fire) = find_system_mut::<FireSystem>(&mut self.systems) else {
            return false;
        };
        if !fire.extinguish(car, bucket) {
            return false;
        }
        let name = self.network.car_name(car);
        self.emit(
            SimEventKind::CarExtinguished { car },
            format!("{name} was extinguished"),
        );
        true
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Lift a car off the rail. Only possible while editing.
    pub fn pick_up_car(&mut self, car: CarId) -> SimResult<()> {
        if !self.coordinator.is_editing() {
            return Err(SimError::NotEditing);
        }
        self.network.detach(car)?;
        let name = self.network.car_name(car);
        self.emit(
            SimEventKind::CarPickedUp { car },
            format!("{name} was picked up"),
        );
        Ok(())
    }

    /// Put a car onto `segment`. Only possible while editing, and only where
    /// no other car is in the way.
    pub fn place_car(&mut self, car: CarId, segment: SegmentId) -> SimResult<Placement> {
        if !self.coordinator.is_editing() {
            return Err(SimError::NotEditing);
        }
        let placement = self.network.attach(car, segment, true).map_err(|e| {
            log::warn!("could not place car {car} on segment {segment}: {e}");
            SimError::from(e)
        })?;
        let description = format!(
            "{} was placed on {}",
            self.network.car_name(car),
            self.network.segment_name(segment)
        );
        self.emit(SimEventKind::CarPlaced { car, segment }, description);
        Ok(placement)
    }

    /// Use `held` on `target`, or pick `target` up with an empty hand.
    pub fn interact(&mut self, held: Option<&mut Item>, target: &mut Item) -> Interaction {
        match held {
            None => {
                if !target.capabilities().pick_up {
                    return Interaction::Rejected;
                }
                if let ItemKind::Car(car) = target.kind {
                    if self.pick_up_car(car).is_err() {
                        return Interaction::Rejected;
                    }
                }
                Interaction::PickedUp {
                    two_handed: target.capabilities().two_handed,
                }
            }
            Some(held) => match (&mut held.kind, &mut target.kind) {
                (ItemKind::Tool(Tool::Bucket(bucket)), ItemKind::Car(car)) => {
                    let car = *car;
                    if self.extinguish(car, bucket) {
                        Interaction::Extinguished(car)
                    } else {
                        Interaction::Rejected
                    }
                }
                (ItemKind::Tool(Tool::Breaker(tool)), ItemKind::Terrain(tile)) => {
                    interaction::strike(tool, tile)
                        .map(Interaction::Hit)
                        .unwrap_or(Interaction::Rejected)
                }
                (ItemKind::PickupStack(stack), ItemKind::PickupStack(pile)) => {
                    interaction::merge(stack, pile)
                        .map(|amount| Interaction::Stacked { amount })
                        .unwrap_or(Interaction::Rejected)
                }
                _ => Interaction::Rejected,
            },
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn network(&self) -> &RailNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut RailNetwork {
        &mut self.network
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        find_system_mut(&mut self.systems)
    }

    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }
}

fn find_system_mut<T: System + 'static>(systems: &mut [Box<dyn System>]) -> Option<&mut T> {
    systems
        .iter_mut()
        .find_map(|s| s.as_any_mut().downcast_mut::<T>())
}

/// Placeholder system used during the swap-and-tick pattern.
#[derive(Debug)]
struct NoopSystem;

impl System for NoopSystem {
    fn name(&self) -> &str {
        "noop"
    }
    fn tick(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
