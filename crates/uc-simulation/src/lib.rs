//! Tick-based train simulation for Uncooked.
//!
//! Provides a system-based simulation framework operating on a
//! [`uc_core::RailNetwork`]. Per-car drive and burn state is stored in the
//! systems, while placement and occupancy stay in the network. The
//! [`coordinator::Coordinator`] owned by [`Simulation`] decides speed, pause,
//! and checkpoint progress for every car.

/// Simulation clock for tracking ticks and elapsed time.
pub mod clock;
/// Configuration types for simulation runs.
pub mod config;
/// Mutable context passed to systems each tick.
pub mod context;
/// Speed, pause, start countdown, and checkpoint bookkeeping.
pub mod coordinator;
/// Drive system: moves cars waypoint by waypoint along the rail.
pub mod drive;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types, the event log, and listeners.
pub mod event;
/// Fire system: burning cars and propagation to neighbours.
pub mod fire;
/// Items, tools, and interaction outcomes.
pub mod interaction;
/// Top-level simulation orchestrator.
pub mod simulation;
/// The trait that all simulation systems implement.
pub mod system;

/// Re-export of [`clock::SimClock`].
pub use clock::SimClock;
/// Re-exports of the configuration types.
pub use config::{FireConfig, SimConfig, SpeedConfig};
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-exports of the coordinator types.
pub use coordinator::{Coordinator, StartPhase};
/// Re-exports of the drive system types.
pub use drive::{DriveState, DriveSystem};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of the event types.
pub use event::{EventListener, EventLog, SimEvent, SimEventKind};
/// Re-export of [`fire::FireSystem`].
pub use fire::FireSystem;
/// Re-exports of the interaction types.
pub use interaction::{
    BreakTool, Bucket, Capabilities, Interaction, Item, ItemKind, PickupStack, Tool,
};
/// Re-export of [`simulation::Simulation`].
pub use simulation::Simulation;
/// Re-export of [`system::System`].
pub use system::System;
