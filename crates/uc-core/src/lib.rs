//! Core types for Uncooked: rail segments, train cars, and the rail network.
//!
//! This crate defines the static data a simulation runs on and the pure
//! traversal step. It has no notion of time; see `uc-simulation` for the
//! tick loop that drives cars along the rails.

/// Train cars and their placement on the rail.
pub mod car;
/// Error types used throughout the crate.
pub mod error;
/// The rail network: segments, cars, and the occupancy index.
pub mod network;
/// Rail segments, waypoints, and traversal orientation.
pub mod rail;
/// Breakable terrain tiles and the take-hit contract.
pub mod terrain;
/// Authored track files.
pub mod track;
/// One-waypoint traversal steps and segment handoff.
pub mod traversal;

/// Re-export car types.
pub use car::{CarId, CarStatus, Placement, TrainCar};
/// Re-export error types.
pub use error::{RailError, RailResult};
/// Re-export network types.
pub use network::{Heading, RailNetwork};
/// Re-export rail segment types.
pub use rail::{Direction, Orientation, RailSegment, SegmentId, Waypoint};
/// Re-export terrain types.
pub use terrain::{BreakableTile, HitOutcome};
/// Re-export track file types.
pub use track::{CarSpec, SegmentSpec, TrackFile};
/// Re-export traversal types.
pub use traversal::{Step, StepEvent};

/// Re-export of the vector type used for positions and tangents.
pub use glam::Vec3;
