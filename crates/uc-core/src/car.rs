use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rail::{Direction, SegmentId};

/// Unique identifier for every train car in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarId(pub Uuid);

impl CarId {
    /// Generate a new random car ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CarId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Lifecycle status of a car.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    /// On the network and able to move.
    #[default]
    Active,
    /// Ran off the end of the rail; waiting to be removed.
    Wrecked,
}

/// Where a car sits on the rail: segment, waypoint index, and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// The occupied segment.
    pub segment: SegmentId,
    /// Index into the segment's waypoints.
    pub index: usize,
    /// Direction of travel through the segment.
    pub direction: Direction,
}

/// A single car of the train.
///
/// Placement is owned by the [`RailNetwork`](crate::network::RailNetwork) so
/// that it always agrees with the segment occupancy index.
#[derive(Debug, Clone)]
pub struct TrainCar {
    /// Unique identifier for this car.
    pub id: CarId,
    /// Display name, unique within a network.
    pub name: String,
    /// Upgrade tier of the car (1 = base).
    pub tier: u32,
    /// Permeable cars neither block placement nor show up in adjacency queries.
    pub permeable: bool,
    status: CarStatus,
    position: Vec3,
    facing: Vec3,
    placement: Option<Placement>,
}

impl TrainCar {
    /// Create an unplaced tier-1 car.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CarId::new(),
            name: name.into(),
            tier: 1,
            permeable: false,
            status: CarStatus::Active,
            position: Vec3::ZERO,
            facing: Vec3::X,
            placement: None,
        }
    }

    /// Set the car's tier (minimum 1).
    pub fn with_tier(mut self, tier: u32) -> Self {
        self.tier = tier.max(1);
        self
    }

    /// Set whether the car is permeable.
    pub fn with_permeable(mut self, permeable: bool) -> Self {
        self.permeable = permeable;
        self
    }

    pub fn status(&self) -> CarStatus {
        self.status
    }

    pub fn is_wrecked(&self) -> bool {
        self.status == CarStatus::Wrecked
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit vector the car is facing.
    pub fn facing(&self) -> Vec3 {
        self.facing
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// The segment the car currently occupies.
    pub fn segment(&self) -> Option<SegmentId> {
        self.placement.map(|p| p.segment)
    }

    pub fn is_on_rail(&self) -> bool {
        self.placement.is_some()
    }

    /// Whether this car stops other cars from being placed next to it.
    pub fn blocks(&self) -> bool {
        !self.permeable && self.status == CarStatus::Active
    }

    /// Move the car in world space. Rail progress is unaffected.
    pub fn set_transform(&mut self, position: Vec3, facing: Vec3) {
        self.position = position;
        self.facing = facing.try_normalize().unwrap_or(self.facing);
    }

    pub(crate) fn set_placement(&mut self, placement: Option<Placement>) {
        self.placement = placement;
    }

    pub(crate) fn set_status(&mut self, status: CarStatus) {
        self.status = status;
    }
}
