use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RailError, RailResult};

/// Unique identifier for every rail segment in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub Uuid);

impl SegmentId {
    /// Generate a new random segment ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// How a segment is shaped. Bent segments are always traversed from one
/// fixed end toward the other, regardless of where the car came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// A straight piece, entered at its first waypoint.
    #[default]
    Straight,
    /// A curve turning left, entered at its first waypoint.
    BentLeft,
    /// A curve turning right, entered at its last waypoint.
    BentRight,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Straight => write!(f, "straight"),
            Self::BentLeft => write!(f, "bent left"),
            Self::BentRight => write!(f, "bent right"),
        }
    }
}

/// Direction of travel through a segment's waypoint sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Increasing waypoint index (+1).
    Forward,
    /// Decreasing waypoint index (-1).
    Backward,
}

impl Direction {
    /// Index delta for one step: +1 or -1.
    pub fn step(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    /// Sign applied to waypoint tangents when facing along this direction.
    pub fn sign(self) -> f32 {
        self.step() as f32
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// A point on a segment's internal path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// World position of the waypoint.
    pub position: Vec3,
    /// Path tangent at the waypoint, pointing toward increasing index.
    pub forward: Vec3,
}

impl Waypoint {
    /// Create a waypoint, normalizing the tangent.
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.normalize_or_zero(),
        }
    }

    /// `count` evenly spaced waypoints from `start` toward `end`. The end point
    /// itself is excluded so that consecutive spans can share it as the next
    /// segment's first waypoint.
    pub fn span(start: Vec3, end: Vec3, count: usize) -> Vec<Self> {
        let forward = (end - start).normalize_or_zero();
        (0..count)
            .map(|k| Self::new(start.lerp(end, k as f32 / count as f32), forward))
            .collect()
    }
}

/// A discrete rail piece with an ordered path of waypoints.
#[derive(Debug, Clone)]
pub struct RailSegment {
    /// Unique identifier for this segment.
    pub id: SegmentId,
    /// Display name, unique within a network.
    pub name: String,
    /// Shape of the segment, which fixes its traversal order.
    pub orientation: Orientation,
    /// Cars may only enter powered segments.
    pub powered: bool,
    /// Whether crossing this segment's trigger waypoint reaches a checkpoint.
    pub final_checkpoint: bool,
    /// Segment a car arrives from.
    pub previous: Option<SegmentId>,
    /// Segment a car leaves toward.
    pub next: Option<SegmentId>,
    waypoints: Vec<Waypoint>,
}

impl RailSegment {
    /// Create an unlinked, powered segment. Fails if `waypoints` is empty.
    pub fn new(
        name: impl Into<String>,
        orientation: Orientation,
        waypoints: Vec<Waypoint>,
    ) -> RailResult<Self> {
        let name = name.into();
        if waypoints.is_empty() {
            return Err(RailError::EmptySegment(name));
        }
        Ok(Self {
            id: SegmentId::new(),
            name,
            orientation,
            powered: true,
            final_checkpoint: false,
            previous: None,
            next: None,
            waypoints,
        })
    }

    /// Create a straight segment.
    pub fn straight(name: impl Into<String>, waypoints: Vec<Waypoint>) -> RailResult<Self> {
        Self::new(name, Orientation::Straight, waypoints)
    }

    /// Set whether the segment is powered.
    pub fn with_powered(mut self, powered: bool) -> Self {
        self.powered = powered;
        self
    }

    /// Mark the segment as holding the final checkpoint.
    pub fn with_final_checkpoint(mut self, final_checkpoint: bool) -> Self {
        self.final_checkpoint = final_checkpoint;
        self
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Number of waypoints. Always at least 1.
    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Direction every car travels through this segment.
    pub fn canonical_direction(&self) -> Direction {
        match self.orientation {
            Orientation::Straight | Orientation::BentLeft => Direction::Forward,
            Orientation::BentRight => Direction::Backward,
        }
    }

    /// Entry waypoint index and direction for a car handed onto this segment.
    pub fn entry(&self) -> (usize, Direction) {
        match self.canonical_direction() {
            Direction::Forward => (0, Direction::Forward),
            Direction::Backward => (self.waypoints.len() - 1, Direction::Backward),
        }
    }

    /// Waypoint a car is set onto when placed directly on this segment.
    pub fn mid_index(&self) -> usize {
        self.waypoints.len() / 2
    }

    /// The checkpoint trigger waypoint, if this is a final-checkpoint segment.
    pub fn checkpoint_index(&self) -> Option<usize> {
        self.final_checkpoint
            .then(|| (self.waypoints.len() / 2 + 1).min(self.waypoints.len() - 1))
    }

    /// Whether a car arriving at `index` moving in `direction` crosses the
    /// checkpoint. Only crossings in the canonical direction count.
    pub fn triggers_checkpoint(&self, index: usize, direction: Direction) -> bool {
        direction == self.canonical_direction() && self.checkpoint_index() == Some(index)
    }
}
