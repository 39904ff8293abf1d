use crate::car::CarId;
use crate::rail::SegmentId;

/// Alias for `Result<T, RailError>`.
pub type RailResult<T> = Result<T, RailError>;

/// Errors that can occur when building or mutating a rail network.
#[derive(Debug, thiserror::Error)]
pub enum RailError {
    /// The requested segment ID does not exist in the network.
    #[error("segment not found: {0}")]
    SegmentNotFound(SegmentId),

    /// The requested car ID does not exist in the network.
    #[error("car not found: {0}")]
    CarNotFound(CarId),

    /// A segment was authored without any waypoints.
    #[error("segment \"{0}\" has no waypoints")]
    EmptySegment(String),

    /// A segment or car with the same name already exists.
    #[error("name already in use: \"{0}\"")]
    DuplicateName(String),

    /// A named reference in a track file could not be resolved.
    #[error("unknown {kind} \"{name}\"")]
    UnknownReference {
        /// What kind of object was referenced (segment, car).
        kind: &'static str,
        /// The unresolved name.
        name: String,
    },

    /// A waypoint index outside the segment was requested.
    #[error("waypoint {index} out of range for segment {segment}")]
    IndexOutOfRange {
        /// The segment that was indexed.
        segment: SegmentId,
        /// The offending index.
        index: usize,
    },

    /// Another car occupies the space a car was meant to move into.
    #[error("car {car} is blocked by car {by}")]
    Blocked {
        /// The car that was being placed.
        car: CarId,
        /// The car already occupying the space.
        by: CarId,
    },

    /// The car has been wrecked and can no longer be placed.
    #[error("car {0} is wrecked")]
    CarWrecked(CarId),

    /// A track file could not be parsed.
    #[error("invalid track file: {0}")]
    Parse(#[from] serde_json::Error),
}
