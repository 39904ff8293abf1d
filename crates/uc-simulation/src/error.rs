use uc_core::car::CarId;
use uc_core::error::RailError;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("car {car} blocked by car {by}")]
    BlockedHandoff { car: CarId, by: CarId },

    #[error("action requires editing mode")]
    NotEditing,

    #[error(transparent)]
    Rail(RailError),
}

impl From<RailError> for SimError {
    fn from(err: RailError) -> Self {
        match err {
            RailError::Blocked { car, by } => Self::BlockedHandoff { car, by },
            other => Self::Rail(other),
        }
    }
}
