//! Error types for the mission model.

use thiserror::Error;

/// Errors raised while validating mission input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MissionError {
    /// The drone ID was empty.
    #[error("drone id cannot be empty")]
    EmptyDroneId,

    /// The drone ID contains characters that cannot appear in a resource name.
    #[error("drone id '{0}' is not a valid resource name segment")]
    InvalidDroneId(String),

    /// The drone ID would push derived job names past the resource name limit.
    #[error("drone id is {len} characters long, at most {max} allowed")]
    DroneIdTooLong { len: usize, max: usize },
}
