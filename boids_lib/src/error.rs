use thiserror::Error;

use crate::options::Parameter;

/// Everything the simulation core refuses to accept at its boundary.
///
/// The core itself is total over valid input, so these only come out of
/// validation: parameter snapshots, world bounds and agent state handed in
/// from outside.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoidsError {
    #[error("{parameter} = {value} is outside of [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: Parameter,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{parameter} is not a finite number")]
    NonFiniteParameter { parameter: Parameter },

    #[error("position ({x}, {y}) is not finite")]
    NonFinitePosition { x: f32, y: f32 },

    #[error("velocity ({x}, {y}) is not finite")]
    NonFiniteVelocity { x: f32, y: f32 },

    #[error("world bounds {width}x{height} must be finite and positive")]
    InvalidWorld { width: f32, height: f32 },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BoidsError>;
