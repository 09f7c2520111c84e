//! Error types for the physics world.

#![warn(missing_docs)]

use crate::Part;

/// Error type for physics world operations.
///
/// Every variant is fatal for the running simulation: parts form a closed set,
/// so a missing part is a setup bug, and a diverged solver cannot be stepped
/// back to a valid state.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldError {
    /// Error for a part the world does not track.
    /// This variant is returned when a part has no body or joint in the world.
    UnknownPart(Part),
    /// Error for reading the world before it holds any state.
    /// This variant is returned when a pose is requested before the first step of a scripted world.
    NotInitialized(&'static str),
    /// Error for a solver that produced non-finite state.
    /// This variant is returned by `step` when a tracked body has a non-finite pose.
    Diverged(Part),
    /// Error for an invalid integration timestep.
    /// This variant is returned when a timestep is not finite or not positive.
    InvalidTimestep(&'static str),
    /// Error for an invalid actuator setting.
    /// This variant is returned when a torque limit or target speed is not finite.
    InvalidActuatorValue(&'static str),
    /// Error for a scripted world that has no frames left.
    ScriptExhausted(usize),
}

impl core::fmt::Display for WorldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WorldError::UnknownPart(part) => write!(f, "Unknown part: {}", part),
            WorldError::NotInitialized(msg) => write!(f, "World not initialized: {}", msg),
            WorldError::Diverged(part) => write!(f, "Simulation diverged at part {}", part),
            WorldError::InvalidTimestep(msg) => write!(f, "Invalid timestep: {}", msg),
            WorldError::InvalidActuatorValue(msg) => write!(f, "Invalid actuator value: {}", msg),
            WorldError::ScriptExhausted(frames) => {
                write!(f, "Script exhausted after {} frames", frames)
            }
        }
    }
}

impl core::error::Error for WorldError {}
