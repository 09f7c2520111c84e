//! Error types for the simulation controller.

use segway_control::ControlError;
use segway_physics::{Part, WorldError};
use thiserror::Error;

/// Errors surfaced by the simulation controller.
///
/// None of them is recovered internally: a failing frame stops the controller
/// and the caller is expected to end its frame loop.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The controller was set up with invalid or late configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The physics world produced non-finite state.
    #[error("simulation diverged at part {part} in frame {frame}")]
    Diverged {
        /// First part found with a non-finite pose.
        part: Part,
        /// Frame in which the divergence was detected.
        frame: u64,
    },

    /// A physics world call failed.
    #[error("physics world error: {0}")]
    World(#[from] WorldError),

    /// The control law could not be evaluated.
    #[error("control error: {0}")]
    Control(#[from] ControlError),

    /// `update` was called after the controller stopped.
    #[error("controller is stopped")]
    Stopped,
}

impl SimulationError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}
