//! Closed-loop balance simulation of a two-wheeled self-balancing vehicle.
//!
//! Each frame the [`controller::SimulationController`] steps a
//! [`segway_physics::PhysicsWorld`], hands every part's transform to a
//! [`renderer::SceneRenderer`] and drives both wheel motors from the handle's tilt.

pub mod config;
pub mod controller;
pub mod error;
pub mod renderer;
pub mod transform;

pub use controller::{ControllerSettings, ControllerState, FrameReport, SimulationController};
pub use error::SimulationError;
pub use renderer::{NodeTable, SceneRenderer};
pub use transform::{PoseSnapshot, Transform};
