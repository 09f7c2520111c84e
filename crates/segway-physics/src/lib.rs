#![warn(missing_docs)]
#![doc = "Rigid-body world of a two-wheeled self-balancing vehicle."]
#![doc = ""]
#![doc = "This crate defines the closed set of tracked parts, their poses, the"]
#![doc = "`PhysicsWorld` capability trait driven once per frame, a rapier3d-backed"]
#![doc = "implementation of the vehicle rig, and a scripted world for tests."]

pub mod error;
mod part;
mod pose;
#[allow(missing_docs)]
pub mod traits;
#[allow(missing_docs)]
pub mod worlds;

pub use error::WorldError;
pub use part::Part;
pub use pose::{Pose, PoseSet};
pub use traits::world::PhysicsWorld;
pub use worlds::rapier::{RapierWorld, WorldSettings};
pub use worlds::scripted::{ActuatorCall, ScriptedWorld};
