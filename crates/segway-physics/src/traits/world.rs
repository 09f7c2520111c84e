use nalgebra::{UnitQuaternion, Vector3};

use crate::{Part, Pose, WorldError};

/// Capability interface of a rigid-body world driving the vehicle.
///
/// The controller treats the world as a black box: it ticks it, reads back
/// part poses and writes wheel motor settings. The timestep is owned by the
/// world. All calls are synchronous.
pub trait PhysicsWorld {
    /// Advance the simulation by one internal tick.
    ///
    /// Returns `Err(WorldError::Diverged)` when the solver produced non-finite state.
    fn step(&mut self) -> Result<(), WorldError>;

    /// World-frame position of `part` after the latest step.
    fn get_part_position(&self, part: Part) -> Result<Vector3<f64>, WorldError>;

    /// World-frame orientation of `part` after the latest step.
    fn get_part_rotation(&self, part: Part) -> Result<UnitQuaternion<f64>, WorldError>;

    /// Set the torque limit of the left wheel motor.
    fn set_max_left_motor_torque(&mut self, value: f64) -> Result<(), WorldError>;

    /// Set the torque limit of the right wheel motor.
    fn set_max_right_motor_torque(&mut self, value: f64) -> Result<(), WorldError>;

    /// Set the target angular velocity of the left wheel motor.
    fn set_left_motor_target_speed(&mut self, value: f64) -> Result<(), WorldError>;

    /// Set the target angular velocity of the right wheel motor.
    fn set_right_motor_target_speed(&mut self, value: f64) -> Result<(), WorldError>;

    /// Largest target speed magnitude the motors accept.
    ///
    /// Speeds within this bound and finite never make the target speed setters fail.
    fn max_target_speed(&self) -> f64 {
        f64::MAX
    }

    /// Position and orientation of `part` after the latest step.
    fn get_part_pose(&self, part: Part) -> Result<Pose, WorldError> {
        Ok(Pose::new(self.get_part_position(part)?, self.get_part_rotation(part)?))
    }
}
