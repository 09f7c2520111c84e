use nalgebra::{UnitQuaternion, Vector3};

use crate::traits::world::PhysicsWorld;
use crate::{Part, PoseSet, WorldError};

/// An actuator call received by a [`ScriptedWorld`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    /// `set_max_left_motor_torque`
    MaxLeftTorque(f64),
    /// `set_max_right_motor_torque`
    MaxRightTorque(f64),
    /// `set_left_motor_target_speed`
    LeftTargetSpeed(f64),
    /// `set_right_motor_target_speed`
    RightTargetSpeed(f64),
}

/// A world replaying a fixed sequence of pose sets, one per step.
///
/// It stands in for a rigid-body engine when the controller is tested: the
/// N-th call to `step` exposes the N-th scripted frame, and every actuator
/// call is recorded in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWorld {
    frames: Vec<PoseSet>,
    current: Option<usize>,
    steps: usize,
    divergence: Option<(usize, Part)>,
    max_target_speed: Option<f64>,
    calls: Vec<ActuatorCall>,
}

impl ScriptedWorld {
    /// A world replaying `frames`.
    pub fn new(frames: Vec<PoseSet>) -> Self {
        ScriptedWorld {
            frames,
            ..Default::default()
        }
    }

    /// A world replaying the same pose set `count` times.
    pub fn repeating(poses: PoseSet, count: usize) -> Self {
        ScriptedWorld::new(vec![poses; count])
    }

    /// Makes the `step`-th call to `step` (1-based) fail as a solver divergence at `part`.
    pub fn with_divergence_at(mut self, step: usize, part: Part) -> Self {
        self.divergence = Some((step, part));
        self
    }

    /// Rejects target speeds above `limit` in magnitude.
    pub fn with_max_target_speed(mut self, limit: f64) -> Self {
        self.max_target_speed = Some(limit);
        self
    }

    /// Number of `step` calls received, failed ones included.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Every actuator call received, in order.
    pub fn calls(&self) -> &[ActuatorCall] {
        &self.calls
    }

    /// Latest left target speed, if any was set.
    pub fn left_target_speed(&self) -> Option<f64> {
        self.calls.iter().rev().find_map(|call| match call {
            ActuatorCall::LeftTargetSpeed(v) => Some(*v),
            _ => None,
        })
    }

    /// Latest right target speed, if any was set.
    pub fn right_target_speed(&self) -> Option<f64> {
        self.calls.iter().rev().find_map(|call| match call {
            ActuatorCall::RightTargetSpeed(v) => Some(*v),
            _ => None,
        })
    }

    fn check_target_speed(&self, value: f64) -> Result<(), WorldError> {
        if !(value.is_finite() && value.abs() <= self.max_target_speed()) {
            return Err(WorldError::InvalidActuatorValue("target speed out of range"));
        }
        Ok(())
    }

    fn frame(&self) -> Result<&PoseSet, WorldError> {
        self.current
            .map(|i| &self.frames[i])
            .ok_or(WorldError::NotInitialized("no step taken yet"))
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn step(&mut self) -> Result<(), WorldError> {
        self.steps += 1;
        if let Some((step, part)) = self.divergence {
            if step == self.steps {
                return Err(WorldError::Diverged(part));
            }
        }
        if self.steps > self.frames.len() {
            return Err(WorldError::ScriptExhausted(self.frames.len()));
        }
        self.current = Some(self.steps - 1);
        Ok(())
    }

    fn get_part_position(&self, part: Part) -> Result<Vector3<f64>, WorldError> {
        Ok(self.frame()?[part].position)
    }

    fn get_part_rotation(&self, part: Part) -> Result<UnitQuaternion<f64>, WorldError> {
        Ok(self.frame()?[part].rotation)
    }

    fn set_max_left_motor_torque(&mut self, value: f64) -> Result<(), WorldError> {
        self.calls.push(ActuatorCall::MaxLeftTorque(value));
        Ok(())
    }

    fn set_max_right_motor_torque(&mut self, value: f64) -> Result<(), WorldError> {
        self.calls.push(ActuatorCall::MaxRightTorque(value));
        Ok(())
    }

    fn set_left_motor_target_speed(&mut self, value: f64) -> Result<(), WorldError> {
        self.check_target_speed(value)?;
        self.calls.push(ActuatorCall::LeftTargetSpeed(value));
        Ok(())
    }

    fn set_right_motor_target_speed(&mut self, value: f64) -> Result<(), WorldError> {
        self.check_target_speed(value)?;
        self.calls.push(ActuatorCall::RightTargetSpeed(value));
        Ok(())
    }

    fn max_target_speed(&self) -> f64 {
        self.max_target_speed.unwrap_or(f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pose;

    fn frame(x: f64) -> PoseSet {
        let mut set = PoseSet::default();
        for part in Part::ALL {
            set[part] = Pose::from_position(Vector3::new(x, part.index() as f64, 0.0));
        }
        set
    }

    #[test]
    fn test_read_before_step_fails() {
        let world = ScriptedWorld::new(vec![frame(0.0)]);
        assert!(matches!(
            world.get_part_position(Part::Base),
            Err(WorldError::NotInitialized(_))
        ));
    }

    #[test]
    fn test_frames_replay_in_order() {
        let mut world = ScriptedWorld::new(vec![frame(1.0), frame(2.0)]);
        world.step().unwrap();
        assert_eq!(world.get_part_position(Part::Handle).unwrap(), Vector3::new(1.0, 1.0, 0.0));
        world.step().unwrap();
        assert_eq!(world.get_part_position(Part::RightWheel).unwrap(), Vector3::new(2.0, 3.0, 0.0));
        assert_eq!(world.step(), Err(WorldError::ScriptExhausted(2)));
        assert_eq!(world.steps(), 3);
    }

    #[test]
    fn test_injected_divergence() {
        let mut world = ScriptedWorld::repeating(frame(0.0), 5).with_divergence_at(2, Part::Handle);
        assert!(world.step().is_ok());
        assert_eq!(world.step(), Err(WorldError::Diverged(Part::Handle)));
    }

    #[test]
    fn test_actuator_calls_recorded() {
        let mut world = ScriptedWorld::default();
        world.set_max_left_motor_torque(50.0).unwrap();
        world.set_left_motor_target_speed(2.0).unwrap();
        world.set_left_motor_target_speed(3.0).unwrap();
        assert_eq!(
            world.calls(),
            &[
                ActuatorCall::MaxLeftTorque(50.0),
                ActuatorCall::LeftTargetSpeed(2.0),
                ActuatorCall::LeftTargetSpeed(3.0),
            ]
        );
        assert_eq!(world.left_target_speed(), Some(3.0));
        assert_eq!(world.right_target_speed(), None);
    }

    #[test]
    fn test_out_of_range_target_speed_rejected() {
        let mut world = ScriptedWorld::default().with_max_target_speed(5.0);
        assert_eq!(world.max_target_speed(), 5.0);
        world.set_right_motor_target_speed(-5.0).unwrap();
        assert!(matches!(
            world.set_left_motor_target_speed(5.5),
            Err(WorldError::InvalidActuatorValue(_))
        ));
        assert!(world.set_left_motor_target_speed(f64::NAN).is_err());
        assert_eq!(world.calls(), &[ActuatorCall::RightTargetSpeed(-5.0)]);
    }
}
