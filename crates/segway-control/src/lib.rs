#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for the balance control law of a two-wheeled self-balancing vehicle."]
#![doc = ""]
#![doc = "This crate provides the inclination extraction, the stateless proportional law"]
#![doc = "mapping inclination to wheel target speeds, and the actuator limit and command types."]

use core::fmt;
use libm::asin;
use nalgebra::{UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::ControlError;

/// Inclination of the reference body, derived fresh every frame.
///
/// Positive values mean the vehicle leans forward (towards world -Z).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlState {
    /// Tilt angle (rad).
    pub inclination: f64,
}

impl ControlState {
    /// Derive the control state from the orientation of the reference body.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::NonFiniteOrientation)` if the orientation is not finite.
    pub fn from_rotation(rotation: &UnitQuaternion<f64>) -> Result<Self, ControlError> {
        Ok(ControlState {
            inclination: inclination(rotation)?,
        })
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(inclination: {:.4} rad)", self.inclination)
    }
}

/// Computes the inclination of a body from its world orientation.
///
/// The body's up axis is rotated into the world frame and its Z component
/// (the drive axis) is taken. The result is `-asin(z)`, with `z` clamped to
/// `[-1, 1]` so that numerical drift of the quaternion norm still yields a
/// real angle.
///
/// # Arguments
///
/// * `rotation`: World orientation of the reference body.
///
/// # Errors
///
/// Returns `Err(ControlError::NonFiniteOrientation)` if the up vector has a non-finite component.
///
/// # Returns
///
/// The inclination in radians, in `[-PI/2, PI/2]`.
pub fn inclination(rotation: &UnitQuaternion<f64>) -> Result<f64, ControlError> {
    let up = rotation * Vector3::y();
    let lean = up.z;
    if !lean.is_finite() {
        return Err(ControlError::NonFiniteOrientation(
            "up vector is not finite",
        ));
    }
    Ok(-asin(lean.clamp(-1.0, 1.0)))
}

/// Parameters of the proportional balance law.
///
/// Each motor has its own gain. `base_speed` is a common offset added to both
/// wheels and `steering_bias` is a differential offset: added to the left wheel,
/// subtracted from the right one.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlGains {
    /// Gain applied to the inclination for the left motor ((rad/s) / rad).
    pub proportional_gain_left: f64,
    /// Gain applied to the inclination for the right motor ((rad/s) / rad).
    pub proportional_gain_right: f64,
    /// Differential speed offset (rad/s).
    #[cfg_attr(feature = "serde", serde(default))]
    pub steering_bias: f64,
    /// Common speed offset (rad/s).
    #[cfg_attr(feature = "serde", serde(default))]
    pub base_speed: f64,
}

impl ControlGains {
    /// Construct gains with the same proportional gain on both motors and no offsets.
    pub const fn symmetric(gain: f64) -> Self {
        ControlGains {
            proportional_gain_left: gain,
            proportional_gain_right: gain,
            steering_bias: 0.0,
            base_speed: 0.0,
        }
    }

    /// Returns a copy of these gains with the given offsets.
    pub const fn with_offsets(self, base_speed: f64, steering_bias: f64) -> Self {
        ControlGains {
            base_speed,
            steering_bias,
            ..self
        }
    }

    /// Checks that every gain and offset is finite.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidGain)` naming the first offending parameter.
    pub fn validate(&self) -> Result<(), ControlError> {
        if !self.proportional_gain_left.is_finite() {
            return Err(ControlError::InvalidGain("left gain must be finite"));
        }
        if !self.proportional_gain_right.is_finite() {
            return Err(ControlError::InvalidGain("right gain must be finite"));
        }
        if !self.steering_bias.is_finite() {
            return Err(ControlError::InvalidGain("steering bias must be finite"));
        }
        if !self.base_speed.is_finite() {
            return Err(ControlError::InvalidGain("base speed must be finite"));
        }
        Ok(())
    }
}

impl fmt::Display for ControlGains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(kL: {:.2}, kR: {:.2}, base: {:.2} rad/s, steer: {:.2} rad/s)",
            self.proportional_gain_left, self.proportional_gain_right, self.base_speed, self.steering_bias
        )
    }
}

/// Left and right wheel target speeds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorSpeeds {
    /// Left wheel target angular velocity (rad/s).
    pub left: f64,
    /// Right wheel target angular velocity (rad/s).
    pub right: f64,
}

impl MotorSpeeds {
    /// Construct motor speeds.
    pub const fn new(left: f64, right: f64) -> Self {
        MotorSpeeds { left, right }
    }
}

impl fmt::Display for MotorSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(ωL: {:.2} rad/s, ωR: {:.2} rad/s)", self.left, self.right)
    }
}

/// Evaluates the proportional balance law.
///
/// This is a pure function of its inputs: the same inclination and gains
/// always produce the same speeds.
///
/// # Arguments
///
/// * `inclination`: Tilt of the reference body (rad), positive when leaning forward.
/// * `gains`: Per-motor gains and speed offsets.
///
/// # Returns
///
/// The target speeds for the left and right motors.
pub fn target_speeds(inclination: f64, gains: &ControlGains) -> MotorSpeeds {
    MotorSpeeds {
        left: gains.proportional_gain_left * inclination + gains.base_speed + gains.steering_bias,
        right: gains.proportional_gain_right * inclination + gains.base_speed - gains.steering_bias,
    }
}

/// Static torque limits of the two wheel motors.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorLimits {
    /// Maximum torque of the left motor (N·m).
    pub max_left_torque: f64,
    /// Maximum torque of the right motor (N·m).
    pub max_right_torque: f64,
}

impl ActuatorLimits {
    /// Construct validated actuator limits.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidTorqueLimit)` if a limit is negative or not finite.
    pub fn new(max_left_torque: f64, max_right_torque: f64) -> Result<Self, ControlError> {
        let limits = ActuatorLimits {
            max_left_torque,
            max_right_torque,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Checks that both limits are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `Err(ControlError::InvalidTorqueLimit)` for the first invalid limit.
    pub fn validate(&self) -> Result<(), ControlError> {
        if !(self.max_left_torque.is_finite() && self.max_left_torque >= 0.0) {
            return Err(ControlError::InvalidTorqueLimit(
                "left limit must be finite and non-negative",
            ));
        }
        if !(self.max_right_torque.is_finite() && self.max_right_torque >= 0.0) {
            return Err(ControlError::InvalidTorqueLimit(
                "right limit must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ActuatorLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(τL max: {:.2} N·m, τR max: {:.2} N·m)",
            self.max_left_torque, self.max_right_torque
        )
    }
}

/// Command for a single wheel motor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorCommand {
    /// Hard torque limit enforced by the physics world (N·m).
    pub max_torque: f64,
    /// Target angular velocity (rad/s).
    pub target_speed: f64,
}

/// Commands for both wheel motors issued in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorCommand {
    /// Left motor command.
    pub left: MotorCommand,
    /// Right motor command.
    pub right: MotorCommand,
}

impl ActuatorCommand {
    /// Pair the static limits with this frame's target speeds.
    pub fn new(limits: &ActuatorLimits, speeds: MotorSpeeds) -> Self {
        ActuatorCommand {
            left: MotorCommand {
                max_torque: limits.max_left_torque,
                target_speed: speeds.left,
            },
            right: MotorCommand {
                max_torque: limits.max_right_torque,
                target_speed: speeds.right,
            },
        }
    }

    /// Returns the target speeds carried by this command.
    pub fn speeds(&self) -> MotorSpeeds {
        MotorSpeeds::new(self.left.target_speed, self.right.target_speed)
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(L: {:.2} rad/s ≤ {:.1} N·m, R: {:.2} rad/s ≤ {:.1} N·m)",
            self.left.target_speed, self.left.max_torque, self.right.target_speed, self.right.max_torque
        )
    }
}
