#![warn(missing_docs)]

//! Error types for the control library.
//!
//! This module defines the errors that can occur while deriving the vehicle
//! inclination or validating control parameters.

use core::fmt;

/// Errors that can occur in control calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    /// Error for an orientation that does not yield a finite up vector.
    /// This variant is returned when the reference orientation contains NaN or infinite components.
    NonFiniteOrientation(&'static str),
    /// Error for an invalid proportional gain or speed offset.
    /// This variant is returned when a gain or offset is not finite.
    InvalidGain(&'static str),
    /// Error for an invalid motor torque limit.
    /// This variant is returned when a torque limit is negative or not finite.
    InvalidTorqueLimit(&'static str),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::NonFiniteOrientation(msg) => write!(f, "Non-finite orientation: {}", msg),
            ControlError::InvalidGain(msg) => write!(f, "Invalid control gain: {}", msg),
            ControlError::InvalidTorqueLimit(msg) => write!(f, "Invalid torque limit: {}", msg),
        }
    }
}

impl core::error::Error for ControlError {}
