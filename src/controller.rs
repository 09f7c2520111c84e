use segway_control::{target_speeds, ActuatorCommand, ActuatorLimits, ControlGains, ControlState};
use segway_physics::{Part, PhysicsWorld, WorldError};
use tracing::{debug, error, info};

use crate::error::SimulationError;
use crate::renderer::SceneRenderer;
use crate::transform::PoseSnapshot;

/// Lifecycle of a [`SimulationController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Limits applied, no frame run yet.
    Initialized,
    /// At least one frame completed.
    Running,
    /// Stopped by the caller or by a failed frame. Terminal.
    Stopped,
}

/// Parameters supplied once when the controller is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Static motor torque limits.
    pub limits: ActuatorLimits,
    /// Proportional law parameters.
    pub gains: ControlGains,
    /// Part whose tilt drives the balance law.
    pub reference_part: Part,
}

/// Outcome of one completed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// 1-based frame number, equal to the number of physics steps taken.
    pub frame: u64,
    /// Tilt derived from this frame's reference pose.
    pub control: ControlState,
    /// Command written to the motors this frame.
    pub command: ActuatorCommand,
}

/// Drives the step, read, control, write cycle once per frame.
///
/// The controller owns the physics world and the renderer for its whole
/// lifetime. Within a frame the physics step comes first, then every part is
/// read from that step only; the control command is derived from the same
/// read, so a frame that fails does so before the renderer or the motors are
/// touched.
pub struct SimulationController<W, R> {
    world: W,
    renderer: R,
    settings: ControllerSettings,
    state: ControllerState,
    frame: u64,
}

impl<W: PhysicsWorld, R: SceneRenderer> SimulationController<W, R> {
    /// Build a controller and apply the torque limits to the world.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::Configuration` if the gains or limits are
    /// invalid or the world refuses the limits.
    pub fn new(world: W, renderer: R, settings: ControllerSettings) -> Result<Self, SimulationError> {
        settings
            .gains
            .validate()
            .map_err(|e| SimulationError::configuration(e.to_string()))?;

        let mut controller = SimulationController {
            world,
            renderer,
            settings,
            state: ControllerState::Initialized,
            frame: 0,
        };
        controller.apply_limits(settings.limits)?;

        info!(
            gains = %settings.gains,
            limits = %settings.limits,
            reference = %settings.reference_part,
            "Simulation controller initialized."
        );
        Ok(controller)
    }

    /// Replace the motor torque limits.
    ///
    /// Only allowed before the first frame; re-applying the same limits is harmless.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::Configuration` once a frame has run or if the limits are invalid.
    pub fn configure_limits(&mut self, limits: ActuatorLimits) -> Result<(), SimulationError> {
        if self.state != ControllerState::Initialized {
            return Err(SimulationError::configuration(
                "actuator limits must be set before the first update",
            ));
        }
        self.apply_limits(limits)
    }

    fn apply_limits(&mut self, limits: ActuatorLimits) -> Result<(), SimulationError> {
        let configuration = |e: &dyn std::fmt::Display| SimulationError::configuration(e.to_string());
        limits.validate().map_err(|e| configuration(&e))?;
        self.world
            .set_max_left_motor_torque(limits.max_left_torque)
            .map_err(|e| configuration(&e))?;
        self.world
            .set_max_right_motor_torque(limits.max_right_torque)
            .map_err(|e| configuration(&e))?;
        self.settings.limits = limits;
        debug!(%limits, "Actuator limits applied.");
        Ok(())
    }

    /// Run one frame.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::Stopped` once stopped. Any other error stops
    /// the controller; the renderer keeps the previous frame's transforms.
    pub fn update(&mut self) -> Result<FrameReport, SimulationError> {
        if self.state == ControllerState::Stopped {
            return Err(SimulationError::Stopped);
        }
        match self.run_frame() {
            Ok(report) => {
                self.state = ControllerState::Running;
                Ok(report)
            }
            Err(e) => {
                error!(frame = self.frame, error = %e, "Frame failed, stopping the controller.");
                self.state = ControllerState::Stopped;
                Err(e)
            }
        }
    }

    fn run_frame(&mut self) -> Result<FrameReport, SimulationError> {
        let frame = self.frame + 1;
        self.world.step().map_err(|e| match e {
            WorldError::Diverged(part) => SimulationError::Diverged { part, frame },
            other => other.into(),
        })?;
        self.frame = frame;

        let snapshot = PoseSnapshot::capture(&self.world, frame)?;
        let control = ControlState::from_rotation(&snapshot.pose(self.settings.reference_part).rotation)?;
        let speeds = target_speeds(control.inclination, &self.settings.gains);
        let max_speed = self.world.max_target_speed();
        if ![speeds.left, speeds.right]
            .iter()
            .all(|s| s.is_finite() && s.abs() <= max_speed)
        {
            return Err(WorldError::InvalidActuatorValue("target speed out of the motors' range").into());
        }

        for (part, transform) in snapshot.transforms() {
            self.renderer.write_transform(part, &transform);
        }

        self.world.set_left_motor_target_speed(speeds.left)?;
        self.world.set_right_motor_target_speed(speeds.right)?;

        debug!(
            frame,
            inclination = control.inclination,
            left = speeds.left,
            right = speeds.right,
            "Frame complete."
        );
        Ok(FrameReport {
            frame,
            control,
            command: ActuatorCommand::new(&self.settings.limits, speeds),
        })
    }

    /// Stop the controller; further updates fail.
    pub fn stop(&mut self) {
        if self.state != ControllerState::Stopped {
            info!(frame = self.frame, "Simulation controller stopped.");
        }
        self.state = ControllerState::Stopped;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Number of completed physics steps.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Gains, reference part and the limits currently applied.
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// The owned physics world.
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Mutable access to the world between frames, e.g. to push the rig.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// The owned renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
