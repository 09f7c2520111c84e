use std::f32::consts::FRAC_PI_2;

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};
use rapier3d::prelude::{
    point, vector, BroadPhase, CCDSolver, ColliderBuilder, ColliderSet, FixedJointBuilder, ImpulseJointHandle,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    QueryPipeline, Real, RevoluteJoint, RevoluteJointBuilder, RigidBody, RigidBodyBuilder, RigidBodyHandle,
    RigidBodySet, Vector,
};
use tracing::{debug, info, trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::world::PhysicsWorld;
use crate::{Part, WorldError};

/// Height of the base centre above the ground at rest (m). The base is centred
/// on the wheel axle, so the rig starts with both wheels on the ground.
pub const BASE_HEIGHT: f64 = WHEEL_RADIUS;
/// Half extents of the base box (m).
pub const BASE_HALF_EXTENTS: [f64; 3] = [0.25, 0.15, 0.2];
/// Offset of the handle centre from the base centre (m). The handle stands
/// straight above the axle, so the upright rig is an equilibrium.
pub const HANDLE_OFFSET: [f64; 3] = [0.0, 0.6, 0.0];
/// Half extents of the handle bar (m).
pub const HANDLE_HALF_EXTENTS: [f64; 3] = [0.05, 0.6, 0.05];
/// Lateral offset of each wheel axle from the base centre (m).
pub const WHEEL_OFFSET_X: f64 = 0.4;
/// Wheel radius (m).
pub const WHEEL_RADIUS: f64 = 0.25;
/// Half of the wheel width (m).
pub const WHEEL_HALF_WIDTH: f64 = 0.1;

const DENSITY: Real = 1.0;
const WHEEL_FRICTION: Real = 1.0;

/// Settings of the rapier-backed world.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSettings {
    /// Integration timestep (s).
    pub timestep: f64,
    /// Vertical gravity component (m/s²), negative pointing down.
    pub gravity: f64,
    /// Damping factor of the wheel velocity motors.
    pub motor_damping: f64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            timestep: 1.0 / 60.0,
            gravity: -9.81,
            motor_damping: 50.0,
        }
    }
}

// Finite in f64 and still finite once narrowed to the engine's `Real`.
fn fits_real(value: f64) -> bool {
    value.is_finite() && value.abs() <= Real::MAX as f64
}

fn validate_timestep(timestep: f64) -> Result<(), WorldError> {
    if !(timestep.is_finite() && timestep > 0.0) {
        return Err(WorldError::InvalidTimestep("must be finite and positive"));
    }
    Ok(())
}

/// The vehicle rig simulated with rapier3d.
///
/// The world is y-up. The base is a free body; the handle is welded to it and
/// each wheel hangs on a revolute joint about the X axis driven by a velocity
/// motor. Motor torque limits start at zero until configured.
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    motor_damping: Real,
    parts: [RigidBodyHandle; Part::COUNT],
    left_axle: ImpulseJointHandle,
    right_axle: ImpulseJointHandle,
    steps: u64,
}

impl RapierWorld {
    /// Build the ground and the vehicle rig.
    ///
    /// # Errors
    ///
    /// Returns `Err(WorldError::InvalidTimestep)` if the configured timestep is invalid.
    pub fn new(settings: &WorldSettings) -> Result<Self, WorldError> {
        validate_timestep(settings.timestep)?;
        if !settings.motor_damping.is_finite() || settings.motor_damping < 0.0 {
            return Err(WorldError::InvalidActuatorValue(
                "motor damping must be finite and non-negative",
            ));
        }

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut impulse_joints = ImpulseJointSet::new();
        let motor_damping = settings.motor_damping as Real;

        colliders.insert(ColliderBuilder::halfspace(Vector::<Real>::y_axis()).build());

        let base_origin = vector![0.0, BASE_HEIGHT as Real, 0.0];
        let base = bodies.insert(RigidBodyBuilder::dynamic().translation(base_origin).can_sleep(false).build());
        let [bx, by, bz] = BASE_HALF_EXTENTS.map(|e| e as Real);
        colliders.insert_with_parent(ColliderBuilder::cuboid(bx, by, bz).density(DENSITY).build(), base, &mut bodies);

        let [ox, oy, oz] = HANDLE_OFFSET.map(|e| e as Real);
        let handle = bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(base_origin + vector![ox, oy, oz])
                .can_sleep(false)
                .build(),
        );
        let [hx, hy, hz] = HANDLE_HALF_EXTENTS.map(|e| e as Real);
        colliders.insert_with_parent(ColliderBuilder::cuboid(hx, hy, hz).density(DENSITY).build(), handle, &mut bodies);
        let weld = FixedJointBuilder::new().local_anchor1(point![ox, oy, oz]).contacts_enabled(false);
        impulse_joints.insert(base, handle, weld, true);

        let mut attach_wheel = |side: Real| {
            let axle_offset = vector![side * WHEEL_OFFSET_X as Real, 0.0, 0.0];
            let wheel = bodies.insert(
                RigidBodyBuilder::dynamic()
                    .translation(base_origin + axle_offset)
                    .can_sleep(false)
                    .build(),
            );
            let tyre = ColliderBuilder::cylinder(WHEEL_HALF_WIDTH as Real, WHEEL_RADIUS as Real)
                .rotation(vector![0.0, 0.0, FRAC_PI_2])
                .density(DENSITY)
                .friction(WHEEL_FRICTION)
                .build();
            colliders.insert_with_parent(tyre, wheel, &mut bodies);
            let axle = RevoluteJointBuilder::new(Vector::<Real>::x_axis())
                .local_anchor1(axle_offset.into())
                .motor_velocity(0.0, motor_damping)
                .motor_max_force(0.0)
                .contacts_enabled(false);
            (wheel, impulse_joints.insert(base, wheel, axle, true))
        };
        let (left_wheel, left_axle) = attach_wheel(-1.0);
        let (right_wheel, right_axle) = attach_wheel(1.0);

        let integration_parameters = IntegrationParameters {
            dt: settings.timestep as Real,
            ..Default::default()
        };

        info!(
            timestep = settings.timestep,
            gravity = settings.gravity,
            bodies = bodies.len(),
            colliders = colliders.len(),
            "Rapier world built."
        );

        Ok(RapierWorld {
            gravity: vector![0.0, settings.gravity as Real, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            impulse_joints,
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            motor_damping,
            parts: [base, handle, left_wheel, right_wheel],
            left_axle,
            right_axle,
            steps: 0,
        })
    }

    /// Change the integration timestep used by subsequent steps.
    ///
    /// # Errors
    ///
    /// Returns `Err(WorldError::InvalidTimestep)` if `timestep` is not finite and positive.
    pub fn set_timestep(&mut self, timestep: f64) -> Result<(), WorldError> {
        validate_timestep(timestep)?;
        self.integration_parameters.dt = timestep as Real;
        debug!(timestep, "Timestep updated.");
        Ok(())
    }

    /// Returns the integration timestep (s).
    pub fn timestep(&self) -> f64 {
        self.integration_parameters.dt as f64
    }

    /// Returns the number of steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn body(&self, part: Part) -> Result<&RigidBody, WorldError> {
        self.bodies
            .get(self.parts[part.index()])
            .ok_or(WorldError::UnknownPart(part))
    }

    fn axle_mut(&mut self, wheel: Part) -> Result<&mut RevoluteJoint, WorldError> {
        let handle = match wheel {
            Part::LeftWheel => self.left_axle,
            Part::RightWheel => self.right_axle,
            other => return Err(WorldError::UnknownPart(other)),
        };
        self.impulse_joints
            .get_mut(handle)
            .and_then(|joint| joint.data.as_revolute_mut())
            .ok_or(WorldError::UnknownPart(wheel))
    }

    fn set_max_torque(&mut self, wheel: Part, value: f64) -> Result<(), WorldError> {
        if !(fits_real(value) && value >= 0.0) {
            return Err(WorldError::InvalidActuatorValue(
                "torque limit must be finite and non-negative",
            ));
        }
        self.axle_mut(wheel)?.set_motor_max_force(value as Real);
        debug!(%wheel, max_torque = value, "Motor torque limit set.");
        Ok(())
    }

    /// Push `part` with a linear impulse (N·s) applied at its centre of mass.
    ///
    /// # Errors
    ///
    /// Returns `Err(WorldError::InvalidActuatorValue)` if a component is not
    /// finite or does not fit the engine's float type.
    pub fn apply_impulse(&mut self, part: Part, impulse: &Vector3<f64>) -> Result<(), WorldError> {
        if !impulse.iter().all(|c| fits_real(*c)) {
            return Err(WorldError::InvalidActuatorValue("impulse must be finite"));
        }
        let handle = self.parts[part.index()];
        let body = self.bodies.get_mut(handle).ok_or(WorldError::UnknownPart(part))?;
        body.apply_impulse(vector![impulse.x as Real, impulse.y as Real, impulse.z as Real], true);
        debug!(%part, ?impulse, "Impulse applied.");
        Ok(())
    }

    fn set_target_speed(&mut self, wheel: Part, value: f64) -> Result<(), WorldError> {
        if !fits_real(value) {
            return Err(WorldError::InvalidActuatorValue("target speed must be finite"));
        }
        let damping = self.motor_damping;
        self.axle_mut(wheel)?.set_motor_velocity(value as Real, damping);
        trace!(%wheel, target_speed = value, "Motor target speed set.");
        Ok(())
    }
}

impl PhysicsWorld for RapierWorld {
    fn step(&mut self) -> Result<(), WorldError> {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        self.steps += 1;

        for part in Part::ALL {
            if !self.get_part_pose(part)?.is_finite() {
                warn!(%part, step = self.steps, "Solver produced a non-finite pose.");
                return Err(WorldError::Diverged(part));
            }
        }
        Ok(())
    }

    fn get_part_position(&self, part: Part) -> Result<Vector3<f64>, WorldError> {
        let t = self.body(part)?.position().translation.vector;
        Ok(Vector3::new(t.x as f64, t.y as f64, t.z as f64))
    }

    fn get_part_rotation(&self, part: Part) -> Result<UnitQuaternion<f64>, WorldError> {
        let q = self.body(part)?.position().rotation;
        // Unchecked so that a corrupted orientation reaches the divergence check as-is.
        Ok(Unit::new_unchecked(Quaternion::new(
            q.w as f64, q.i as f64, q.j as f64, q.k as f64,
        )))
    }

    fn set_max_left_motor_torque(&mut self, value: f64) -> Result<(), WorldError> {
        self.set_max_torque(Part::LeftWheel, value)
    }

    fn set_max_right_motor_torque(&mut self, value: f64) -> Result<(), WorldError> {
        self.set_max_torque(Part::RightWheel, value)
    }

    fn set_left_motor_target_speed(&mut self, value: f64) -> Result<(), WorldError> {
        self.set_target_speed(Part::LeftWheel, value)
    }

    fn set_right_motor_target_speed(&mut self, value: f64) -> Result<(), WorldError> {
        self.set_target_speed(Part::RightWheel, value)
    }

    fn max_target_speed(&self) -> f64 {
        Real::MAX as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-5;

    fn world() -> RapierWorld {
        RapierWorld::new(&WorldSettings::default()).unwrap()
    }

    #[test]
    fn test_initial_rig_layout() {
        let world = world();
        let base = world.get_part_position(Part::Base).unwrap();
        let handle = world.get_part_position(Part::Handle).unwrap();
        let left = world.get_part_position(Part::LeftWheel).unwrap();
        let right = world.get_part_position(Part::RightWheel).unwrap();

        assert!((base - Vector3::new(0.0, 0.25, 0.0)).norm() < EPSILON);
        assert!((handle - Vector3::new(0.0, 0.85, 0.0)).norm() < EPSILON);
        assert!((left - Vector3::new(-0.4, 0.25, 0.0)).norm() < EPSILON);
        assert!((right - Vector3::new(0.4, 0.25, 0.0)).norm() < EPSILON);
        assert_eq!(world.steps(), 0);
    }

    #[test]
    fn test_step_keeps_poses_finite() {
        let mut world = world();
        world.set_max_left_motor_torque(50.0).unwrap();
        world.set_max_right_motor_torque(50.0).unwrap();
        for _ in 0..30 {
            world.step().unwrap();
        }
        assert_eq!(world.steps(), 30);
        for part in Part::ALL {
            assert!(world.get_part_pose(part).unwrap().is_finite(), "{part}");
        }
        let base = world.get_part_position(Part::Base).unwrap();
        let handle = world.get_part_position(Part::Handle).unwrap();
        assert!(handle.y > base.y);
    }

    #[test]
    fn test_driven_wheels_turn() {
        let mut world = world();
        world.set_max_left_motor_torque(50.0).unwrap();
        world.set_max_right_motor_torque(50.0).unwrap();
        world.set_left_motor_target_speed(5.0).unwrap();
        world.set_right_motor_target_speed(5.0).unwrap();
        for _ in 0..30 {
            world.step().unwrap();
        }
        let wheel = world.get_part_rotation(Part::LeftWheel).unwrap();
        assert!(wheel.angle() > 0.1);
    }

    #[test]
    fn test_timestep_update() {
        let mut world = world();
        assert!((world.timestep() - 1.0 / 60.0).abs() < EPSILON);
        world.set_timestep(1.0 / 120.0).unwrap();
        assert!((world.timestep() - 1.0 / 120.0).abs() < EPSILON);
    }

    #[test]
    fn test_invalid_timestep_rejected() {
        let mut world = world();
        assert!(matches!(world.set_timestep(0.0), Err(WorldError::InvalidTimestep(_))));
        assert!(matches!(world.set_timestep(f64::NAN), Err(WorldError::InvalidTimestep(_))));

        let settings = WorldSettings {
            timestep: -0.01,
            ..WorldSettings::default()
        };
        assert!(RapierWorld::new(&settings).is_err());
    }

    #[test]
    fn test_invalid_actuator_values_rejected() {
        let mut world = world();
        assert!(matches!(
            world.set_max_left_motor_torque(-1.0),
            Err(WorldError::InvalidActuatorValue(_))
        ));
        assert!(matches!(
            world.set_right_motor_target_speed(f64::INFINITY),
            Err(WorldError::InvalidActuatorValue("target speed must be finite"))
        ));
        assert!(matches!(
            world.set_left_motor_target_speed(1.0e39),
            Err(WorldError::InvalidActuatorValue(_))
        ));
        assert!(matches!(
            world.set_max_right_motor_torque(f64::MAX),
            Err(WorldError::InvalidActuatorValue(_))
        ));
        assert!(world.set_left_motor_target_speed(world.max_target_speed()).is_ok());
        assert!(matches!(
            world.apply_impulse(Part::Handle, &Vector3::new(f64::NAN, 0.0, 0.0)),
            Err(WorldError::InvalidActuatorValue(_))
        ));
    }

    #[test]
    fn test_impulse_moves_the_part() {
        let mut world = world();
        world.apply_impulse(Part::Handle, &Vector3::new(0.0, 0.0, 0.01)).unwrap();
        for _ in 0..10 {
            world.step().unwrap();
        }
        assert!(world.get_part_position(Part::Handle).unwrap().z > 0.0);
    }
}
