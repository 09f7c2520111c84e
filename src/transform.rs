use nalgebra::{Matrix4, Point3, Translation3, UnitQuaternion, Vector3};
use segway_physics::{Part, PhysicsWorld, Pose, PoseSet};

use crate::error::SimulationError;

/// A 4x4 affine transform handed to the renderer for one part.
///
/// Derived from the latest pose every frame and never stored by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(Matrix4<f64>);

impl Transform {
    /// Compose `translation * rotation * scale`.
    pub fn compose(position: &Vector3<f64>, rotation: &UnitQuaternion<f64>, scale: &Vector3<f64>) -> Self {
        let matrix = Translation3::from(*position).to_homogeneous()
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(scale);
        Transform(matrix)
    }

    /// Transform of a pose with unit scale.
    pub fn from_pose(pose: &Pose) -> Self {
        Transform::compose(&pose.position, &pose.rotation, &Vector3::repeat(1.0))
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Transform(Matrix4::identity())
    }

    /// Returns the underlying matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// Returns the translation column.
    pub fn translation(&self) -> Vector3<f64> {
        self.0.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Maps a point from part space into world space.
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.0.transform_point(point)
    }

    /// Column-major `f32` elements, the layout GPU-facing renderers expect.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut cols = [0.0; 16];
        for (dst, src) in cols.iter_mut().zip(self.0.iter()) {
            *dst = *src as f32;
        }
        cols
    }

    /// Returns `true` if every element is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|e| e.is_finite())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

/// Poses of every tracked part read right after one physics step.
///
/// A snapshot is only constructed when every pose is finite, so transforms
/// composed from it never mix steps and never carry NaN into the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSnapshot {
    frame: u64,
    poses: PoseSet,
}

impl PoseSnapshot {
    /// Read all parts from `world` for `frame`.
    ///
    /// # Errors
    ///
    /// Returns the world error if a pose cannot be read, or
    /// `SimulationError::Diverged` naming the first part with a non-finite pose.
    pub fn capture<W: PhysicsWorld + ?Sized>(world: &W, frame: u64) -> Result<Self, SimulationError> {
        let mut poses = PoseSet::default();
        for part in Part::ALL {
            poses[part] = world.get_part_pose(part)?;
        }
        Self::from_poses(poses, frame)
    }

    /// Validate an already-read pose set.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::Diverged` naming the first part with a non-finite pose.
    pub fn from_poses(poses: PoseSet, frame: u64) -> Result<Self, SimulationError> {
        match poses.first_non_finite() {
            Some(part) => Err(SimulationError::Diverged { part, frame }),
            None => Ok(PoseSnapshot { frame, poses }),
        }
    }

    /// Frame this snapshot was read in.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Pose of `part`.
    pub fn pose(&self, part: Part) -> &Pose {
        self.poses.get(part)
    }

    /// Transforms of every part, in `Part::ALL` order.
    pub fn transforms(&self) -> impl Iterator<Item = (Part, Transform)> {
        self.poses.iter().map(|(part, pose)| (part, Transform::from_pose(pose)))
    }
}
