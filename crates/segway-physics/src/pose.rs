use core::fmt;
use core::ops::{Index, IndexMut};

use nalgebra::{UnitQuaternion, Vector3};

use crate::Part;

/// World-frame position and orientation of one part at one simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World-frame position (m).
    pub position: Vector3<f64>,
    /// World-frame orientation.
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    /// Construct a new pose.
    pub fn new(position: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Pose { position, rotation }
    }

    /// A pose at `position` with identity orientation.
    pub fn from_position(position: Vector3<f64>) -> Self {
        Pose {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Returns `true` if every position and quaternion component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite()) && self.rotation.coords.iter().all(|c| c.is_finite())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::from_position(Vector3::zeros())
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = self.rotation.quaternion();
        write!(
            f,
            "(p: [{:.3}, {:.3}, {:.3}] m, q: [{:.3}, {:.3}, {:.3}, {:.3}])",
            self.position.x, self.position.y, self.position.z, q.i, q.j, q.k, q.w
        )
    }
}

/// One pose per tracked part.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseSet([Pose; Part::COUNT]);

impl PoseSet {
    /// Construct a pose set from poses in `Part::ALL` order.
    pub const fn new(poses: [Pose; Part::COUNT]) -> Self {
        PoseSet(poses)
    }

    /// Returns the pose of `part`.
    pub fn get(&self, part: Part) -> &Pose {
        &self.0[part.index()]
    }

    /// Iterates over `(part, pose)` pairs in `Part::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Part, &Pose)> {
        Part::ALL.into_iter().zip(self.0.iter())
    }

    /// Returns the first part whose pose is not finite, if any.
    pub fn first_non_finite(&self) -> Option<Part> {
        self.iter().find(|(_, pose)| !pose.is_finite()).map(|(part, _)| part)
    }
}

impl Index<Part> for PoseSet {
    type Output = Pose;

    fn index(&self, part: Part) -> &Pose {
        &self.0[part.index()]
    }
}

impl IndexMut<Part> for PoseSet {
    fn index_mut(&mut self, part: Part) -> &mut Pose {
        &mut self.0[part.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Quaternion, Unit};

    #[test]
    fn test_pose_finiteness() {
        assert!(Pose::default().is_finite());
        assert!(!Pose::from_position(Vector3::new(0.0, f64::NAN, 0.0)).is_finite());

        let bad_rotation = Unit::new_unchecked(Quaternion::new(1.0, f64::INFINITY, 0.0, 0.0));
        assert!(!Pose::new(Vector3::zeros(), bad_rotation).is_finite());
    }

    #[test]
    fn test_pose_set_indexing() {
        let mut set = PoseSet::default();
        set[Part::LeftWheel] = Pose::from_position(Vector3::new(-0.4, 0.3, 0.0));
        assert_eq!(set.get(Part::LeftWheel).position.x, -0.4);
        assert_eq!(set[Part::Base], Pose::default());

        let parts: Vec<Part> = set.iter().map(|(part, _)| part).collect();
        assert_eq!(parts, Part::ALL.to_vec());
    }

    #[test]
    fn test_first_non_finite() {
        let mut set = PoseSet::default();
        assert_eq!(set.first_non_finite(), None);
        set[Part::RightWheel] = Pose::from_position(Vector3::new(f64::INFINITY, 0.0, 0.0));
        set[Part::Handle] = Pose::from_position(Vector3::new(0.0, f64::NAN, 0.0));
        assert_eq!(set.first_non_finite(), Some(Part::Handle));
    }
}
