use segway_physics::Part;

use crate::transform::Transform;

/// Consumer of the per-part transforms produced every frame.
///
/// A renderer owns one drawable node per part and draws with whatever
/// transform was written last.
pub trait SceneRenderer {
    /// Replace the transform of `part`'s node.
    fn write_transform(&mut self, part: Part, transform: &Transform);
}

/// In-memory node table keeping the latest transform of every part.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    nodes: [Option<Transform>; Part::COUNT],
    writes: u64,
}

impl NodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest transform written for `part`, if any.
    pub fn transform(&self, part: Part) -> Option<&Transform> {
        self.nodes[part.index()].as_ref()
    }

    /// Total number of transform writes received.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Iterates over parts that received at least one transform.
    pub fn iter(&self) -> impl Iterator<Item = (Part, &Transform)> {
        Part::ALL
            .into_iter()
            .zip(self.nodes.iter())
            .filter_map(|(part, node)| node.as_ref().map(|t| (part, t)))
    }
}

impl SceneRenderer for NodeTable {
    fn write_transform(&mut self, part: Part, transform: &Transform) {
        self.nodes[part.index()] = Some(*transform);
        self.writes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use segway_physics::Pose;

    #[test]
    fn test_latest_write_wins() {
        let mut table = NodeTable::new();
        assert!(table.transform(Part::Base).is_none());

        let first = Transform::from_pose(&Pose::from_position(Vector3::new(1.0, 0.0, 0.0)));
        let second = Transform::from_pose(&Pose::from_position(Vector3::new(2.0, 0.0, 0.0)));
        table.write_transform(Part::Base, &first);
        table.write_transform(Part::Base, &second);

        assert_eq!(table.transform(Part::Base), Some(&second));
        assert_eq!(table.writes(), 2);
        assert_eq!(table.iter().count(), 1);
    }
}
