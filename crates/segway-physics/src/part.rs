use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid body of the vehicle tracked by the simulation.
///
/// The set is closed and known at compile time; the discriminant doubles as
/// the index into per-part tables.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum Part {
    /// Chassis carrying the wheel axles.
    Base = 0,
    /// Upright handle bar, rigidly attached to the base.
    Handle = 1,
    /// Left drive wheel.
    LeftWheel = 2,
    /// Right drive wheel.
    RightWheel = 3,
}

impl Part {
    /// Number of tracked parts.
    pub const COUNT: usize = 4;

    /// Every tracked part, in index order.
    pub const ALL: [Part; Part::COUNT] = [Part::Base, Part::Handle, Part::LeftWheel, Part::RightWheel];

    /// Index of this part in per-part tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name, matching the configuration spelling.
    pub const fn name(self) -> &'static str {
        match self {
            Part::Base => "base",
            Part::Handle => "handle",
            Part::LeftWheel => "left_wheel",
            Part::RightWheel => "right_wheel",
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_all() {
        for (i, part) in Part::ALL.iter().enumerate() {
            assert_eq!(part.index(), i);
        }
        assert_eq!(Part::ALL.len(), Part::COUNT);
    }

    #[test]
    fn test_names() {
        assert_eq!(Part::Handle.to_string(), "handle");
        assert_eq!(Part::RightWheel.name(), "right_wheel");
    }
}
