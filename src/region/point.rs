//! Block positions and world locations.

use serde::{Deserialize, Serialize};

use crate::core::ids::WorldId;

/// Integer block position. Serialized as `[x, y, z]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct BlockPos {
    /// East/west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North/south axis.
    pub z: i32,
}

impl BlockPos {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Componentwise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Componentwise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// True if every component is `<=` the matching component of `other`.
    #[must_use]
    pub const fn le_all(self, other: Self) -> bool {
        self.x <= other.x && self.y <= other.y && self.z <= other.z
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<BlockPos> for [i32; 3] {
    fn from(pos: BlockPos) -> Self {
        [pos.x, pos.y, pos.z]
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A block position in a specific world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// The coordinate space.
    pub world: WorldId,
    /// The position inside it.
    pub pos: BlockPos,
}

impl Location {
    /// Create a new location.
    pub fn new(world: impl Into<WorldId>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            pos: BlockPos::new(x, y, z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max() {
        let a = BlockPos::new(1, 9, -3);
        let b = BlockPos::new(4, 2, -8);
        assert_eq!(a.min(b), BlockPos::new(1, 2, -8));
        assert_eq!(a.max(b), BlockPos::new(4, 9, -3));
        assert!(a.min(b).le_all(a.max(b)));
    }

    #[test]
    fn test_serialized_as_array() {
        let pos = BlockPos::new(1, -2, 3);
        assert_eq!(serde_json::to_string(&pos).unwrap(), "[1,-2,3]");
        let back: BlockPos = serde_json::from_str("[1,-2,3]").unwrap();
        assert_eq!(back, pos);
    }
}
