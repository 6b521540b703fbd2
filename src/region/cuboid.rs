//! Axis-aligned cuboid regions.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::core::ids::WorldId;

use super::extent::RegionSet;
use super::point::{BlockPos, Location};

/// An axis-aligned cuboid of blocks in one world, bounds inclusive.
///
/// Invariant: `min <= max` componentwise. Constructors sort the corners,
/// so any two opposite corners are accepted. A region is immutable;
/// resizing produces a new value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RegionRepr")]
pub struct Region {
    world: WorldId,
    min: BlockPos,
    max: BlockPos,
}

#[derive(Deserialize)]
struct RegionRepr {
    world: WorldId,
    min: BlockPos,
    max: BlockPos,
}

impl From<RegionRepr> for Region {
    fn from(repr: RegionRepr) -> Self {
        Self::new(repr.world, repr.min, repr.max)
    }
}

impl Region {
    /// Create a region from two opposite corners.
    pub fn new(world: impl Into<WorldId>, a: BlockPos, b: BlockPos) -> Self {
        Self {
            world: world.into(),
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Corners must already satisfy `min <= max`.
    fn from_sorted(world: &WorldId, min: BlockPos, max: BlockPos) -> Self {
        debug_assert!(min.le_all(max));
        Self {
            world: world.clone(),
            min,
            max,
        }
    }

    /// The world this region lives in.
    #[must_use]
    pub fn world(&self) -> &WorldId {
        &self.world
    }

    /// Lowest corner.
    #[must_use]
    pub const fn min(&self) -> BlockPos {
        self.min
    }

    /// Highest corner.
    #[must_use]
    pub const fn max(&self) -> BlockPos {
        self.max
    }

    /// True if the location is in this world and inside the bounds.
    #[must_use]
    pub fn contains(&self, location: &Location) -> bool {
        location.world == self.world && self.contains_pos(location.pos)
    }

    /// True if the position is inside the bounds, ignoring the world.
    #[must_use]
    pub const fn contains_pos(&self, pos: BlockPos) -> bool {
        self.min.le_all(pos) && pos.le_all(self.max)
    }

    /// True if both regions share at least one block.
    #[must_use]
    pub fn overlaps(&self, other: &Region) -> bool {
        self.world == other.world && self.min.le_all(other.max) && other.min.le_all(self.max)
    }

    /// True if `other` lies entirely inside this region.
    #[must_use]
    pub fn encloses(&self, other: &Region) -> bool {
        self.world == other.world && self.min.le_all(other.min) && other.max.le_all(self.max)
    }

    /// The shared part of two regions, if any.
    #[must_use]
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Self::from_sorted(
            &self.world,
            self.min.max(other.min),
            self.max.min(other.max),
        ))
    }

    /// A new region in the same world with different corners.
    #[must_use]
    pub fn resized(&self, a: BlockPos, b: BlockPos) -> Region {
        Self::new(self.world.clone(), a, b)
    }

    /// Number of blocks covered, saturating at `u64::MAX`.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1) as u64;
        span(self.min.x, self.max.x)
            .saturating_mul(span(self.min.y, self.max.y))
            .saturating_mul(span(self.min.z, self.max.z))
    }

    /// This region minus `other`, as at most six disjoint cuboids.
    ///
    /// Slabs are cut along x first, then y, then z, so pieces never overlap.
    #[must_use]
    pub fn subtract(&self, other: &Region) -> SmallVec<[Region; 6]> {
        let Some(cut) = self.intersection(other) else {
            return smallvec![self.clone()];
        };
        let (a, i) = (self, &cut);
        let mut pieces = SmallVec::new();

        if a.min.x < i.min.x {
            pieces.push(Self::from_sorted(
                &a.world,
                a.min,
                BlockPos::new(i.min.x - 1, a.max.y, a.max.z),
            ));
        }
        if i.max.x < a.max.x {
            pieces.push(Self::from_sorted(
                &a.world,
                BlockPos::new(i.max.x + 1, a.min.y, a.min.z),
                a.max,
            ));
        }
        if a.min.y < i.min.y {
            pieces.push(Self::from_sorted(
                &a.world,
                BlockPos::new(i.min.x, a.min.y, a.min.z),
                BlockPos::new(i.max.x, i.min.y - 1, a.max.z),
            ));
        }
        if i.max.y < a.max.y {
            pieces.push(Self::from_sorted(
                &a.world,
                BlockPos::new(i.min.x, i.max.y + 1, a.min.z),
                BlockPos::new(i.max.x, a.max.y, a.max.z),
            ));
        }
        if a.min.z < i.min.z {
            pieces.push(Self::from_sorted(
                &a.world,
                BlockPos::new(i.min.x, i.min.y, a.min.z),
                BlockPos::new(i.max.x, i.max.y, i.min.z - 1),
            ));
        }
        if i.max.z < a.max.z {
            pieces.push(Self::from_sorted(
                &a.world,
                BlockPos::new(i.min.x, i.min.y, i.max.z + 1),
                BlockPos::new(i.max.x, i.max.y, a.max.z),
            ));
        }
        pieces
    }

    /// The part of this region not covered by any of `children`.
    ///
    /// Children in other worlds are ignored.
    pub fn true_extent<'a>(&self, children: impl IntoIterator<Item = &'a Region>) -> RegionSet {
        let mut pieces: SmallVec<[Region; 6]> = smallvec![self.clone()];
        for child in children {
            if child.world != self.world {
                continue;
            }
            pieces = pieces.iter().flat_map(|piece| piece.subtract(child)).collect();
            if pieces.is_empty() {
                break;
            }
        }
        RegionSet::from_pieces(self.world.clone(), pieces)
    }

    /// True if the location is inside this region but inside none of
    /// `children`. Points covered by a child defer to the child.
    pub fn is_outside_children<'a>(
        &self,
        location: &Location,
        children: impl IntoIterator<Item = &'a Region>,
    ) -> bool {
        self.contains(location) && !children.into_iter().any(|child| child.contains(location))
    }

    /// Blocks on the x/z perimeter of this region at height `y`, each once.
    ///
    /// Lazy, so callers can stop early on very large regions.
    pub fn outline_at(&self, y: i32) -> impl Iterator<Item = BlockPos> {
        let (min, max) = (self.min, self.max);
        let far_z = (max.z != min.z).then_some(max.z);
        let far_x = (max.x != min.x).then_some(max.x);
        let rows = (min.x..=max.x).flat_map(move |x| {
            std::iter::once(min.z)
                .chain(far_z)
                .map(move |z| BlockPos::new(x, y, z))
        });
        let sides = (min.z.saturating_add(1)..max.z).flat_map(move |z| {
            std::iter::once(min.x)
                .chain(far_x)
                .map(move |x| BlockPos::new(x, y, z))
        });
        rows.chain(sides)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.world, self.min, self.max)
    }
}
