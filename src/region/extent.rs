//! Sets of disjoint cuboids.

use smallvec::SmallVec;

use crate::core::ids::WorldId;

use super::cuboid::Region;
use super::point::{BlockPos, Location};

/// A union of pairwise-disjoint cuboids in one world.
///
/// Produced by `Region::true_extent`: the part of a parent region that no
/// child covers. May be empty when the children cover the parent entirely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSet {
    world: WorldId,
    pieces: SmallVec<[Region; 6]>,
}

impl RegionSet {
    pub(crate) fn from_pieces(world: WorldId, pieces: SmallVec<[Region; 6]>) -> Self {
        Self { world, pieces }
    }

    /// The world all pieces live in.
    #[must_use]
    pub fn world(&self) -> &WorldId {
        &self.world
    }

    /// The disjoint pieces.
    #[must_use]
    pub fn pieces(&self) -> &[Region] {
        &self.pieces
    }

    /// Number of pieces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// True if the set covers no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Total number of blocks covered.
    #[must_use]
    pub fn volume(&self) -> u64 {
        self.pieces.iter().map(Region::volume).sum()
    }

    /// True if any piece contains the location.
    #[must_use]
    pub fn contains(&self, location: &Location) -> bool {
        location.world == self.world && self.contains_pos(location.pos)
    }

    /// True if any piece contains the position, ignoring the world.
    #[must_use]
    pub fn contains_pos(&self, pos: BlockPos) -> bool {
        self.pieces.iter().any(|piece| piece.contains_pos(pos))
    }

    /// Iterate over the pieces.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.pieces.iter()
    }

    /// Blocks at height `y` that lie in the set and touch, on the x/z plane,
    /// a block outside it.
    ///
    /// Only pieces spanning `y` contribute. Seams between adjacent pieces are
    /// not part of the outline, and since pieces are disjoint every block is
    /// yielded once. The iterator is lazy.
    pub fn outline_at(&self, y: i32) -> impl Iterator<Item = BlockPos> + '_ {
        self.pieces
            .iter()
            .filter(move |piece| piece.min().y <= y && y <= piece.max().y)
            .flat_map(move |piece| piece.outline_at(y))
            .filter(move |pos| self.on_edge(*pos))
    }

    fn on_edge(&self, pos: BlockPos) -> bool {
        const SIDES: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        SIDES.iter().any(|&(dx, dz)| {
            match (pos.x.checked_add(dx), pos.z.checked_add(dz)) {
                (Some(x), Some(z)) => !self.contains_pos(BlockPos::new(x, pos.y, z)),
                _ => true,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(a: [i32; 3], b: [i32; 3]) -> Region {
        Region::new("w", a.into(), b.into())
    }

    #[test]
    fn test_no_children_is_whole_region() {
        let parent = region([0, 0, 0], [10, 10, 10]);
        let extent = parent.true_extent([]);
        assert_eq!(extent.pieces(), &[parent.clone()]);
        assert_eq!(extent.volume(), parent.volume());
    }

    #[test]
    fn test_child_is_carved_out() {
        let parent = region([0, 0, 0], [10, 10, 10]);
        let child = region([2, 2, 2], [4, 4, 4]);
        let extent = parent.true_extent([&child]);

        assert!(!extent.contains(&Location::new("w", 3, 3, 3)));
        assert!(extent.contains(&Location::new("w", 5, 3, 3)));
        assert!(extent.contains(&Location::new("w", 0, 0, 0)));
        assert!(!extent.contains(&Location::new("x", 0, 0, 0)));
        assert_eq!(extent.volume(), parent.volume() - child.volume());
    }

    #[test]
    fn test_overlapping_children() {
        let parent = region([0, 0, 0], [9, 0, 0]);
        let a = region([0, 0, 0], [4, 0, 0]);
        let b = region([3, 0, 0], [6, 0, 0]);
        let extent = parent.true_extent([&a, &b]);
        assert_eq!(extent.volume(), 3);
        assert_eq!(extent.pieces(), &[region([7, 0, 0], [9, 0, 0])]);
    }

    #[test]
    fn test_children_in_other_worlds_ignored() {
        let parent = region([0, 0, 0], [3, 3, 3]);
        let elsewhere = Region::new("nether", BlockPos::new(0, 0, 0), BlockPos::new(3, 3, 3));
        assert_eq!(parent.true_extent([&elsewhere]).volume(), parent.volume());
    }

    #[test]
    fn test_outline_skips_child_and_seams() {
        let parent = region([0, 0, 0], [10, 10, 10]);
        let child = region([2, 2, 2], [4, 4, 4]);
        let extent = parent.true_extent([&child]);

        let outline: Vec<_> = extent.outline_at(3).collect();
        let unique: std::collections::BTreeSet<_> =
            outline.iter().map(|p| (p.x, p.y, p.z)).collect();
        assert_eq!(unique.len(), outline.len());
        assert!(outline.iter().all(|p| p.y == 3 && !child.contains_pos(*p)));
        // outer ring of 40 plus the 12 blocks facing the hole
        assert_eq!(outline.len(), 52);
        assert!(outline.contains(&BlockPos::new(1, 3, 3)));
        assert!(!outline.contains(&BlockPos::new(6, 3, 6)));

        // above the child the layer is a plain square
        assert_eq!(extent.outline_at(8).count(), 40);
        assert_eq!(extent.outline_at(11).count(), 0);
    }

    #[test]
    fn test_fully_covered() {
        let parent = region([0, 0, 0], [3, 3, 3]);
        let cover = region([-1, -1, -1], [5, 5, 5]);
        assert!(parent.true_extent([&cover]).is_empty());
    }
}
