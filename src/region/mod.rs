//! Region geometry.
//!
//! Regions are axis-aligned cuboids of blocks, bounds inclusive, tagged with
//! the world they belong to. Nested zones use `Region::true_extent` to find
//! the part of a parent not covered by its children; a point inside a child
//! defers to the child.
//!
//! ## Key Types
//!
//! - `BlockPos`: integer block position
//! - `Location`: a `BlockPos` in a named world
//! - `Region`: immutable cuboid with containment and overlap queries
//! - `RegionSet`: disjoint union of cuboids (result of area subtraction)

pub mod cuboid;
pub mod extent;
pub mod point;

pub use cuboid::Region;
pub use extent::RegionSet;
pub use point::{BlockPos, Location};
