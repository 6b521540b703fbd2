//! Group keys and group hierarchies.
//!
//! A `GroupKey` is a permission atom. A `Group` bundles keys and inherits
//! the keys of its parent chain. Each zone carries its own `GroupTree` and
//! maps players to one group in it.

pub mod group;
pub mod key;

pub use group::{names, Group, GroupRecord, GroupTree, GroupView};
pub use key::{keys, GroupKey, GroupKeyManager, STANDARD_KEYS};
