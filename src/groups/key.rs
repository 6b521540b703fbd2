//! Group keys: permission atoms.
//!
//! A group key grants one capability inside a zone (breaking blocks,
//! opening doors, ...). Flags that can be overridden name the key a player's
//! group must hold to bypass them. Keys are globally unique by id.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::ids::GroupKeyId;
use crate::error::{GroupError, GroupResult};

/// Ids of the built-in group keys.
pub mod keys {
    /// Full control over the zone.
    pub const OWNER: &str = "owner";
    /// Break blocks.
    pub const BLOCK_BREAK: &str = "block_break";
    /// Place blocks.
    pub const BLOCK_PLACE: &str = "block_place";
    /// Enter the zone when entry is restricted.
    pub const ENTER_REGION: &str = "enter_region";
    /// Open and close doors.
    pub const INTERACT_DOOR: &str = "interact_door";
    /// Use item frames.
    pub const INTERACT_ITEM_FRAME: &str = "interact_item_frame";
}

/// The built-in keys, registered by `GroupKeyManager::standard`.
pub const STANDARD_KEYS: &[(&str, &str)] = &[
    (keys::OWNER, "Owner"),
    (keys::BLOCK_BREAK, "Block Break"),
    (keys::BLOCK_PLACE, "Block Place"),
    (keys::ENTER_REGION, "Enter Region"),
    (keys::INTERACT_DOOR, "Interact Door"),
    (keys::INTERACT_ITEM_FRAME, "Interact Item Frame"),
];

/// A permission atom.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Unique id.
    pub id: GroupKeyId,
    /// Human-readable label.
    pub name: String,
}

impl GroupKey {
    /// Create a new key.
    pub fn new(id: impl Into<GroupKeyId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Registry of known group keys.
#[derive(Clone, Debug, Default)]
pub struct GroupKeyManager {
    keys: FxHashMap<GroupKeyId, GroupKey>,
    order: Vec<GroupKeyId>,
}

impl GroupKeyManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager holding the built-in keys.
    #[must_use]
    pub fn standard() -> Self {
        let mut manager = Self::new();
        for (id, name) in STANDARD_KEYS {
            manager.keys.insert(GroupKeyId::new(*id), GroupKey::new(*id, *name));
            manager.order.push(GroupKeyId::new(*id));
        }
        manager
    }

    /// Register a key. Fails if the id is taken.
    pub fn register(&mut self, key: GroupKey) -> GroupResult<()> {
        if self.keys.contains_key(&key.id) {
            return Err(GroupError::DuplicateKey(key.id));
        }
        self.order.push(key.id.clone());
        self.keys.insert(key.id.clone(), key);
        Ok(())
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, id: &GroupKeyId) -> Option<&GroupKey> {
        self.keys.get(id)
    }

    /// Check if a key is registered.
    #[must_use]
    pub fn contains(&self, id: &GroupKeyId) -> bool {
        self.keys.contains_key(id)
    }

    /// Number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over keys in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &GroupKey> {
        self.order.iter().filter_map(|id| self.keys.get(id))
    }
}
