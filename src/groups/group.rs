//! Groups: named, hierarchical sets of group keys.
//!
//! Each zone owns a `GroupTree`. A group inherits every key of its parent
//! chain. The hierarchy is kept acyclic: an edit that would close a loop is
//! rejected. The key closure of every group is memoized and recomputed for
//! the edited group and its descendants whenever own keys or a parent link
//! change, so permission checks are a single set lookup.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::core::ids::GroupKeyId;
use crate::error::{GroupError, GroupResult};

use super::key::keys;

/// Names of the groups every new zone starts with.
pub mod names {
    /// Anyone explicitly listed as a visitor.
    pub const VISITOR: &str = "visitor";
    /// Trusted players.
    pub const MEMBER: &str = "member";
    /// Zone owners.
    pub const OWNER: &str = "owner";
}

/// A named set of keys with an optional parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    name: String,
    own_keys: BTreeSet<GroupKeyId>,
    parent: Option<String>,
}

impl Group {
    /// The group's name, unique within its tree.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keys granted directly to this group.
    #[must_use]
    pub fn own_keys(&self) -> &BTreeSet<GroupKeyId> {
        &self.own_keys
    }

    /// The parent group's name.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// A group together with its memoized key closure.
#[derive(Clone, Copy, Debug)]
pub struct GroupView<'a> {
    group: &'a Group,
    all_keys: &'a FxHashSet<GroupKeyId>,
}

impl<'a> GroupView<'a> {
    /// The group's name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.group.name
    }

    /// The parent group's name.
    #[must_use]
    pub fn parent(&self) -> Option<&'a str> {
        self.group.parent.as_deref()
    }

    /// Keys granted directly to this group.
    #[must_use]
    pub fn own_keys(&self) -> &'a BTreeSet<GroupKeyId> {
        &self.group.own_keys
    }

    /// Own keys plus every key of the parent chain.
    #[must_use]
    pub fn all_keys(&self) -> &'a FxHashSet<GroupKeyId> {
        self.all_keys
    }

    /// Check if the group holds `key`, directly or inherited.
    #[must_use]
    pub fn has_key(&self, key: &GroupKeyId) -> bool {
        self.all_keys.contains(key)
    }
}

/// Persisted form of one group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Parent group name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Own keys.
    #[serde(default)]
    pub keys: BTreeSet<GroupKeyId>,
}

/// An acyclic group hierarchy with memoized key closures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupTree {
    groups: BTreeMap<String, Group>,
    closures: FxHashMap<String, FxHashSet<GroupKeyId>>,
}

impl GroupTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tree new zones start with: `visitor` <- `member` <- `owner`.
    #[must_use]
    pub fn standard() -> Self {
        let mut tree = Self::new();
        let layout: [(&str, Option<&str>, &[&str]); 3] = [
            (names::VISITOR, None, &[keys::ENTER_REGION][..]),
            (
                names::MEMBER,
                Some(names::VISITOR),
                &[
                    keys::BLOCK_BREAK,
                    keys::BLOCK_PLACE,
                    keys::INTERACT_DOOR,
                    keys::INTERACT_ITEM_FRAME,
                ][..],
            ),
            (names::OWNER, Some(names::MEMBER), &[keys::OWNER][..]),
        ];
        for (name, parent, own) in layout {
            tree.groups.insert(
                name.to_string(),
                Group {
                    name: name.to_string(),
                    own_keys: own.iter().map(|k| GroupKeyId::new(*k)).collect(),
                    parent: parent.map(str::to_string),
                },
            );
            tree.refresh(name);
        }
        tree
    }

    /// Build a tree from persisted groups. Parents may appear in any order.
    pub fn from_records(records: &BTreeMap<String, GroupRecord>) -> GroupResult<Self> {
        let mut tree = Self::new();
        let mut pending: Vec<(&String, &GroupRecord)> = records.iter().collect();
        let mut progress = true;

        while progress && !pending.is_empty() {
            progress = false;
            let mut waiting = Vec::new();
            for (name, record) in pending {
                let ready = record.parent.as_ref().map_or(true, |p| tree.contains(p));
                if ready {
                    tree.add_group(name.clone(), record.parent.as_deref())?;
                    for key in &record.keys {
                        tree.add_key(name, key.clone())?;
                    }
                    progress = true;
                } else {
                    waiting.push((name, record));
                }
            }
            pending = waiting;
        }

        if let Some((name, _)) = pending.first() {
            return Err(Self::blocked_by(records, name));
        }
        Ok(tree)
    }

    /// Why `start` could not be placed: its parent chain either reaches a
    /// group that does not exist or loops back on itself.
    fn blocked_by(records: &BTreeMap<String, GroupRecord>, start: &str) -> GroupError {
        let mut seen = BTreeSet::new();
        let mut current = start;
        loop {
            seen.insert(current);
            let Some(parent) = records.get(current).and_then(|r| r.parent.as_deref()) else {
                return GroupError::UnknownGroup(current.to_string());
            };
            if !records.contains_key(parent) {
                return GroupError::UnknownGroup(parent.to_string());
            }
            if seen.contains(parent) {
                return GroupError::CyclicGroupHierarchy {
                    group: current.to_string(),
                    parent: parent.to_string(),
                };
            }
            current = parent;
        }
    }

    /// Persisted form of every group.
    #[must_use]
    pub fn to_records(&self) -> BTreeMap<String, GroupRecord> {
        self.groups
            .iter()
            .map(|(name, group)| {
                (
                    name.clone(),
                    GroupRecord {
                        parent: group.parent.clone(),
                        keys: group.own_keys.clone(),
                    },
                )
            })
            .collect()
    }

    /// Add an empty group under `parent`.
    pub fn add_group(&mut self, name: impl Into<String>, parent: Option<&str>) -> GroupResult<()> {
        let name = name.into();
        if self.groups.contains_key(&name) {
            return Err(GroupError::DuplicateGroup(name));
        }
        if let Some(parent) = parent {
            if !self.groups.contains_key(parent) {
                return Err(GroupError::UnknownGroup(parent.to_string()));
            }
        }
        self.groups.insert(
            name.clone(),
            Group {
                name: name.clone(),
                own_keys: BTreeSet::new(),
                parent: parent.map(str::to_string),
            },
        );
        self.refresh(&name);
        Ok(())
    }

    /// Re-link `name` under `parent` (or make it a root).
    ///
    /// Rejected with `CyclicGroupHierarchy` if `parent` is `name` itself or
    /// one of its descendants.
    pub fn set_parent(&mut self, name: &str, parent: Option<&str>) -> GroupResult<()> {
        if !self.groups.contains_key(name) {
            return Err(GroupError::UnknownGroup(name.to_string()));
        }
        if let Some(parent) = parent {
            if !self.groups.contains_key(parent) {
                return Err(GroupError::UnknownGroup(parent.to_string()));
            }
            if self.lineage(parent).any(|ancestor| ancestor == name) {
                return Err(GroupError::CyclicGroupHierarchy {
                    group: name.to_string(),
                    parent: parent.to_string(),
                });
            }
        }
        if let Some(group) = self.groups.get_mut(name) {
            group.parent = parent.map(str::to_string);
        }
        self.refresh(name);
        Ok(())
    }

    /// Grant `key` to `name`. Returns false if it already held it directly.
    pub fn add_key(&mut self, name: &str, key: GroupKeyId) -> GroupResult<bool> {
        let group = self
            .groups
            .get_mut(name)
            .ok_or_else(|| GroupError::UnknownGroup(name.to_string()))?;
        let added = group.own_keys.insert(key);
        if added {
            self.refresh(name);
        }
        Ok(added)
    }

    /// Revoke a directly held key. Inherited keys are unaffected.
    pub fn remove_key(&mut self, name: &str, key: &GroupKeyId) -> GroupResult<bool> {
        let group = self
            .groups
            .get_mut(name)
            .ok_or_else(|| GroupError::UnknownGroup(name.to_string()))?;
        let removed = group.own_keys.remove(key);
        if removed {
            self.refresh(name);
        }
        Ok(removed)
    }

    /// Look up a group with its key closure.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<GroupView<'_>> {
        let group = self.groups.get(name)?;
        let all_keys = self.closures.get(name)?;
        Some(GroupView { group, all_keys })
    }

    /// Own keys plus every inherited key of `name`.
    #[must_use]
    pub fn all_keys(&self, name: &str) -> Option<&FxHashSet<GroupKeyId>> {
        self.closures.get(name)
    }

    /// Check if a group exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if the tree has no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over groups in name order.
    pub fn iter(&self) -> impl Iterator<Item = GroupView<'_>> {
        self.groups.keys().filter_map(|name| self.get(name))
    }

    /// `name` followed by each of its ancestors, nearest first.
    pub fn lineage<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut next = self.groups.get(name).map(|g| g.name.as_str());
        // The hierarchy is acyclic, but bound the walk by the group count anyway.
        let mut budget = self.groups.len();
        std::iter::from_fn(move || {
            let current = next?;
            if budget == 0 {
                return None;
            }
            budget -= 1;
            next = self.groups.get(current).and_then(|g| g.parent.as_deref());
            Some(current)
        })
    }

    /// Recompute the closure of `name` and every descendant, parents first.
    fn refresh(&mut self, name: &str) {
        let mut work = vec![name.to_string()];
        while let Some(current) = work.pop() {
            let Some(group) = self.groups.get(&current) else {
                continue;
            };
            let mut closure: FxHashSet<GroupKeyId> = group.own_keys.iter().cloned().collect();
            if let Some(inherited) = group.parent.as_ref().and_then(|p| self.closures.get(p)) {
                closure.extend(inherited.iter().cloned());
            }
            self.closures.insert(current.clone(), closure);
            work.extend(
                self.groups
                    .values()
                    .filter(|g| g.parent.as_deref() == Some(current.as_str()))
                    .map(|g| g.name.clone()),
            );
        }
    }
}
