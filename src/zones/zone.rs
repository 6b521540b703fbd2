//! A single zone: region, flags, membership.

use crate::core::ids::{FlagTypeId, PlayerId, ZoneId};
use crate::error::{GroupError, GroupResult};
use crate::flags::standard::ids;
use crate::flags::{Flag, FlagManager};
use crate::groups::{GroupTree, GroupView};
use crate::price::Decimal;
use crate::region::{Location, Region};

/// A named region with flags, an optional parent and a member map.
///
/// Flag and member maps are persistent (`im`) maps, so cloning a zone to
/// hand a snapshot to a reader is cheap. A zone holds at most one flag per
/// flag type.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    id: ZoneId,
    name: Option<String>,
    parent_id: Option<ZoneId>,
    region: Region,
    flags: im::HashMap<FlagTypeId, Flag>,
    members: im::HashMap<PlayerId, String>,
    groups: GroupTree,
}

impl Zone {
    /// Create a top-level zone with no flags, no members and the standard groups.
    pub fn new(id: impl Into<ZoneId>, region: Region) -> Self {
        Self {
            id: id.into(),
            name: None,
            parent_id: None,
            region,
            flags: im::HashMap::new(),
            members: im::HashMap::new(),
            groups: GroupTree::standard(),
        }
    }

    /// Set the parent zone.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<ZoneId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a flag.
    #[must_use]
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.set_flag(flag);
        self
    }

    /// Replace the group tree.
    #[must_use]
    pub fn with_groups(mut self, groups: GroupTree) -> Self {
        self.groups = groups;
        self
    }

    /// Unique id.
    #[must_use]
    pub fn id(&self) -> &ZoneId {
        &self.id
    }

    /// Display name, falling back to the id.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    /// The name set with `with_name`, if any.
    #[must_use]
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Parent zone id.
    #[must_use]
    pub fn parent_id(&self) -> Option<&ZoneId> {
        self.parent_id.as_ref()
    }

    /// The zone's bounds.
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Swap in a resized region.
    pub fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    /// True if the location is inside the zone's bounds.
    #[must_use]
    pub fn contains(&self, location: &Location) -> bool {
        self.region.contains(location)
    }

    // === Flags ===

    /// Explicit flags, in no particular order.
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.values()
    }

    /// Snapshot of the flag map.
    #[must_use]
    pub fn flag_map(&self) -> im::HashMap<FlagTypeId, Flag> {
        self.flags.clone()
    }

    /// The explicit flag of a type.
    #[must_use]
    pub fn get_flag(&self, type_id: &FlagTypeId) -> Option<&Flag> {
        self.flags.get(type_id)
    }

    /// Mutable explicit flag.
    pub fn get_flag_mut(&mut self, type_id: &FlagTypeId) -> Option<&mut Flag> {
        self.flags.get_mut(type_id)
    }

    /// Set a flag, replacing any flag of the same type.
    pub fn set_flag(&mut self, flag: Flag) -> Option<Flag> {
        self.flags.insert(flag.type_id().clone(), flag)
    }

    /// Remove the explicit flag of a type.
    pub fn remove_flag(&mut self, type_id: &FlagTypeId) -> Option<Flag> {
        self.flags.remove(type_id)
    }

    /// Check if the zone carries an explicit flag of a type.
    #[must_use]
    pub fn contains_flag(&self, type_id: &FlagTypeId) -> bool {
        self.flags.contains_key(type_id)
    }

    /// Effective enabled state of a flag type in this zone alone: the
    /// explicit flag if present, else the stored default.
    ///
    /// `None` if neither exists or the type has no enabled state.
    #[must_use]
    pub fn flag_enabled(&self, type_id: &FlagTypeId, flags: &FlagManager) -> Option<bool> {
        self.get_flag(type_id)
            .or_else(|| flags.default_flag(type_id))
            .and_then(Flag::is_enabled)
    }

    /// Money held by the zone in one currency.
    #[must_use]
    pub fn balance(&self, currency_id: &str) -> Decimal {
        self.get_flag(&FlagTypeId::new(ids::BALANCE))
            .and_then(|flag| flag.value().as_balance())
            .and_then(|balance| balance.get(currency_id).copied())
            .unwrap_or(Decimal::ZERO)
    }

    // === Membership ===

    /// The zone's groups.
    #[must_use]
    pub fn groups(&self) -> &GroupTree {
        &self.groups
    }

    /// Mutable access to the zone's groups.
    pub fn groups_mut(&mut self) -> &mut GroupTree {
        &mut self.groups
    }

    /// Members and their group names.
    pub fn members(&self) -> impl Iterator<Item = (&PlayerId, &str)> {
        self.members.iter().map(|(player, group)| (player, group.as_str()))
    }

    /// The player's group, if they are a member.
    #[must_use]
    pub fn group_of(&self, player: PlayerId) -> Option<GroupView<'_>> {
        self.members
            .get(&player)
            .and_then(|group| self.groups.get(group))
    }

    /// Put a player in a group. Returns the previous group name.
    pub fn set_member(&mut self, player: PlayerId, group: &str) -> GroupResult<Option<String>> {
        if !self.groups.contains(group) {
            return Err(GroupError::UnknownGroup(group.to_string()));
        }
        Ok(self.members.insert(player, group.to_string()))
    }

    /// Remove a player's membership.
    pub fn remove_member(&mut self, player: PlayerId) -> Option<String> {
        self.members.remove(&player)
    }
}
