//! Flag instances and their capabilities.
//!
//! A flag may additionally be `Enabled` (tri-state on/off override) and/or
//! `GroupKeyed` (a group key lets players bypass it). Capabilities are
//! queried at runtime with `as_enabled` / `as_group_keyed` rather than
//! fixed by the type of the flag.

use bitflags::bitflags;

use crate::core::ids::{FlagTypeId, GroupKeyId, PlayerId};
use crate::groups::GroupView;
use crate::zones::Zone;

use super::value::FlagValue;

bitflags! {
    /// Capabilities a flag type or flag instance satisfies.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Carries an on/off override.
        const ENABLED = 1 << 0;
        /// Names a group key that bypasses it.
        const GROUP_KEYED = 1 << 1;
        /// Has a persisted codec.
        const SERIALIZABLE = 1 << 2;
    }
}

/// Tri-state enabled capability: default, explicitly on, explicitly off.
pub trait Enabled {
    /// The explicit override, if any.
    fn enabled_override(&self) -> Option<bool>;

    /// The value used when there is no override.
    fn default_enabled(&self) -> bool;

    /// Set or clear the explicit override.
    fn set_enabled(&mut self, enabled: Option<bool>);

    /// The effective state.
    fn is_enabled(&self) -> bool {
        self.enabled_override().unwrap_or_else(|| self.default_enabled())
    }
}

/// Bypass-by-key capability.
pub trait GroupKeyed {
    /// The key a group must hold to bypass the flag.
    fn required_key(&self) -> &GroupKeyId;

    /// True iff the group holds the required key, directly or inherited.
    fn has_group_permission(&self, group: &GroupView<'_>) -> bool {
        group.has_key(self.required_key())
    }

    /// True iff the player's group in `zone` holds the required key.
    /// A player with no membership is denied.
    fn has_permission(&self, zone: &Zone, player: PlayerId) -> bool {
        zone.group_of(player)
            .is_some_and(|group| self.has_group_permission(&group))
    }
}

/// Enabled state stored on a flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnabledState {
    explicit: Option<bool>,
    default: bool,
}

impl EnabledState {
    /// State with no override.
    #[must_use]
    pub const fn new(default: bool) -> Self {
        Self {
            explicit: None,
            default,
        }
    }
}

impl Enabled for EnabledState {
    fn enabled_override(&self) -> Option<bool> {
        self.explicit
    }

    fn default_enabled(&self) -> bool {
        self.default
    }

    fn set_enabled(&mut self, enabled: Option<bool>) {
        self.explicit = enabled;
    }
}

/// Required key stored on a flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredKey(pub GroupKeyId);

impl GroupKeyed for RequiredKey {
    fn required_key(&self) -> &GroupKeyId {
        &self.0
    }
}

/// An instance of a flag type attached to a zone or held as a default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flag {
    type_id: FlagTypeId,
    value: FlagValue,
    enabled: Option<EnabledState>,
    required_key: Option<RequiredKey>,
}

impl Flag {
    /// Create a flag with a value and no capabilities.
    pub fn new(type_id: impl Into<FlagTypeId>, value: FlagValue) -> Self {
        Self {
            type_id: type_id.into(),
            value,
            enabled: None,
            required_key: None,
        }
    }

    /// Add the enabled capability with the given default.
    #[must_use]
    pub fn with_enabled(mut self, default: bool) -> Self {
        self.enabled = Some(EnabledState::new(default));
        self
    }

    /// Add the group-keyed capability.
    #[must_use]
    pub fn with_required_key(mut self, key: impl Into<GroupKeyId>) -> Self {
        self.required_key = Some(RequiredKey(key.into()));
        self
    }

    /// The flag's type.
    #[must_use]
    pub fn type_id(&self) -> &FlagTypeId {
        &self.type_id
    }

    /// The payload.
    #[must_use]
    pub fn value(&self) -> &FlagValue {
        &self.value
    }

    /// Mutable payload.
    pub fn value_mut(&mut self) -> &mut FlagValue {
        &mut self.value
    }

    /// Replace the payload.
    pub fn set_value(&mut self, value: FlagValue) {
        self.value = value;
    }

    /// The enabled capability, if this flag has it.
    #[must_use]
    pub fn as_enabled(&self) -> Option<&dyn Enabled> {
        self.enabled.as_ref().map(|e| e as &dyn Enabled)
    }

    /// Mutable enabled capability.
    pub fn as_enabled_mut(&mut self) -> Option<&mut dyn Enabled> {
        self.enabled.as_mut().map(|e| e as &mut dyn Enabled)
    }

    /// The group-keyed capability, if this flag has it.
    #[must_use]
    pub fn as_group_keyed(&self) -> Option<&dyn GroupKeyed> {
        self.required_key.as_ref().map(|k| k as &dyn GroupKeyed)
    }

    /// Capabilities held by this instance.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::empty();
        caps.set(Capabilities::ENABLED, self.enabled.is_some());
        caps.set(Capabilities::GROUP_KEYED, self.required_key.is_some());
        caps
    }

    /// Effective enabled state, if the flag has that capability.
    #[must_use]
    pub fn is_enabled(&self) -> Option<bool> {
        self.as_enabled().map(|e| e.is_enabled())
    }
}
