//! Identifier types.
//!
//! Zones, flag types, group keys and worlds are identified by stable string
//! ids chosen by whoever registers them. Players are identified by an opaque
//! UUID handed to the engine by the host; the engine never authenticates it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new id.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the raw id.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

string_id!(
    /// Unique, immutable identifier of a zone.
    ZoneId,
    "Zone"
);

string_id!(
    /// Stable identifier of a flag type. A zone holds at most one flag per id.
    FlagTypeId,
    "FlagType"
);

string_id!(
    /// Globally unique identifier of a group key (permission atom).
    GroupKeyId,
    "GroupKey"
);

string_id!(
    /// Coordinate space identifier. Regions in different worlds never touch.
    WorldId,
    "World"
);

/// Opaque player identity supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the hyphenated textual form.
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player({})", self.0)
    }
}
