//! Persisted form of a zone.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::ids::{PlayerId, WorldId, ZoneId};
use crate::error::{FlagResult, GroupError, LoadError};
use crate::flags::FlagManager;
use crate::groups::{GroupRecord, GroupTree};
use crate::region::{BlockPos, Region};

use super::zone::Zone;

/// One zone document.
///
/// ```json
/// {
///   "id": "market",
///   "parent_id": "town",
///   "world": "overworld",
///   "min": [0, 60, 0],
///   "max": [31, 90, 31],
///   "flags": { "block_break": { "enabled": false, "key": "block_break" } },
///   "members": { "1b4e28ba-2fa1-11d2-883f-0016d3cca427": "owner" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Zone id.
    pub id: ZoneId,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parent zone id.
    #[serde(default)]
    pub parent_id: Option<ZoneId>,
    /// World of the region.
    pub world: WorldId,
    /// One corner.
    pub min: BlockPos,
    /// The opposite corner.
    pub max: BlockPos,
    /// Flag payloads by type id.
    #[serde(default)]
    pub flags: BTreeMap<String, Value>,
    /// Group name by player UUID.
    #[serde(default)]
    pub members: BTreeMap<String, String>,
    /// Custom groups. Absent means the standard groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<String, GroupRecord>>,
}

impl ZoneRecord {
    /// Capture a zone, encoding its flags with the registry's codecs.
    pub fn from_zone(zone: &Zone, flags: &FlagManager) -> FlagResult<Self> {
        let region = zone.region();
        let groups = if zone.groups() == &GroupTree::standard() {
            None
        } else {
            Some(zone.groups().to_records())
        };
        Ok(Self {
            id: zone.id().clone(),
            name: zone.explicit_name().map(str::to_string),
            parent_id: zone.parent_id().cloned(),
            world: region.world().clone(),
            min: region.min(),
            max: region.max(),
            flags: flags.encode_flags(zone.flags())?,
            members: zone
                .members()
                .map(|(player, group)| (player.0.to_string(), group.to_string()))
                .collect(),
            groups,
        })
    }

    /// Build the zone. Either every part decodes or nothing is returned.
    pub fn into_zone(self, flags: &FlagManager) -> Result<Zone, LoadError> {
        let id = self.id;
        let group_error = |source: GroupError| LoadError::Group {
            zone: id.clone(),
            source,
        };

        let groups = match &self.groups {
            Some(records) => GroupTree::from_records(records).map_err(group_error)?,
            None => GroupTree::standard(),
        };

        let mut zone = Zone::new(id.clone(), Region::new(self.world, self.min, self.max))
            .with_groups(groups);
        if let Some(name) = self.name {
            zone = zone.with_name(name);
        }
        if let Some(parent) = self.parent_id {
            zone = zone.with_parent(parent);
        }

        let decoded = flags.decode_flags(&self.flags).map_err(|source| LoadError::Flag {
            zone: id.clone(),
            source,
        })?;
        for flag in decoded {
            zone.set_flag(flag);
        }

        for (player, group) in self.members {
            let player_id = PlayerId::parse(&player).ok_or_else(|| LoadError::InvalidMember {
                zone: id.clone(),
                player: player.clone(),
            })?;
            zone.set_member(player_id, &group).map_err(group_error)?;
        }
        Ok(zone)
    }
}
