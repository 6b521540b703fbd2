//! Zone registry: loading, registration, lookup and reload.
//!
//! The `ZoneManager` owns every live zone. It keeps two indexes next to the
//! zones themselves:
//! - parent -> children links, so true extents and removals are cheap
//! - zone -> record key, so saves go back where the zone was loaded from
//!
//! All mutation happens on the host's single control thread.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use crate::core::config::DEFAULT_NAMESPACE;
use crate::core::ids::{FlagTypeId, ZoneId};
use crate::core::report::BatchReport;
use crate::error::{LoadError, PersistError, RegisterError, ReloadError, SaveError};
use crate::flags::{Flag, FlagManager};
use crate::region::{Location, RegionSet};
use crate::store::{is_valid_name, MemoryStore, RecordKey, RecordStore};

use super::record::ZoneRecord;
use super::zone::Zone;

/// Where a resolved flag came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagSource {
    /// An explicit flag on this zone.
    Zone(ZoneId),
    /// The defaults registry.
    Default,
}

/// Result of a flag lookup through the precedence chain.
#[derive(Clone, Debug)]
pub struct ResolvedFlag<'a> {
    /// The effective flag.
    pub flag: &'a Flag,
    /// Whether it was explicit on a zone or a default.
    pub source: FlagSource,
}

impl<'a> ResolvedFlag<'a> {
    fn from_default(flag: &'a Flag) -> Self {
        Self {
            flag,
            source: FlagSource::Default,
        }
    }
}

/// Outcome of `ZoneManager::zones_reload`.
#[derive(Debug, Default)]
pub struct ReloadReport {
    /// Per-record results.
    pub batch: BatchReport<ReloadError>,
    /// Zones dropped because their record vanished or their parent did.
    pub removed: Vec<ZoneId>,
}

impl ReloadReport {
    /// True if every record loaded and registered.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.batch.is_clean()
    }
}

/// Registry of live zones.
///
/// ## Usage
///
/// ```
/// use zone_protect::region::{BlockPos, Location, Region};
/// use zone_protect::zones::{Zone, ZoneManager};
///
/// let mut zones = ZoneManager::in_memory();
/// let town = Region::new("overworld", BlockPos::new(0, 0, 0), BlockPos::new(100, 255, 100));
/// let market = town.resized(BlockPos::new(10, 0, 10), BlockPos::new(20, 255, 20));
///
/// zones.register(Zone::new("town", town)).unwrap();
/// zones.register(Zone::new("market", market).with_parent("town")).unwrap();
///
/// let here = Location::new("overworld", 15, 64, 15);
/// assert_eq!(zones.innermost_zone_at(&here).unwrap().id().as_str(), "market");
/// ```
#[derive(Debug)]
pub struct ZoneManager {
    zones: FxHashMap<ZoneId, Zone>,
    children: FxHashMap<ZoneId, Vec<ZoneId>>,
    origins: FxHashMap<ZoneId, RecordKey>,
    store: Box<dyn RecordStore>,
    namespace: String,
}

impl ZoneManager {
    /// Create an empty registry backed by `store`. New zones are saved
    /// under `namespace`.
    pub fn new(store: Box<dyn RecordStore>, namespace: impl Into<String>) -> Self {
        Self {
            zones: FxHashMap::default(),
            children: FxHashMap::default(),
            origins: FxHashMap::default(),
            store,
            namespace: namespace.into(),
        }
    }

    /// An empty registry with an in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()), DEFAULT_NAMESPACE)
    }

    // === Loading ===

    /// Decode one zone document. Nothing is registered.
    pub fn parse(text: &str, origin: &str, flags: &FlagManager) -> Result<Zone, LoadError> {
        let record: ZoneRecord =
            serde_json::from_str(text).map_err(|source| LoadError::Malformed {
                origin: origin.to_string(),
                source,
            })?;
        record.into_zone(flags)
    }

    /// Read and decode one stored record. Nothing is registered.
    pub fn load(&self, key: &RecordKey, flags: &FlagManager) -> Result<Zone, LoadError> {
        let text = self.store.read(key)?;
        Self::parse(&text, &key.to_string(), flags)
    }

    // === Registration ===

    /// Add a zone. Fails if the id is taken, cannot name a record, or the
    /// parent is not registered; the registry is unchanged on failure.
    pub fn register(&mut self, zone: Zone) -> Result<(), RegisterError> {
        let key = RecordKey::new(self.namespace.clone(), zone.id().as_str());
        self.register_from(zone, key)
    }

    fn register_from(&mut self, zone: Zone, key: RecordKey) -> Result<(), RegisterError> {
        let id = zone.id().clone();
        if !is_valid_name(id.as_str()) {
            return Err(RegisterError::InvalidId(id));
        }
        if self.zones.contains_key(&id) {
            return Err(RegisterError::DuplicateId(id));
        }
        if let Some(parent) = zone.parent_id() {
            if !self.zones.contains_key(parent) {
                return Err(RegisterError::DanglingParent {
                    id,
                    parent: parent.clone(),
                });
            }
            let siblings = self.children.entry(parent.clone()).or_default();
            siblings.push(id.clone());
            siblings.sort();
        }
        debug!(zone = %id, "registered zone");
        self.origins.entry(id.clone()).or_insert(key);
        self.zones.insert(id, zone);
        Ok(())
    }

    /// Remove a zone from the registry. Refused while it has children.
    /// The persisted record is left alone.
    pub fn unregister(&mut self, id: &ZoneId) -> Result<Zone, RegisterError> {
        if !self.zones.contains_key(id) {
            return Err(RegisterError::UnknownZone(id.clone()));
        }
        let children = self.children_of(id).len();
        if children > 0 {
            return Err(RegisterError::HasChildren {
                id: id.clone(),
                children,
            });
        }
        let zone = self
            .zones
            .remove(id)
            .ok_or_else(|| RegisterError::UnknownZone(id.clone()))?;
        if let Some(parent) = zone.parent_id() {
            if let Some(siblings) = self.children.get_mut(parent) {
                siblings.retain(|child| child != id);
            }
        }
        self.children.remove(id);
        debug!(zone = %id, "unregistered zone");
        Ok(zone)
    }

    // === Persistence ===

    /// Record key a zone is saved under.
    #[must_use]
    pub fn record_key(&self, id: &ZoneId) -> RecordKey {
        self.origins
            .get(id)
            .cloned()
            .unwrap_or_else(|| RecordKey::new(self.namespace.clone(), id.as_str()))
    }

    /// Write a registered zone's record.
    pub fn save(&mut self, id: &ZoneId, flags: &FlagManager) -> Result<(), SaveError> {
        let zone = self
            .zones
            .get(id)
            .ok_or_else(|| RegisterError::UnknownZone(id.clone()))?;
        let record = ZoneRecord::from_zone(zone, flags)?;
        let key = self.record_key(id);
        let text = serde_json::to_string_pretty(&record).map_err(|source| PersistError::Encoding {
            path: key.to_string(),
            source,
        })?;
        if let Err(err) = self.store.write(&key, &text) {
            warn!(zone = %id, error = %err, "failed to save zone");
            return Err(err.into());
        }
        debug!(zone = %id, record = %key, "saved zone");
        Ok(())
    }

    /// Unregister a zone and delete its record.
    ///
    /// The zone stays unregistered even if the record cannot be deleted. A
    /// zone that was never saved has nothing to delete.
    pub fn delete(&mut self, id: &ZoneId) -> Result<Zone, SaveError> {
        let key = self.record_key(id);
        let zone = self.unregister(id)?;
        self.origins.remove(id);
        match self.store.delete(&key) {
            Ok(()) | Err(PersistError::NotFound(_)) => {
                info!(zone = %id, "deleted zone");
                Ok(zone)
            }
            Err(err) => {
                warn!(zone = %id, error = %err, "zone unregistered but its record remains");
                Err(err.into())
            }
        }
    }

    // === Lookup ===

    /// Look up a zone.
    #[must_use]
    pub fn get_zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    /// Mutable zone for flag and membership edits. Parent links cannot be
    /// changed through it.
    pub fn get_zone_mut(&mut self, id: &ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(id)
    }

    /// Every zone, in no particular order.
    pub fn get_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Check if no zones are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Number of zones without a parent.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.zones.values().filter(|z| z.parent_id().is_none()).count()
    }

    /// Ids of a zone's direct children, sorted.
    #[must_use]
    pub fn children_of(&self, id: &ZoneId) -> &[ZoneId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The zone followed by each ancestor, nearest first.
    pub fn lineage<'a>(&'a self, id: &ZoneId) -> impl Iterator<Item = &'a Zone> + 'a {
        let mut next = self.zones.get(id);
        let mut budget = self.zones.len();
        std::iter::from_fn(move || {
            let current = next?;
            if budget == 0 {
                return None;
            }
            budget -= 1;
            next = current.parent_id().and_then(|p| self.zones.get(p));
            Some(current)
        })
    }

    /// Number of ancestors.
    #[must_use]
    pub fn depth(&self, id: &ZoneId) -> usize {
        self.lineage(id).count().saturating_sub(1)
    }

    /// The part of a zone's region not covered by its children.
    #[must_use]
    pub fn true_extent(&self, id: &ZoneId) -> Option<RegionSet> {
        let zone = self.zones.get(id)?;
        let children = self
            .children_of(id)
            .iter()
            .filter_map(|child| self.zones.get(child))
            .map(Zone::region);
        Some(zone.region().true_extent(children))
    }

    /// Every zone containing the location, outermost first.
    #[must_use]
    pub fn zones_at(&self, location: &Location) -> Vec<&Zone> {
        let mut found: Vec<(usize, &Zone)> = self
            .zones
            .values()
            .filter(|zone| zone.contains(location))
            .map(|zone| (self.depth(zone.id()), zone))
            .collect();
        found.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.id().cmp(b.id())));
        found.into_iter().map(|(_, zone)| zone).collect()
    }

    /// The deepest zone containing the location. Ties go to the lowest id.
    #[must_use]
    pub fn innermost_zone_at(&self, location: &Location) -> Option<&Zone> {
        self.zones
            .values()
            .filter(|zone| zone.contains(location))
            .min_by(|a, b| {
                self.depth(b.id())
                    .cmp(&self.depth(a.id()))
                    .then_with(|| a.id().cmp(b.id()))
            })
    }

    /// Effective flag of a type for a zone: its explicit flag, else the
    /// nearest ancestor's, else the default.
    #[must_use]
    pub fn resolve_zone_flag<'a>(
        &'a self,
        id: &ZoneId,
        type_id: &FlagTypeId,
        flags: &'a FlagManager,
    ) -> Option<ResolvedFlag<'a>> {
        for zone in self.lineage(id) {
            if let Some(flag) = zone.get_flag(type_id) {
                return Some(ResolvedFlag {
                    flag,
                    source: FlagSource::Zone(zone.id().clone()),
                });
            }
        }
        flags.default_flag(type_id).map(ResolvedFlag::from_default)
    }

    /// Effective flag of a type at a location.
    ///
    /// Starts from the innermost zone there and falls back up the parent
    /// chain, then to the defaults registry. Outside every zone only the
    /// default applies.
    #[must_use]
    pub fn resolve_flag<'a>(
        &'a self,
        location: &Location,
        type_id: &FlagTypeId,
        flags: &'a FlagManager,
    ) -> Option<ResolvedFlag<'a>> {
        match self.innermost_zone_at(location) {
            Some(zone) => self.resolve_zone_flag(zone.id(), type_id, flags),
            None => flags.default_flag(type_id).map(ResolvedFlag::from_default),
        }
    }

    // === Reload ===

    /// Re-scan the store and rebuild the registry from it.
    ///
    /// Not atomic. Records are applied one at a time, parents before
    /// children, replacing the live zone of the same id. A record that fails
    /// to load is reported and skipped, leaving any live version of that
    /// zone in place. Zones whose record is gone from the store are dropped,
    /// as is any zone left without its parent.
    ///
    /// Only a failure to list the store aborts the reload, before anything
    /// is touched.
    pub fn zones_reload(&mut self, flags: &FlagManager) -> Result<ReloadReport, PersistError> {
        let keys = self.store.list()?;
        let mut report = ReloadReport::default();

        let mut parsed: Vec<(RecordKey, Zone)> = Vec::new();
        let mut failed_keys: FxHashSet<RecordKey> = FxHashSet::default();
        for key in keys {
            match self.load(&key, flags) {
                Ok(zone) if !is_valid_name(zone.id().as_str()) => {
                    let err = RegisterError::InvalidId(zone.id().clone());
                    warn!(record = %key, error = %err, "skipping zone record");
                    report.batch.record_failure(key.to_string(), err.into());
                    failed_keys.insert(key);
                }
                Ok(zone) => parsed.push((key, zone)),
                Err(err) => {
                    warn!(record = %key, error = %err, "skipping zone record");
                    report.batch.record_failure(key.to_string(), err.into());
                    failed_keys.insert(key);
                }
            }
        }

        // Zones kept as they are: their record exists but did not load.
        let retained: FxHashSet<ZoneId> = self
            .origins
            .iter()
            .filter(|(id, key)| failed_keys.contains(*key) && self.zones.contains_key(*id))
            .map(|(id, _)| id.clone())
            .collect();
        let incoming: FxHashSet<ZoneId> = parsed.iter().map(|(_, z)| z.id().clone()).collect();

        let vanished: Vec<ZoneId> = self
            .zones
            .keys()
            .filter(|id| !retained.contains(*id) && !incoming.contains(*id))
            .cloned()
            .collect();
        for id in vanished {
            self.drop_zone(&id);
            report.removed.push(id);
        }

        let mut present = retained;
        let mut applied: FxHashSet<ZoneId> = FxHashSet::default();
        let mut pending = parsed;
        let mut progress = true;
        while progress && !pending.is_empty() {
            progress = false;
            let mut waiting = Vec::new();
            for (key, zone) in pending {
                let id = zone.id().clone();
                if applied.contains(&id) {
                    let err = RegisterError::DuplicateId(id);
                    warn!(record = %key, error = %err, "skipping zone record");
                    report.batch.record_failure(key.to_string(), err.into());
                    continue;
                }
                let ready = zone.parent_id().map_or(true, |p| present.contains(p));
                if !ready {
                    waiting.push((key, zone));
                    continue;
                }
                self.zones.insert(id.clone(), zone);
                self.origins.insert(id.clone(), key);
                present.insert(id.clone());
                applied.insert(id);
                report.batch.record_success();
                progress = true;
            }
            pending = waiting;
        }

        for (key, zone) in pending {
            let parent = zone.parent_id().cloned().unwrap_or_else(|| ZoneId::new(""));
            let err = RegisterError::DanglingParent {
                id: zone.id().clone(),
                parent,
            };
            warn!(record = %key, error = %err, "skipping zone record");
            report.batch.record_failure(key.to_string(), err.into());
        }

        // Live versions left behind may now point at a parent that is gone.
        loop {
            let orphans: Vec<ZoneId> = self
                .zones
                .values()
                .filter(|z| z.parent_id().is_some_and(|p| !self.zones.contains_key(p)))
                .map(|z| z.id().clone())
                .collect();
            if orphans.is_empty() {
                break;
            }
            for id in orphans {
                self.drop_zone(&id);
                report.removed.push(id);
            }
        }

        self.rebuild_children();
        info!(
            loaded = report.batch.succeeded,
            failed = report.batch.failure_count(),
            removed = report.removed.len(),
            total = self.zones.len(),
            "reloaded zones"
        );
        Ok(report)
    }

    fn drop_zone(&mut self, id: &ZoneId) {
        self.zones.remove(id);
        self.origins.remove(id);
        debug!(zone = %id, "dropped zone");
    }

    fn rebuild_children(&mut self) {
        self.children.clear();
        for zone in self.zones.values() {
            if let Some(parent) = zone.parent_id() {
                self.children
                    .entry(parent.clone())
                    .or_default()
                    .push(zone.id().clone());
            }
        }
        for siblings in self.children.values_mut() {
            siblings.sort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{BlockPos, Region};

    fn region(a: [i32; 3], b: [i32; 3]) -> Region {
        Region::new("w", a.into(), b.into())
    }

    fn nested() -> ZoneManager {
        let mut zones = ZoneManager::in_memory();
        zones
            .register(Zone::new("a", region([0, 0, 0], [10, 10, 10])))
            .unwrap();
        zones
            .register(Zone::new("b", region([2, 2, 2], [4, 4, 4])).with_parent("a"))
            .unwrap();
        zones
    }

    #[test]
    fn test_register_links_children() {
        let zones = nested();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones.root_count(), 1);
        assert_eq!(zones.children_of(&"a".into()), &[ZoneId::new("b")]);
        assert_eq!(zones.depth(&"b".into()), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut zones = nested();
        let err = zones
            .register(Zone::new("a", region([0, 0, 0], [1, 1, 1])))
            .unwrap_err();
        assert_eq!(err, RegisterError::DuplicateId("a".into()));
        assert_eq!(zones.len(), 2);
    }

    #[test]
    fn test_unregister_refuses_parent_with_children() {
        let mut zones = nested();
        assert!(matches!(
            zones.unregister(&"a".into()),
            Err(RegisterError::HasChildren { children: 1, .. })
        ));
        zones.unregister(&"b".into()).unwrap();
        assert!(zones.children_of(&"a".into()).is_empty());
        zones.unregister(&"a".into()).unwrap();
        assert!(zones.is_empty());
    }

    #[test]
    fn test_point_queries() {
        let zones = nested();
        let inside_b = Location::new("w", 3, 3, 3);
        let ids: Vec<_> = zones.zones_at(&inside_b).iter().map(|z| z.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(zones.innermost_zone_at(&inside_b).unwrap().id().as_str(), "b");
        assert_eq!(
            zones.innermost_zone_at(&Location::new("w", 8, 8, 8)).unwrap().id().as_str(),
            "a"
        );
        assert!(zones.innermost_zone_at(&Location::new("w", 50, 0, 0)).is_none());
    }

    #[test]
    fn test_true_extent_excludes_children() {
        let zones = nested();
        let extent = zones.true_extent(&"a".into()).unwrap();
        assert!(!extent.contains(&Location::new("w", 3, 3, 3)));
        assert!(extent.contains(&Location::new("w", 9, 9, 9)));
        assert_eq!(extent.volume(), 11 * 11 * 11 - 27);
    }

    #[test]
    fn test_save_and_delete() {
        let flags = FlagManager::standard_in_memory();
        let mut zones = nested();
        zones.save(&"b".into(), &flags).unwrap();
        let key = zones.record_key(&"b".into());
        assert_eq!(key, RecordKey::new(DEFAULT_NAMESPACE, "b"));

        let loaded = zones.load(&key, &flags).unwrap();
        assert_eq!(&loaded, zones.get_zone(&"b".into()).unwrap());

        zones.delete(&"b".into()).unwrap();
        assert!(zones.get_zone(&"b".into()).is_none());
        assert!(matches!(zones.load(&key, &flags), Err(LoadError::Read(_))));

        // never saved
        zones.delete(&"a".into()).unwrap();
    }

    #[test]
    fn test_save_unknown_zone() {
        let flags = FlagManager::standard_in_memory();
        let mut zones = ZoneManager::in_memory();
        assert!(matches!(
            zones.save(&"ghost".into(), &flags),
            Err(SaveError::Register(RegisterError::UnknownZone(_)))
        ));
    }

    #[test]
    fn test_parse_malformed() {
        let flags = FlagManager::standard_in_memory();
        assert!(matches!(
            ZoneManager::parse("{ not json", "x", &flags),
            Err(LoadError::Malformed { .. })
        ));
        let unknown_flag = r#"{ "id": "z", "world": "w", "min": [0,0,0], "max": [1,1,1],
            "flags": { "no_such_flag": {} } }"#;
        assert!(matches!(
            ZoneManager::parse(unknown_flag, "x", &flags),
            Err(LoadError::Flag { .. })
        ));
        let bad_member = r#"{ "id": "z", "world": "w", "min": [0,0,0], "max": [1,1,1],
            "members": { "bob": "owner" } }"#;
        assert!(matches!(
            ZoneManager::parse(bad_member, "x", &flags),
            Err(LoadError::InvalidMember { .. })
        ));
    }

    #[test]
    fn test_resized_region_keeps_zone() {
        let mut zones = nested();
        let zone = zones.get_zone_mut(&"a".into()).unwrap();
        let bigger = zone.region().resized(BlockPos::new(-5, 0, -5), BlockPos::new(20, 10, 20));
        zone.set_region(bigger);
        assert!(zones
            .get_zone(&"a".into())
            .unwrap()
            .contains(&Location::new("w", -5, 0, -5)));
    }
}
