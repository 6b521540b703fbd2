//! Flag type registry and the defaults registry.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::ids::FlagTypeId;
use crate::core::report::BatchReport;
use crate::error::{FlagError, FlagResult, PersistError, PersistResult};
use crate::store::{MemoryStore, RecordKey, RecordStore};

use super::flag::{Capabilities, Flag};
use super::flag_type::FlagType;
use super::standard::standard_types;

/// Registry of flag types plus the process-wide default flags.
///
/// The defaults registry is the fallback for any zone without an explicit
/// flag of a type. It is filled by `bootstrap_defaults` at boot, persisted
/// as one document, and only overwritten through `set_default`.
///
/// ## Example
///
/// ```
/// use zone_protect::flags::{standard::ids, FlagManager};
///
/// let mut flags = FlagManager::standard_in_memory();
/// let report = flags.bootstrap_defaults();
/// assert!(report.is_clean());
///
/// let default = flags.default_flag(&ids::BLOCK_BREAK.into()).unwrap();
/// assert_eq!(default.is_enabled(), Some(true));
/// ```
#[derive(Debug)]
pub struct FlagManager {
    types: FxHashMap<FlagTypeId, Box<dyn FlagType>>,
    order: Vec<FlagTypeId>,
    defaults: BTreeMap<FlagTypeId, Flag>,
    store: Box<dyn RecordStore>,
    defaults_key: RecordKey,
}

impl FlagManager {
    /// Create an empty registry persisting defaults to `store` under `defaults_key`.
    pub fn new(store: Box<dyn RecordStore>, defaults_key: RecordKey) -> Self {
        Self {
            types: FxHashMap::default(),
            order: Vec::new(),
            defaults: BTreeMap::new(),
            store,
            defaults_key,
        }
    }

    /// Create a registry holding every built-in flag type.
    pub fn standard(store: Box<dyn RecordStore>, defaults_key: RecordKey) -> Self {
        let mut manager = Self::new(store, defaults_key);
        for ty in standard_types() {
            manager
                .register(ty)
                .expect("built-in flag type ids are distinct");
        }
        manager
    }

    /// Built-in types with an in-memory defaults document.
    #[must_use]
    pub fn standard_in_memory() -> Self {
        Self::standard(Box::new(MemoryStore::new()), RecordKey::top_level("defaults"))
    }

    /// Register a flag type. Fails if the id is taken; the registry is
    /// unchanged on failure.
    pub fn register(&mut self, flag_type: impl FlagType + 'static) -> FlagResult<()> {
        let id = flag_type.id().clone();
        if self.types.contains_key(&id) {
            return Err(FlagError::DuplicateTypeId(id));
        }
        debug!(flag_type = %id, "registered flag type");
        self.order.push(id.clone());
        self.types.insert(id, Box::new(flag_type));
        Ok(())
    }

    /// Look up a type.
    #[must_use]
    pub fn get(&self, id: &FlagTypeId) -> Option<&dyn FlagType> {
        self.types.get(id).map(|ty| ty.as_ref())
    }

    /// Check if a type is registered.
    #[must_use]
    pub fn contains(&self, id: &FlagTypeId) -> bool {
        self.types.contains_key(id)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn FlagType> {
        self.order.iter().filter_map(|id| self.get(id))
    }

    /// Every type satisfying all of `capabilities`, in registration order.
    pub fn get_registered(&self, capabilities: Capabilities) -> impl Iterator<Item = &dyn FlagType> {
        self.iter()
            .filter(move |ty| ty.capabilities().contains(capabilities))
    }

    /// The stored default of a type.
    #[must_use]
    pub fn default_flag(&self, id: &FlagTypeId) -> Option<&Flag> {
        self.defaults.get(id)
    }

    /// Every stored default, ordered by type id.
    pub fn defaults(&self) -> impl Iterator<Item = &Flag> {
        self.defaults.values()
    }

    /// Overwrite the default of a registered type. Returns the previous one.
    ///
    /// The flag must pass its type's codec, so every stored default can be
    /// saved. The registry is unchanged on failure.
    pub fn set_default(&mut self, flag: Flag) -> FlagResult<Option<Flag>> {
        self.encode_flag(&flag)?;
        Ok(self.defaults.insert(flag.type_id().clone(), flag))
    }

    /// Give every serializable, untagged type without a stored default a
    /// copy of its built-in default. Never overwrites an existing default.
    ///
    /// Each type is handled on its own: a type whose default cannot be
    /// encoded is reported and the rest carry on.
    pub fn bootstrap_defaults(&mut self) -> BatchReport<FlagError> {
        let mut report = BatchReport::new();
        let mut fresh = Vec::new();

        for ty in self.get_registered(Capabilities::SERIALIZABLE) {
            if ty.is_tagged() || self.defaults.contains_key(ty.id()) {
                report.record_skip();
                continue;
            }
            let Some(flag) = ty.default_flag() else {
                report.record_skip();
                continue;
            };
            match ty.serialize(&flag) {
                Ok(_) => fresh.push(flag),
                Err(err) => {
                    warn!(flag_type = %ty.id(), error = %err, "default flag cannot be stored");
                    report.record_failure(ty.id().as_str(), err);
                }
            }
        }

        for flag in fresh {
            self.defaults.insert(flag.type_id().clone(), flag);
            report.record_success();
        }

        info!(
            added = report.succeeded,
            skipped = report.skipped,
            failed = report.failure_count(),
            "bootstrapped default flags"
        );
        report
    }

    /// Write the defaults registry as one document.
    ///
    /// The document is written whole or not at all: a default its codec
    /// rejects fails the save. In-memory defaults are kept either way.
    pub fn save_defaults(&mut self) -> PersistResult<()> {
        let mut document = serde_json::Map::new();
        for flag in self.defaults.values() {
            let payload = self.encode_flag(flag).map_err(|source| {
                warn!(flag_type = %flag.type_id(), error = %source, "default flag cannot be saved");
                PersistError::Flag {
                    path: self.defaults_key.to_string(),
                    source,
                }
            })?;
            document.insert(flag.type_id().as_str().to_string(), payload);
        }
        let text = serde_json::to_string_pretty(&Value::Object(document)).map_err(|source| {
            PersistError::Encoding {
                path: self.defaults_key.to_string(),
                source,
            }
        })?;
        if let Err(err) = self.store.write(&self.defaults_key, &text) {
            warn!(record = %self.defaults_key, error = %err, "failed to save default flags");
            return Err(err);
        }
        debug!(count = self.defaults.len(), "saved default flags");
        Ok(())
    }

    /// Read the defaults document into the registry.
    ///
    /// A missing document is an empty one. Entries for unknown types or with
    /// bad payloads are reported and skipped.
    pub fn load_defaults(&mut self) -> PersistResult<BatchReport<FlagError>> {
        let mut report = BatchReport::new();
        let text = match self.store.read(&self.defaults_key) {
            Ok(text) => text,
            Err(PersistError::NotFound(_)) => {
                debug!(record = %self.defaults_key, "no stored default flags");
                return Ok(report);
            }
            Err(err) => return Err(err),
        };
        let document: BTreeMap<String, Value> =
            serde_json::from_str(&text).map_err(|source| PersistError::Encoding {
                path: self.defaults_key.to_string(),
                source,
            })?;

        for (id, payload) in document {
            let type_id = FlagTypeId::new(id);
            match self.decode_flag(&type_id, &payload) {
                Ok(flag) => {
                    self.defaults.insert(type_id, flag);
                    report.record_success();
                }
                Err(err) => {
                    warn!(flag_type = %type_id, error = %err, "skipping stored default");
                    report.record_failure(type_id.as_str(), err);
                }
            }
        }
        info!(
            loaded = report.succeeded,
            failed = report.failure_count(),
            "loaded default flags"
        );
        Ok(report)
    }

    fn serializable_type(&self, id: &FlagTypeId) -> FlagResult<&dyn FlagType> {
        let ty = self
            .get(id)
            .ok_or_else(|| FlagError::UnknownType(id.clone()))?;
        if !ty.capabilities().contains(Capabilities::SERIALIZABLE) {
            return Err(FlagError::NotSerializable(id.clone()));
        }
        Ok(ty)
    }

    /// Encode a flag with its type's codec.
    pub fn encode_flag(&self, flag: &Flag) -> FlagResult<Value> {
        self.serializable_type(flag.type_id())?.serialize(flag)
    }

    /// Decode a payload with the codec of `type_id`.
    pub fn decode_flag(&self, type_id: &FlagTypeId, payload: &Value) -> FlagResult<Flag> {
        self.serializable_type(type_id)?.deserialize(payload)
    }

    /// Encode a flag map keyed by type id.
    pub fn encode_flags<'a>(
        &self,
        flags: impl IntoIterator<Item = &'a Flag>,
    ) -> FlagResult<BTreeMap<String, Value>> {
        flags
            .into_iter()
            .map(|flag| Ok((flag.type_id().as_str().to_string(), self.encode_flag(flag)?)))
            .collect()
    }

    /// Decode a flag map keyed by type id. Fails on the first bad entry.
    pub fn decode_flags(&self, payloads: &BTreeMap<String, Value>) -> FlagResult<Vec<Flag>> {
        payloads
            .iter()
            .map(|(id, payload)| self.decode_flag(&FlagTypeId::new(id.as_str()), payload))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::flag_type::{PayloadKind, StandardFlagType};
    use crate::flags::standard::{ids, standard_types};
    use crate::flags::value::FlagValue;

    #[test]
    fn test_duplicate_type_rejected() {
        let mut flags = FlagManager::standard_in_memory();
        let before = flags.len();
        let err = flags
            .register(StandardFlagType::new(ids::BLOCK_BREAK, "Again", PayloadKind::Unit))
            .unwrap_err();
        assert_eq!(err, FlagError::DuplicateTypeId(ids::BLOCK_BREAK.into()));
        assert_eq!(flags.len(), before);
        assert_eq!(flags.get(&ids::BLOCK_BREAK.into()).unwrap().name(), "Block Break");
    }

    #[test]
    fn test_get_registered_by_capability() {
        let flags = FlagManager::standard_in_memory();
        assert_eq!(
            flags.get_registered(Capabilities::SERIALIZABLE).count(),
            standard_types().len()
        );
        let keyed: Vec<_> = flags
            .get_registered(Capabilities::GROUP_KEYED)
            .map(|ty| ty.id().as_str().to_string())
            .collect();
        assert_eq!(
            keyed,
            vec![
                ids::BLOCK_BREAK,
                ids::BLOCK_PLACE,
                ids::INTERACT_DOOR,
                ids::INTERACT_ITEM_FRAME,
                ids::PREVENT_PLAYERS
            ]
        );
    }

    #[test]
    fn test_bootstrap_skips_tagged_and_defaultless() {
        let mut flags = FlagManager::standard_in_memory();
        let report = flags.bootstrap_defaults();
        assert!(report.is_clean());
        assert!(flags.default_flag(&ids::ENTRY_FEE.into()).is_none());
        assert!(flags.default_flag(&ids::GREETINGS.into()).is_none());
        assert!(flags.default_flag(&ids::FALL_DAMAGE.into()).is_some());
        // entry fee, greetings, leaving, balance
        assert_eq!(report.skipped, 4);
    }

    #[test]
    fn test_bootstrap_keeps_existing_default() {
        let mut flags = FlagManager::standard_in_memory();
        let mut custom = flags.get(&ids::FALL_DAMAGE.into()).unwrap().default_flag().unwrap();
        custom.as_enabled_mut().unwrap().set_enabled(Some(true));
        flags.set_default(custom.clone()).unwrap();

        flags.bootstrap_defaults();
        assert_eq!(flags.default_flag(&ids::FALL_DAMAGE.into()), Some(&custom));
    }

    #[test]
    fn test_set_default_requires_registered_type() {
        let mut flags = FlagManager::standard_in_memory();
        let stray = Flag::new("no_such_flag", FlagValue::Unit);
        assert_eq!(
            flags.set_default(stray),
            Err(FlagError::UnknownType("no_such_flag".into()))
        );
    }

    #[test]
    fn test_set_default_rejects_bad_payload() {
        let mut flags = FlagManager::standard_in_memory();
        let err = flags
            .set_default(Flag::new(ids::GREETINGS, FlagValue::Int(3)))
            .unwrap_err();
        assert!(matches!(err, FlagError::Codec { .. }));
        assert!(flags.default_flag(&ids::GREETINGS.into()).is_none());

        flags
            .set_default(Flag::new(ids::GREETINGS, FlagValue::from("hello")))
            .unwrap();
        assert!(flags.default_flag(&ids::GREETINGS.into()).is_some());
    }

    #[test]
    fn test_save_defaults_fails_on_unencodable_default() {
        let mut flags = FlagManager::standard_in_memory();
        flags.bootstrap_defaults();
        flags.save_defaults().unwrap();
        let before = flags.store.read(&flags.defaults_key).unwrap();

        let bad = Flag::new(ids::GREETINGS, FlagValue::Int(3));
        flags.defaults.insert(ids::GREETINGS.into(), bad.clone());

        let err = flags.save_defaults().unwrap_err();
        assert!(matches!(
            err,
            PersistError::Flag {
                source: FlagError::Codec { .. },
                ..
            }
        ));
        assert_eq!(flags.store.read(&flags.defaults_key).unwrap(), before);
        assert_eq!(flags.default_flag(&ids::GREETINGS.into()), Some(&bad));
    }

    #[test]
    fn test_standard_ids_are_distinct() {
        let ids: Vec<_> = crate::flags::standard::standard_ids().collect();
        let unique: std::collections::BTreeSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(FlagManager::standard_in_memory().len(), ids.len());
    }

    #[test]
    fn test_save_and_load_defaults() {
        let mut flags = FlagManager::standard_in_memory();
        flags.bootstrap_defaults();
        let mut door = flags.default_flag(&ids::INTERACT_DOOR.into()).unwrap().clone();
        door.as_enabled_mut().unwrap().set_enabled(Some(false));
        flags.set_default(door.clone()).unwrap();
        flags.save_defaults().unwrap();

        let text = flags.store.read(&flags.defaults_key).unwrap();
        let mut reloaded = FlagManager::standard(
            Box::new(MemoryStore::new().with_record(RecordKey::top_level("defaults"), text)),
            RecordKey::top_level("defaults"),
        );
        let report = reloaded.load_defaults().unwrap();
        assert!(report.is_clean());
        assert_eq!(reloaded.defaults().count(), flags.defaults().count());
        assert_eq!(reloaded.default_flag(&ids::INTERACT_DOOR.into()), Some(&door));
    }

    #[test]
    fn test_load_defaults_isolates_bad_entries() {
        let document = r#"{
            "fall_damage": { "enabled": true },
            "no_such_flag": {},
            "greetings": { "value": 7 }
        }"#;
        let mut flags = FlagManager::standard(
            Box::new(MemoryStore::new().with_record(RecordKey::top_level("defaults"), document)),
            RecordKey::top_level("defaults"),
        );
        let report = flags.load_defaults().unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failure_count(), 2);
        assert_eq!(
            flags.default_flag(&ids::FALL_DAMAGE.into()).unwrap().is_enabled(),
            Some(true)
        );
    }

    #[test]
    fn test_load_missing_defaults_is_empty() {
        let mut flags = FlagManager::standard_in_memory();
        let report = flags.load_defaults().unwrap();
        assert_eq!(report.succeeded, 0);
        assert!(report.is_clean());
    }
}
