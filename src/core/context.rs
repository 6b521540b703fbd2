//! The engine context.
//!
//! One `ZoneContext` is built at startup and handed by reference to
//! whatever needs the registries. There is no global instance.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::config::EngineConfig;
use crate::core::ids::{FlagTypeId, ZoneId};
use crate::core::report::BatchReport;
use crate::core::scheduler::{Scheduler, TaskId};
use crate::error::{FlagError, PersistError, SaveError};
use crate::flags::standard::standard_ids;
use crate::flags::FlagManager;
use crate::groups::{GroupKeyManager, STANDARD_KEYS};
use crate::region::Location;
use crate::store::{DirStore, MemoryStore, RecordKey, RecordStore};
use crate::zones::{ReloadReport, ResolvedFlag, ZoneManager};

/// A category of built-in identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Built-in flag types.
    FlagType,
    /// Built-in group keys.
    GroupKey,
}

/// What happened during `ZoneContext::boot`.
#[derive(Debug, Default)]
pub struct BootReport {
    /// Stored defaults read back.
    pub stored_defaults: BatchReport<FlagError>,
    /// Built-in defaults added for types without one.
    pub bootstrap: BatchReport<FlagError>,
    /// Zone records loaded.
    pub zones: ReloadReport,
    /// Whole-stage persistence failures, in boot order.
    pub persist_failures: Vec<PersistError>,
}

impl BootReport {
    /// True if nothing failed at any stage.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stored_defaults.is_clean()
            && self.bootstrap.is_clean()
            && self.zones.is_clean()
            && self.persist_failures.is_empty()
    }
}

/// Engine facts for an info display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSummary {
    /// Crate name.
    pub name: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Zones without a parent.
    pub root_zones: usize,
    /// All zones.
    pub total_zones: usize,
    /// Registered flag types.
    pub flag_types: usize,
    /// Deferred tasks not yet run.
    pub pending_tasks: usize,
}

/// Owner of every registry.
#[derive(Debug)]
pub struct ZoneContext {
    config: EngineConfig,
    flags: FlagManager,
    zones: ZoneManager,
    keys: GroupKeyManager,
    scheduler: Scheduler<ZoneContext>,
}

impl ZoneContext {
    /// Build a context persisting under `config.data_dir`. Nothing is read
    /// until `boot`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let flag_store = DirStore::new(config.data_dir.clone());
        let zone_store = DirStore::new(config.zones_path());
        Self::with_stores(config, Box::new(flag_store), Box::new(zone_store))
    }

    /// Build a context that keeps everything in memory.
    #[must_use]
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::with_stores(config, Box::new(MemoryStore::new()), Box::new(MemoryStore::new()))
    }

    /// Build a context over explicit stores: one for the defaults document,
    /// one for zone records.
    pub fn with_stores(
        config: EngineConfig,
        flag_store: Box<dyn RecordStore>,
        zone_store: Box<dyn RecordStore>,
    ) -> Self {
        let defaults_key = RecordKey::top_level(config.defaults_record.clone());
        let namespace = config.namespace.clone();
        Self {
            flags: FlagManager::standard(flag_store, defaults_key),
            zones: ZoneManager::new(zone_store, namespace),
            keys: GroupKeyManager::standard(),
            scheduler: Scheduler::new(),
            config,
        }
    }

    /// Build a directory-backed context and boot it.
    #[must_use]
    pub fn start(config: EngineConfig) -> (Self, BootReport) {
        let mut ctx = Self::new(config);
        let report = ctx.boot();
        (ctx, report)
    }

    /// Load stored defaults, add built-in defaults for types still missing
    /// one, save the defaults, then load every zone record.
    ///
    /// Each stage runs even if an earlier one failed; failures end up in
    /// the report.
    pub fn boot(&mut self) -> BootReport {
        let mut report = BootReport::default();

        match self.flags.load_defaults() {
            Ok(loaded) => report.stored_defaults = loaded,
            Err(err) => {
                warn!(error = %err, "could not read stored default flags");
                report.persist_failures.push(err);
            }
        }

        report.bootstrap = self.flags.bootstrap_defaults();

        if let Err(err) = self.flags.save_defaults() {
            report.persist_failures.push(err);
        }

        match self.zones.zones_reload(&self.flags) {
            Ok(zones) => report.zones = zones,
            Err(err) => {
                warn!(error = %err, "could not list zone records");
                report.persist_failures.push(err);
            }
        }

        info!(
            zones = self.zones.len(),
            defaults = self.flags.defaults().count(),
            clean = report.is_clean(),
            "zone engine booted"
        );
        report
    }

    /// Re-read every zone record. See `ZoneManager::zones_reload`.
    pub fn reload(&mut self) -> Result<ReloadReport, PersistError> {
        self.zones.zones_reload(&self.flags)
    }

    /// Write one zone's record.
    pub fn save_zone(&mut self, id: &ZoneId) -> Result<(), SaveError> {
        self.zones.save(id, &self.flags)
    }

    // === Accessors ===

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The flag registry.
    #[must_use]
    pub fn flags(&self) -> &FlagManager {
        &self.flags
    }

    /// Mutable flag registry.
    pub fn flags_mut(&mut self) -> &mut FlagManager {
        &mut self.flags
    }

    /// The zone registry.
    #[must_use]
    pub fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    /// Mutable zone registry.
    pub fn zones_mut(&mut self) -> &mut ZoneManager {
        &mut self.zones
    }

    /// The group key registry.
    #[must_use]
    pub fn keys(&self) -> &GroupKeyManager {
        &self.keys
    }

    /// Mutable group key registry.
    pub fn keys_mut(&mut self) -> &mut GroupKeyManager {
        &mut self.keys
    }

    /// Effective flag of a type at a location.
    #[must_use]
    pub fn resolve_flag(&self, location: &Location, type_id: &FlagTypeId) -> Option<ResolvedFlag<'_>> {
        self.zones.resolve_flag(location, type_id, &self.flags)
    }

    /// Built-in ids of a category.
    #[must_use]
    pub fn vanilla(&self, category: Category) -> Vec<&'static str> {
        match category {
            Category::FlagType => standard_ids().collect(),
            Category::GroupKey => STANDARD_KEYS.iter().map(|&(id, _)| id).collect(),
        }
    }

    /// Facts for an info display.
    #[must_use]
    pub fn summary(&self) -> EngineSummary {
        EngineSummary {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            root_zones: self.zones.root_count(),
            total_zones: self.zones.len(),
            flag_types: self.flags.len(),
            pending_tasks: self.scheduler.pending(),
        }
    }

    // === Deferred work ===

    /// Run `task` after `delay` of logical time.
    pub fn schedule_after(
        &mut self,
        delay: Duration,
        task: impl FnOnce(&mut ZoneContext) + 'static,
    ) -> TaskId {
        self.scheduler.schedule_after(delay, task)
    }

    /// Current logical time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Advance logical time to `now` and run every task that is due.
    /// Returns the number of tasks run.
    pub fn run_due(&mut self, now: Duration) -> usize {
        let due = self.scheduler.take_due(now);
        let count = due.len();
        for scheduled in due {
            debug!(task = %scheduled.id, "running deferred task");
            (scheduled.task)(self);
        }
        count
    }
}
