//! # zone-protect
//!
//! A spatial access-control engine: the world is partitioned into named,
//! possibly nested zones, each carrying typed flags, and players bypass
//! flags through group keys.
//!
//! ## Design Principles
//!
//! 1. **Explicit Context**: every registry lives in one `ZoneContext` built
//!    at startup and passed by reference. There are no globals.
//!
//! 2. **Capabilities, Not Hierarchies**: a flag may be `Enabled` and/or
//!    `GroupKeyed`; callers ask (`as_enabled`, `as_group_keyed`) instead of
//!    matching on concrete types.
//!
//! 3. **Failures Are Values**: bulk operations return batch reports, one bad
//!    record never aborts the batch, and permission denial is a `bool`.
//!
//! ## Flag Precedence
//!
//! At a point covered by nested zones the innermost zone's explicit flag
//! wins, then the nearest ancestor's, then the defaults registry.
//!
//! ## Modules
//!
//! - `core`: ids, configuration, context, scheduler, batch reports
//! - `region`: cuboid geometry and true extents
//! - `groups`: group keys and group hierarchies
//! - `price`: prices, decimal money amounts, the account-service boundary
//! - `flags`: flag types, flags, the flag and defaults registries
//! - `zones`: zones, zone records, the zone registry, bounds previews
//! - `store`: persistence sources
//! - `error`: error types

pub mod core;
pub mod error;
pub mod flags;
pub mod groups;
pub mod price;
pub mod region;
pub mod store;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{
    BatchReport, BootReport, Category, EngineConfig, EngineSummary, FlagTypeId, GroupKeyId,
    PlayerId, Scheduler, TaskId, WorldId, ZoneContext, ZoneId,
};

pub use crate::error::{
    AccountError, FlagError, GroupError, LoadError, PersistError, PriceError, RegisterError,
    ReloadError, SaveError,
};

pub use crate::flags::{
    Capabilities, Enabled, Flag, FlagManager, FlagType, FlagValue, GroupKeyed, PayloadKind,
    StandardFlagType,
};

pub use crate::groups::{Group, GroupKey, GroupKeyManager, GroupTree, GroupView};

pub use crate::price::{
    AccountRef, AccountService, Currency, Decimal, Price, PriceBuilder, PriceKind, PriceSubject,
    SubjectKind,
};

pub use crate::region::{BlockPos, Location, Region, RegionSet};

pub use crate::store::{DirStore, MemoryStore, RecordKey, RecordStore};

pub use crate::zones::{
    show_bounds, BoundsViewer, FlagSource, ReloadReport, ResolvedFlag, Zone, ZoneManager,
    ZoneRecord,
};
