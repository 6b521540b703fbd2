//! Core engine types: ids, configuration, the context, deferred work and
//! batch reports.
//!
//! Everything else hangs off a `ZoneContext` built from an `EngineConfig`.

pub mod config;
pub mod context;
pub mod ids;
pub mod report;
pub mod scheduler;

pub use config::{EngineConfig, DEFAULT_NAMESPACE};
pub use context::{BootReport, Category, EngineSummary, ZoneContext};
pub use ids::{FlagTypeId, GroupKeyId, PlayerId, WorldId, ZoneId};
pub use report::{BatchFailure, BatchReport};
pub use scheduler::{Scheduled, Scheduler, Task, TaskId};
