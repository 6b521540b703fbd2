//! Zones and the zone registry.
//!
//! A `Zone` is a named region with flags, an optional parent and a
//! membership map. The `ZoneManager` loads zones from a `RecordStore`,
//! keeps parent links consistent and answers point queries.

pub mod manager;
pub mod preview;
pub mod record;
pub mod zone;

pub use manager::{FlagSource, ReloadReport, ResolvedFlag, ZoneManager};
pub use preview::{show_bounds, BoundsPreview, BoundsViewer};
pub use record::ZoneRecord;
pub use zone::Zone;
