//! Flags: typed policies attached to zones.
//!
//! ## Key Types
//!
//! - `FlagType`: a catalogued kind of flag, owning its codec and default
//! - `Flag`: an instance with a value and optional capabilities
//! - `Enabled` / `GroupKeyed`: capability traits, queried on a flag
//! - `FlagManager`: type registry plus the defaults registry

pub mod flag;
pub mod flag_type;
pub mod manager;
pub mod standard;
pub mod value;

pub use flag::{Capabilities, Enabled, EnabledState, Flag, GroupKeyed, RequiredKey};
pub use flag_type::{FlagType, PayloadKind, StandardFlagType};
pub use manager::FlagManager;
pub use value::FlagValue;
