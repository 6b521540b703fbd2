//! Error types for the zone engine.
//!
//! Every fallible operation returns one of these. Permission denial is not
//! an error: permission checks return `bool` and callers decide what to do.

use thiserror::Error;

use crate::core::ids::{FlagTypeId, GroupKeyId, PlayerId, ZoneId};

/// Persistence read/write failure. In-memory state is never rolled back
/// when one of these is returned.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The underlying store could not be read or written.
    #[error("i/o failure on '{path}': {source}")]
    Io {
        /// Store location that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A document could not be encoded or decoded as JSON.
    #[error("encoding failure on '{path}': {source}")]
    Encoding {
        /// Store location that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The requested record does not exist.
    #[error("record '{0}' not found")]
    NotFound(String),

    /// The key cannot name a document: an empty part, a path separator or
    /// a relative path component.
    #[error("invalid record key '{0}'")]
    InvalidKey(String),

    /// A flag in the document could not be encoded; nothing was written.
    #[error("cannot encode flag for '{path}': {source}")]
    Flag {
        /// Store location that was being written.
        path: String,
        /// The codec failure.
        #[source]
        source: FlagError,
    },
}

/// Flag type registry and flag codec errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// A type with this id is already registered.
    #[error("flag type {0} is already registered")]
    DuplicateTypeId(FlagTypeId),

    /// No type with this id is registered.
    #[error("flag type {0} is not registered")]
    UnknownType(FlagTypeId),

    /// The type has no persisted codec.
    #[error("flag type {0} is not serializable")]
    NotSerializable(FlagTypeId),

    /// A payload did not match what the type expects.
    #[error("flag type {type_id}: {reason}")]
    Codec {
        /// The type whose codec failed.
        type_id: FlagTypeId,
        /// What went wrong.
        reason: String,
    },
}

/// Group and group key errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// Linking `group` under `parent` would close a loop in the hierarchy.
    #[error("making '{parent}' the parent of '{group}' would create a cycle")]
    CyclicGroupHierarchy {
        /// The group being edited.
        group: String,
        /// The proposed parent.
        parent: String,
    },

    /// No group with this name exists.
    #[error("group '{0}' does not exist")]
    UnknownGroup(String),

    /// A group with this name already exists.
    #[error("group '{0}' already exists")]
    DuplicateGroup(String),

    /// A group key with this id is already registered.
    #[error("group key {0} is already registered")]
    DuplicateKey(GroupKeyId),
}

/// Zone registration errors. The registry is unchanged when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// A zone with this id is already registered.
    #[error("zone {0} is already registered")]
    DuplicateId(ZoneId),

    /// The zone names a parent that is not registered.
    #[error("zone {id} references unregistered parent {parent}")]
    DanglingParent {
        /// The zone being registered.
        id: ZoneId,
        /// The missing parent.
        parent: ZoneId,
    },

    /// The zone still has registered children.
    #[error("zone {id} still has {children} child zone(s)")]
    HasChildren {
        /// The zone being removed.
        id: ZoneId,
        /// Number of registered children.
        children: usize,
    },

    /// No zone with this id is registered.
    #[error("zone {0} is not registered")]
    UnknownZone(ZoneId),

    /// The id cannot name a record: it is empty, contains a path separator
    /// or is a relative path component.
    #[error("zone id '{0}' is not a valid record name")]
    InvalidId(ZoneId),
}

/// A persisted zone record could not be turned into a zone.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The record could not be read.
    #[error(transparent)]
    Read(#[from] PersistError),

    /// The record is not a well-formed zone document.
    #[error("malformed zone record '{origin}': {source}")]
    Malformed {
        /// Where the record came from.
        origin: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A member entry does not carry a valid player id.
    #[error("zone {zone}: invalid member id '{player}'")]
    InvalidMember {
        /// The zone being loaded.
        zone: ZoneId,
        /// The offending id text.
        player: String,
    },

    /// A flag payload could not be decoded.
    #[error("zone {zone}: {source}")]
    Flag {
        /// The zone being loaded.
        zone: ZoneId,
        /// Underlying flag error.
        #[source]
        source: FlagError,
    },

    /// The group section is inconsistent.
    #[error("zone {zone}: {source}")]
    Group {
        /// The zone being loaded.
        zone: ZoneId,
        /// Underlying group error.
        #[source]
        source: GroupError,
    },
}

/// A single record that failed during a reload.
#[derive(Error, Debug)]
pub enum ReloadError {
    /// The record could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The record loaded but could not be registered.
    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Writing or deleting a zone record failed.
#[derive(Error, Debug)]
pub enum SaveError {
    /// The zone is not registered.
    #[error(transparent)]
    Register(#[from] RegisterError),

    /// A flag could not be encoded.
    #[error(transparent)]
    Flag(#[from] FlagError),

    /// The store rejected the write.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// The external account service could not answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The service is not available right now.
    #[error("account service unavailable: {0}")]
    Unavailable(String),

    /// The player has no account.
    #[error("no account for {0}")]
    NoAccount(PlayerId),
}

/// A price could not be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// No amount was given.
    #[error("price has no amount")]
    MissingAmount,

    /// No currency was given.
    #[error("price has no currency")]
    MissingCurrency,

    /// The amount text is not a decimal number.
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
}

/// Result type for flag operations.
pub type FlagResult<T> = Result<T, FlagError>;

/// Result type for group operations.
pub type GroupResult<T> = Result<T, GroupError>;

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;
