//! Persistence sources for zone records and the defaults document.
//!
//! A `RecordStore` holds named JSON documents grouped by namespace. The
//! engine only ever reads and writes whole documents; decoding is done by
//! the caller so that malformed content can be reported per record.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PersistError, PersistResult};

/// File extension of records in a `DirStore`.
pub const RECORD_EXTENSION: &str = "json";

/// Address of one document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    /// Grouping folder. Empty for top-level documents.
    pub namespace: String,
    /// Document name without extension.
    pub name: String,
}

impl RecordKey {
    /// Create a key.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a top-level document.
    pub fn top_level(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    /// True if both parts are valid names. The namespace may be empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (self.namespace.is_empty() || is_valid_name(&self.namespace)) && is_valid_name(&self.name)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

/// True if `name` can be used as a namespace or document name: non-empty,
/// no path separators or NUL bytes, and not `.` or `..`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// A source of JSON documents.
pub trait RecordStore: fmt::Debug {
    /// Every document, sorted by key.
    fn list(&self) -> PersistResult<Vec<RecordKey>>;

    /// Read one document. Missing documents are `PersistError::NotFound`.
    fn read(&self, key: &RecordKey) -> PersistResult<String>;

    /// Create or replace a document.
    fn write(&mut self, key: &RecordKey, contents: &str) -> PersistResult<()>;

    /// Remove a document. Missing documents are `PersistError::NotFound`.
    fn delete(&mut self, key: &RecordKey) -> PersistResult<()>;
}

/// Documents as `<root>/<namespace>/<name>.json` files.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path of a document. Keys that would leave the root or nest
    /// deeper than one namespace folder are refused.
    pub fn path_of(&self, key: &RecordKey) -> PersistResult<PathBuf> {
        if !key.is_valid() {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        let file = format!("{}.{RECORD_EXTENSION}", key.name);
        Ok(if key.namespace.is_empty() {
            self.root.join(file)
        } else {
            self.root.join(&key.namespace).join(file)
        })
    }

    fn io_error(path: &Path, source: io::Error) -> PersistError {
        PersistError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn scan(dir: &Path, namespace: &str, out: &mut Vec<RecordKey>, recurse: bool) -> PersistResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(Self::io_error(dir, err)),
        };
        for entry in entries {
            let entry = entry.map_err(|err| Self::io_error(dir, err))?;
            let path = entry.path();
            if path.is_dir() {
                if recurse {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    Self::scan(&path, &name, out, false)?;
                }
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                out.push(RecordKey::new(namespace, stem));
            }
        }
        Ok(())
    }
}

impl RecordStore for DirStore {
    fn list(&self) -> PersistResult<Vec<RecordKey>> {
        let mut keys = Vec::new();
        Self::scan(&self.root, "", &mut keys, true)?;
        keys.sort();
        Ok(keys)
    }

    fn read(&self, key: &RecordKey) -> PersistResult<String> {
        let path = self.path_of(key)?;
        fs::read_to_string(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                PersistError::NotFound(key.to_string())
            } else {
                Self::io_error(&path, err)
            }
        })
    }

    fn write(&mut self, key: &RecordKey, contents: &str) -> PersistResult<()> {
        let path = self.path_of(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Self::io_error(parent, err))?;
        }
        fs::write(&path, contents).map_err(|err| Self::io_error(&path, err))
    }

    fn delete(&mut self, key: &RecordKey) -> PersistResult<()> {
        let path = self.path_of(key)?;
        fs::remove_file(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                PersistError::NotFound(key.to_string())
            } else {
                Self::io_error(&path, err)
            }
        })
    }
}

/// Documents held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<RecordKey, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, builder style.
    #[must_use]
    pub fn with_record(mut self, key: RecordKey, contents: impl Into<String>) -> Self {
        self.records.insert(key, contents.into());
        self
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn list(&self) -> PersistResult<Vec<RecordKey>> {
        Ok(self.records.keys().cloned().collect())
    }

    fn read(&self, key: &RecordKey) -> PersistResult<String> {
        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| PersistError::NotFound(key.to_string()))
    }

    fn write(&mut self, key: &RecordKey, contents: &str) -> PersistResult<()> {
        self.records.insert(key.clone(), contents.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &RecordKey) -> PersistResult<()> {
        self.records
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| PersistError::NotFound(key.to_string()))
    }
}
