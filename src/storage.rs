//! Storage
//!
//! Named slots of serialized state that survive restarts. Each slot holds one JSON document.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::warn;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error reading or writing a slot
    #[error("failed to access slot {slot}: {source}")]
    Io {
        /// Slot being accessed
        slot: Slot,

        /// Underlying IO error
        source: io::Error,
    },

    /// Value could not be serialized
    #[error("failed to serialize slot {slot}: {source}")]
    Serialize {
        /// Slot being written
        slot: Slot,

        /// Underlying JSON error
        source: serde_json::Error,
    },
}

/// Persisted state slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Cart lines
    Cart,

    /// Applied coupon
    AppliedCoupon,

    /// Order history, newest first
    Orders,

    /// Most recently placed order
    LatestOrder,
}

impl Slot {
    /// Storage key of the slot.
    pub fn key(self) -> &'static str {
        match self {
            Slot::Cart => "cart",
            Slot::AppliedCoupon => "applied_coupon",
            Slot::Orders => "orders",
            Slot::LatestOrder => "latest_order",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A key-value store of serialized slots.
pub trait Storage: fmt::Debug {
    /// Read the raw contents of a slot, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError>;

    /// Replace the contents of a slot.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be written.
    fn write(&mut self, slot: Slot, contents: &str) -> Result<(), StorageError>;

    /// Forget a slot.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be written.
    fn remove(&mut self, slot: Slot) -> Result<(), StorageError>;
}

/// Read and decode a slot, falling back to the default when it is missing or unreadable.
///
/// Unreadable or corrupt contents are logged and otherwise ignored.
pub fn load_or_default<T, S>(storage: &S, slot: Slot) -> T
where
    T: DeserializeOwned + Default,
    S: Storage + ?Sized,
{
    let contents = match storage.read(slot) {
        Ok(Some(contents)) => contents,
        Ok(None) => return T::default(),
        Err(error) => {
            warn!(%slot, %error, "could not read stored state, starting empty");
            return T::default();
        }
    };

    serde_json::from_str(&contents).unwrap_or_else(|error| {
        warn!(%slot, %error, "stored state is corrupt, starting empty");
        T::default()
    })
}

/// Encode and write a slot.
///
/// # Errors
///
/// Returns a [`StorageError`] if the value cannot be serialized or written.
pub fn save<T, S>(storage: &mut S, slot: Slot, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: Storage + ?Sized,
{
    let contents =
        serde_json::to_string(value).map_err(|source| StorageError::Serialize { slot, source })?;

    storage.write(slot, &contents)
}

/// Storage held in memory, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: FxHashMap<Slot, String>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(&slot).cloned())
    }

    fn write(&mut self, slot: Slot, contents: &str) -> Result<(), StorageError> {
        self.slots.insert(slot, contents.to_string());

        Ok(())
    }

    fn remove(&mut self, slot: Slot) -> Result<(), StorageError> {
        self.slots.remove(&slot);

        Ok(())
    }
}

/// Storage in a directory, one `<slot>.json` file per slot.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` for storage, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    /// Directory holding the slot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }
}

impl Storage for FileStorage {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { slot, source }),
        }
    }

    fn write(&mut self, slot: Slot, contents: &str) -> Result<(), StorageError> {
        // Replace atomically.
        let path = self.path(slot);
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, contents).map_err(|source| StorageError::Io { slot, source })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { slot, source })
    }

    fn remove(&mut self, slot: Slot) -> Result<(), StorageError> {
        match fs::remove_file(self.path(slot)) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { slot, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn memory_storage_reads_back_writes() -> TestResult {
        let mut storage = MemoryStorage::new();

        assert_eq!(storage.read(Slot::Cart)?, None);

        storage.write(Slot::Cart, "[]")?;
        assert_eq!(storage.read(Slot::Cart)?.as_deref(), Some("[]"));

        storage.remove(Slot::Cart)?;
        assert_eq!(storage.read(Slot::Cart)?, None);

        Ok(())
    }

    #[test]
    fn missing_slot_loads_default() {
        let storage = MemoryStorage::new();
        let loaded: Vec<u32> = load_or_default(&storage, Slot::Orders);

        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_slot_loads_default() -> TestResult {
        let mut storage = MemoryStorage::new();
        storage.write(Slot::Orders, "{not json")?;

        let loaded: Vec<u32> = load_or_default(&storage, Slot::Orders);

        assert!(loaded.is_empty());

        Ok(())
    }

    #[test]
    fn wrong_shape_loads_default() -> TestResult {
        let mut storage = MemoryStorage::new();
        storage.write(Slot::Orders, r#"{"unexpected": true}"#)?;

        let loaded: Vec<u32> = load_or_default(&storage, Slot::Orders);

        assert!(loaded.is_empty());

        Ok(())
    }

    #[test]
    fn save_then_load_round_trips() -> TestResult {
        let mut storage = MemoryStorage::new();
        save(&mut storage, Slot::Orders, &vec![3u32, 1, 2])?;

        let loaded: Vec<u32> = load_or_default(&storage, Slot::Orders);

        assert_eq!(loaded, vec![3, 1, 2]);

        Ok(())
    }

    #[test]
    fn file_storage_persists_across_instances() -> TestResult {
        let dir = tempfile::tempdir()?;

        let mut storage = FileStorage::open(dir.path())?;
        storage.write(Slot::AppliedCoupon, r#"{"code":"ILK15"}"#)?;

        let reopened = FileStorage::open(dir.path())?;

        assert_eq!(
            reopened.read(Slot::AppliedCoupon)?.as_deref(),
            Some(r#"{"code":"ILK15"}"#)
        );
        assert!(dir.path().join("applied_coupon.json").exists());

        Ok(())
    }

    #[test]
    fn file_storage_remove_is_idempotent() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::open(dir.path())?;

        storage.remove(Slot::Cart)?;
        storage.write(Slot::Cart, "[]")?;
        storage.remove(Slot::Cart)?;

        assert_eq!(storage.read(Slot::Cart)?, None);

        Ok(())
    }
}
