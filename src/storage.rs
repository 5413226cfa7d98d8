//! Persistence backends for the task list.
//!
//! The whole list is written after every mutation and read once at startup.
//! Backends:
//! - `JsonFileStorage`: pretty JSON file, replaced atomically, previous copy kept as `.bak`
//! - `MemoryStorage`: in-process, for tests and embedding; can simulate write failures

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::store::StoreSnapshot;
use crate::{tlog_debug, Result};

/// Where the task list lives between sessions.
pub trait Storage {
    /// Read the stored list. `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<StoreSnapshot>>;

    /// Replace the stored list with `snapshot`.
    fn save(&self, snapshot: &StoreSnapshot) -> Result<()>;
}

/// JSON file on local disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Option<StoreSnapshot>> {
        tlog_debug!("JsonFileStorage::load path={}", self.path.display());
        if !self.path.exists() {
            tlog_debug!("Task file not found, starting empty");
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let snapshot = StoreSnapshot::from_json(&contents)?;
        tlog_debug!("Loaded {} task(s)", snapshot.tasks.len());
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let contents = serde_json::to_string_pretty(snapshot)?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                tlog_debug!("Creating task directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path())?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, &contents)?;
        fs::rename(&temp_path, &self.path)?;
        tlog_debug!(
            "Saved {} task(s) to {}",
            snapshot.tasks.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Keeps the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: RefCell<Option<StoreSnapshot>>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        let storage = Self::new();
        storage.saved.replace(Some(snapshot));
        storage
    }

    /// Make every following `save` fail, as a full disk would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn saved(&self) -> Option<StoreSnapshot> {
        self.saved.borrow().clone()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<StoreSnapshot>> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        if self.fail_writes.get() {
            return Err(crate::Error::Persistence(
                "storage quota exceeded".to_string(),
            ));
        }
        self.saved.replace(Some(snapshot.clone()));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for &S {
    fn load(&self) -> Result<Option<StoreSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}
