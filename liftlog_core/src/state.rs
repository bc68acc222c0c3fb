//! Ledger persistence with file locking.
//!
//! The ledger lives in one JSON file. Writers hold an exclusive lock on a
//! sidecar `.lock` file for the whole load-modify-save, which serializes
//! every mutation (including two recalculations of the same exercise).
//! Saves go through a temp file and an atomic rename.

use crate::store::Ledger;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// On-disk location of a [`Ledger`]
#[derive(Clone, Debug)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/ledger.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("ledger.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Load the ledger with a shared lock.
    ///
    /// A missing file is an empty ledger. An unreadable or corrupt file is
    /// an error: writing defaults over it would lose the user's history.
    pub fn load(&self) -> Result<Ledger> {
        if !self.path.exists() {
            tracing::info!("No ledger file at {:?}, starting empty", self.path);
            return Ok(Ledger::default());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let ledger: Ledger = serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("Failed to parse ledger {:?}: {}", self.path, e);
            Error::Storage(format!("corrupt ledger file {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            "Loaded ledger from {:?}: {} workouts, {} sets, {} records",
            self.path,
            ledger.workouts.len(),
            ledger.sets.len(),
            ledger.records.len()
        );
        Ok(ledger)
    }

    /// Atomically replace the ledger file with `ledger`
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let parent = self.ensure_parent_dir()?;

        // Temp file in the same directory so the rename stays atomic
        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, ledger)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved ledger to {:?}", self.path);
        Ok(())
    }

    /// Load, modify and save under an exclusive lock.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Ledger) -> Result<T>,
    {
        self.ensure_parent_dir()?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let result = self.load().and_then(|mut ledger| {
            let value = f(&mut ledger)?;
            self.save(&ledger)?;
            Ok(value)
        });

        lock.unlock()?;
        result
    }

    fn ensure_parent_dir(&self) -> Result<&Path> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Storage(format!("{:?} has no parent directory", self.path)))?;
        std::fs::create_dir_all(parent)?;
        Ok(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exercise;
    use uuid::Uuid;

    fn exercise(name: &str) -> Exercise {
        Exercise {
            id: Uuid::new_v4(),
            owner: Some("me".into()),
            name: name.into(),
            description: String::new(),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::in_dir(temp_dir.path());

        let mut ledger = Ledger::default();
        ledger.exercises.push(exercise("Front Squat"));
        file.save(&ledger).unwrap();

        assert_eq!(file.load().unwrap(), ledger);
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::in_dir(&temp_dir.path().join("nested"));

        let ledger = file.load().unwrap();
        assert_eq!(ledger, Ledger::default());
    }

    #[test]
    fn test_corrupted_ledger_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::in_dir(temp_dir.path());
        std::fs::write(file.path(), "{ invalid json }").unwrap();

        assert!(matches!(file.load(), Err(Error::Storage(_))));
        // and the broken file is left for inspection
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            "{ invalid json }"
        );
    }

    #[test]
    fn test_update_persists_on_success() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::in_dir(temp_dir.path());

        let count = file
            .update(|ledger| {
                ledger.exercises.push(exercise("Pendlay Row"));
                Ok(ledger.exercises.len())
            })
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(file.load().unwrap().exercises[0].name, "Pendlay Row");
    }

    #[test]
    fn test_update_writes_nothing_on_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::in_dir(temp_dir.path());
        file.update(|ledger| {
            ledger.exercises.push(exercise("Kept"));
            Ok(())
        })
        .unwrap();

        let result: Result<()> = file.update(|ledger| {
            ledger.exercises.clear();
            Err(Error::Other("abort".into()))
        });

        assert!(result.is_err());
        assert_eq!(file.load().unwrap().exercises.len(), 1);
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::in_dir(temp_dir.path());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let file = file.clone();
                std::thread::spawn(move || {
                    file.update(|ledger| {
                        ledger.exercises.push(exercise(&format!("Lift {}", i)));
                        Ok(())
                    })
                    .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(file.load().unwrap().exercises.len(), 8);
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = LedgerFile::in_dir(temp_dir.path());
        file.save(&Ledger::default()).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "ledger.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only ledger.json, found extras: {:?}",
            extras
        );
    }
}
