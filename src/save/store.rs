//! Slot store: one text blob per numbered slot on disk
//!
//! Slot `n` lives at `<dir>/<prefix><n>.<ext>` (e.g. `slot_1.json`). There is
//! no index file; a slot exists exactly when its file does.

use super::types::SaveError;
use crate::config::SaveConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SlotStore {
    directory: PathBuf,
    prefix: String,
    extension: String,
    atomic: bool,
}

impl SlotStore {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        SlotStore {
            directory: directory.as_ref().to_path_buf(),
            prefix: "slot_".to_string(),
            extension: "json".to_string(),
            atomic: true,
        }
    }

    pub fn from_config(config: &SaveConfig) -> Self {
        SlotStore {
            directory: config.resolve_save_directory(),
            prefix: config.file_prefix.clone(),
            extension: config.file_extension.clone(),
            atomic: config.atomic_writes,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, slot: u8) -> PathBuf {
        self.directory
            .join(format!("{}{}.{}", self.prefix, slot, self.extension))
    }

    /// Writes `blob` to the slot, replacing any previous save
    ///
    /// The save directory is created on demand.
    pub fn write(&self, slot: u8, blob: &str) -> Result<PathBuf, SaveError> {
        let path = self.path_for(slot);
        if self.atomic {
            write_text_atomic(&path, blob)?;
        } else {
            fs::create_dir_all(&self.directory)?;
            fs::write(&path, blob)?;
        }
        Ok(path)
    }

    /// Reads the slot's blob; `Ok(None)` if the slot is empty
    pub fn read(&self, slot: u8) -> Result<Option<String>, SaveError> {
        match fs::read_to_string(self.path_for(slot)) {
            Ok(blob) => Ok(Some(blob)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(SaveError::Storage(error)),
        }
    }

    pub fn exists(&self, slot: u8) -> bool {
        self.path_for(slot).is_file()
    }

    /// Deletes the slot's file. Returns false if the slot was already empty.
    pub fn delete(&self, slot: u8) -> Result<bool, SaveError> {
        match fs::remove_file(self.path_for(slot)) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(SaveError::Storage(error)),
        }
    }
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text.as_bytes())?;
    replace_file(&tmp_path, path)
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    // rename replaces the target in one step; the old save survives a failure
    if let Err(error) = fs::rename(tmp_path, final_path) {
        let _ = fs::remove_file(tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("slot.tmp");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_slot() {
        let store = SlotStore::new("/saves");
        assert_eq!(store.path_for(2), PathBuf::from("/saves/slot_2.json"));
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path().join("nested").join("saves"));

        let path = store.write(1, "{}").unwrap();

        assert!(path.is_file());
        assert!(store.exists(1));
        assert_eq!(store.read(1).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_read_missing_slot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());

        assert!(store.read(3).unwrap().is_none());
        assert!(!store.exists(3));
    }

    #[test]
    fn test_overwrite_leaves_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());

        store.write(2, "first").unwrap();
        store.write(2, "second").unwrap();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(store.read(2).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_failed_atomic_write_keeps_old_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        store.write(1, "old").unwrap();
        fs::create_dir(temp_path_for(&store.path_for(1))).unwrap();

        assert!(matches!(store.write(1, "new"), Err(SaveError::Storage(_))));
        assert_eq!(store.read(1).unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        store.write(1, "x").unwrap();

        assert!(store.delete(1).unwrap());
        assert!(!store.delete(1).unwrap());
        assert!(!store.exists(1));
    }

    #[test]
    fn test_non_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let config = SaveConfig {
            atomic_writes: false,
            ..SaveConfig::in_directory(dir.path())
        };
        let store = SlotStore::from_config(&config);

        store.write(3, "plain").unwrap();
        assert_eq!(store.read(3).unwrap().as_deref(), Some("plain"));
    }

    #[test]
    fn test_read_directory_as_slot_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        fs::create_dir_all(store.path_for(1)).unwrap();

        assert!(matches!(store.read(1), Err(SaveError::Storage(_))));
    }
}
