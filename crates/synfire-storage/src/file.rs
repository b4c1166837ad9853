//! File-based record backend

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ids::ObjectId;
use crate::store::StoreBackend;

/// File-based backend storing one JSON record file per object
///
/// Records live under the base directory as `obj_<id>.json` with the id
/// rendered in fixed-width hex, so directory listings sort by id.
#[derive(Debug)]
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `base_dir`, creating it if needed
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Directory this backend writes into
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, id: ObjectId) -> PathBuf {
        self.base_dir.join(format!("obj_{:016x}.json", id.raw()))
    }
}

impl StoreBackend for FileBackend {
    fn read(&self, id: ObjectId) -> Result<Option<String>> {
        match std::fs::read_to_string(self.record_path(id)) {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, id: ObjectId, record: &str) -> Result<()> {
        std::fs::write(self.record_path(id), record)?;
        Ok(())
    }

    fn remove(&self, id: ObjectId) -> Result<bool> {
        match std::fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backend_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("objects");
        let backend = FileBackend::new(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(backend.base_dir(), nested.as_path());
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(temp_dir.path()).unwrap();
        let id = ObjectId::new(400_000_000_000_003);

        assert_eq!(backend.read(id).unwrap(), None);

        backend.write(id, "{\"type\":\"Synapse\"}").unwrap();
        assert_eq!(
            backend.read(id).unwrap().as_deref(),
            Some("{\"type\":\"Synapse\"}")
        );

        // Overwrite replaces the record
        backend.write(id, "{\"type\":\"Synapse\",\"weight\":1.0}").unwrap();
        assert!(backend.read(id).unwrap().unwrap().contains("weight"));

        assert!(backend.remove(id).unwrap());
        assert!(!backend.remove(id).unwrap());
    }
}
