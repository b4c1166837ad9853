//! In-memory record backend

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::Result;
use crate::ids::ObjectId;
use crate::store::StoreBackend;

/// In-memory backend holding record text per id
///
/// Used for tests and for stores that do not need durability.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<ObjectId, String>>,
}

impl MemoryBackend {
    /// Create a new empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the backend holds no records
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl StoreBackend for MemoryBackend {
    fn read(&self, id: ObjectId) -> Result<Option<String>> {
        Ok(self.records.lock().get(&id).cloned())
    }

    fn write(&self, id: ObjectId, record: &str) -> Result<()> {
        self.records.lock().insert(id, record.to_string());
        Ok(())
    }

    fn remove(&self, id: ObjectId) -> Result<bool> {
        Ok(self.records.lock().remove(&id).is_some())
    }
}
