//! Storage layer for the synfire SNN runtime
//!
//! This crate provides the identifier scheme and the persistence
//! infrastructure for very large neural populations: typed 64-bit ids
//! partitioned into disjoint per-kind ranges, self-describing JSON
//! object records, and an object store that keeps a bounded in-memory
//! working set over a durable backend.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod checks;
pub mod error;
pub mod ids;
pub mod record;
pub mod store;

// Record backends
pub mod file;
pub mod memory;

// Re-export essential types
pub use checks::{set_strict_checks, strict_checks};
pub use error::{Result, StorageError};
pub use file::FileBackend;
pub use ids::{IdAllocator, ObjectId, ObjectKind, KIND_RANGE_WIDTH, NUM_KINDS};
pub use memory::MemoryBackend;
pub use record::{decode_record, encode_record, FactoryFn, Persistable, TYPE_FIELD};
pub use store::{CacheStats, ObjectStore, StoreBackend, StoreConfig};

/// Storage crate version for compatibility checking
pub const STORAGE_VERSION: u32 = 1;
