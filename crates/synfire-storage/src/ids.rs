//! Typed 64-bit identifiers and the per-kind allocator
//!
//! Every neural object carries a globally unique `u64` identifier. The id
//! space is partitioned into twelve disjoint ranges of 10^14 values, one
//! per object kind, so the kind of any id can be recovered with a range
//! test and no extra storage.

use core::fmt;

use parking_lot::Mutex;

use crate::error::{Result, StorageError};

/// Width of each kind's identifier range (10^14 values)
pub const KIND_RANGE_WIDTH: u64 = 100_000_000_000_000;

/// Number of object kinds with reserved id ranges
pub const NUM_KINDS: usize = 12;

/// Kinds of neural objects, each owning a contiguous id range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKind {
    /// Pattern-matching neuron
    Neuron,
    /// Output process of a neuron
    Axon,
    /// Input process of a neuron
    Dendrite,
    /// Axon-to-dendrite connection with weight and delay
    Synapse,
    /// Group of neurons
    Cluster,
    /// Group of clusters
    Layer,
    /// Group of layers
    Column,
    /// Group of columns
    Nucleus,
    /// Group of nuclei
    Region,
    /// Group of regions
    Lobe,
    /// Group of lobes
    Hemisphere,
    /// Top-level container of hemispheres
    Brain,
}

impl ObjectKind {
    /// All kinds in range order
    pub const ALL: [ObjectKind; NUM_KINDS] = [
        ObjectKind::Neuron,
        ObjectKind::Axon,
        ObjectKind::Dendrite,
        ObjectKind::Synapse,
        ObjectKind::Cluster,
        ObjectKind::Layer,
        ObjectKind::Column,
        ObjectKind::Nucleus,
        ObjectKind::Region,
        ObjectKind::Lobe,
        ObjectKind::Hemisphere,
        ObjectKind::Brain,
    ];

    /// Zero-based index of this kind in range order
    pub const fn index(self) -> usize {
        self as usize
    }

    /// First identifier in this kind's range
    pub const fn range_start(self) -> u64 {
        (self.index() as u64 + 1) * KIND_RANGE_WIDTH
    }

    /// Last identifier in this kind's range (inclusive)
    pub const fn range_end(self) -> u64 {
        self.range_start() + KIND_RANGE_WIDTH - 1
    }

    /// String tag used in serialized records
    pub const fn type_tag(self) -> &'static str {
        match self {
            ObjectKind::Neuron => "Neuron",
            ObjectKind::Axon => "Axon",
            ObjectKind::Dendrite => "Dendrite",
            ObjectKind::Synapse => "Synapse",
            ObjectKind::Cluster => "Cluster",
            ObjectKind::Layer => "Layer",
            ObjectKind::Column => "Column",
            ObjectKind::Nucleus => "Nucleus",
            ObjectKind::Region => "Region",
            ObjectKind::Lobe => "Lobe",
            ObjectKind::Hemisphere => "Hemisphere",
            ObjectKind::Brain => "Brain",
        }
    }

    /// Resolve a record type tag back to a kind
    pub fn from_type_tag(tag: &str) -> Option<ObjectKind> {
        ObjectKind::ALL.iter().copied().find(|k| k.type_tag() == tag)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// Unique identifier for a neural object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Create a new object ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Recover the kind of this identifier by range test
    ///
    /// Returns `None` for values outside every kind's range.
    pub fn kind(&self) -> Option<ObjectKind> {
        if self.0 < KIND_RANGE_WIDTH {
            return None;
        }
        let index = (self.0 / KIND_RANGE_WIDTH - 1) as usize;
        ObjectKind::ALL.get(index).copied()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

mod serde_impls {
    use super::*;
    use serde::{Deserialize, Serialize};

    impl Serialize for ObjectId {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            self.0.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for ObjectId {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let id = u64::deserialize(deserializer)?;
            Ok(ObjectId::new(id))
        }
    }
}

/// Monotonic per-kind identifier allocator
///
/// One counter per kind behind a single mutex. Allocation is O(1) and
/// minted ids are unique for the lifetime of the process unless
/// [`IdAllocator::reset`] is called.
#[derive(Debug)]
pub struct IdAllocator {
    counters: Mutex<[u64; NUM_KINDS]>,
}

impl IdAllocator {
    /// Create a new allocator with every counter at its range start
    pub fn new() -> Self {
        let mut counters = [0u64; NUM_KINDS];
        for kind in ObjectKind::ALL {
            counters[kind.index()] = kind.range_start();
        }
        Self {
            counters: Mutex::new(counters),
        }
    }

    /// Mint the next identifier for a kind
    ///
    /// Fails with [`StorageError::IdSpaceExhausted`] once the kind's
    /// 10^14-value range is used up.
    pub fn next(&self, kind: ObjectKind) -> Result<ObjectId> {
        let mut counters = self.counters.lock();
        let counter = &mut counters[kind.index()];
        if *counter > kind.range_end() {
            return Err(StorageError::IdSpaceExhausted {
                kind,
                max: kind.range_end(),
            });
        }
        let id = ObjectId::new(*counter);
        *counter += 1;
        Ok(id)
    }

    /// Number of identifiers minted so far for a kind
    pub fn count(&self, kind: ObjectKind) -> u64 {
        let counters = self.counters.lock();
        counters[kind.index()] - kind.range_start()
    }

    /// Next identifier value that would be minted for a kind
    pub fn current(&self, kind: ObjectKind) -> u64 {
        let counters = self.counters.lock();
        counters[kind.index()]
    }

    /// Reset every counter to its range start
    ///
    /// Test use only: previously minted ids are back in mint territory
    /// afterwards, so callers must purge all state that references them.
    pub fn reset(&self) {
        let mut counters = self.counters.lock();
        for kind in ObjectKind::ALL {
            counters[kind.index()] = kind.range_start();
        }
        log::info!("IdAllocator reset: all counters back to range starts");
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
