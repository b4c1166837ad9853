//! Neural entity layer for the synfire SNN runtime
//!
//! This crate provides the biological object model: pattern-matching
//! neurons with rolling spike windows, the axon/synapse/dendrite wiring
//! records, binned spike patterns with a family of similarity metrics,
//! and the pluggable pattern-update strategies that govern how a
//! neuron's reference bank evolves.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export essential types from storage
pub use synfire_storage::{
    IdAllocator, ObjectId, ObjectKind, ObjectStore, Persistable, Result as StorageResult,
    StorageError,
};

// Core modules
pub mod axon;
pub mod dendrite;
pub mod error;
pub mod hierarchy;
pub mod learning;
pub mod neuron;
pub mod pattern;
pub mod registry;
pub mod synapse;

// Re-export essential types
pub use axon::Axon;
pub use dendrite::Dendrite;
pub use error::{NeuralError, Result};
pub use hierarchy::{Brain, Cluster, Column, Hemisphere, Layer, Lobe, Nucleus, Region};
pub use learning::{
    available_strategies, create_strategy, AppendStrategy, HybridStatistics, HybridStrategy,
    MergeSimilarStrategy, PatternUpdateStrategy, ReplaceWorstStrategy, SimilarityMetric,
    StrategyConfig,
};
pub use neuron::Neuron;
pub use pattern::{cosine_similarity, BinaryPattern, MAX_BIN_COUNT, PATTERN_BINS};
pub use registry::register_standard_factories;
pub use synapse::{Synapse, WEIGHT_MAX, WEIGHT_MIN};

/// Neural crate version for compatibility checking
pub const NEURAL_VERSION: u32 = 1;
