//! Spike runtime for the synfire SNN framework
//!
//! This crate provides the real-time core: a rotating time-wheel spike
//! scheduler with a background tick loop, a fixed worker pool for
//! asynchronous spike delivery, STDP weight updates on retrograde
//! events, and a network driver that turns neuron firings into
//! downstream deliveries.

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export essential types from the lower layers
pub use synfire_neural::{
    Axon, Dendrite, NeuralError, Neuron, StrategyConfig, Synapse, WEIGHT_MAX, WEIGHT_MIN,
};
pub use synfire_storage::{IdAllocator, ObjectId, ObjectKind, StorageError};

// Core modules
pub mod connectivity;
pub mod error;
pub mod event;
pub mod network;
pub mod pool;
pub mod scheduler;
pub mod stdp;

// Re-export essential types
pub use connectivity::{
    AllToAllPattern, Connection, ConnectivityPattern, DistanceDependentPattern, ManyToOnePattern,
    OneToOnePattern, RandomSparsePattern, SpatialPosition,
};
pub use error::{Result, RuntimeError};
pub use event::{ActionPotential, Event, RetrogradeActionPotential};
pub use network::Network;
pub use pool::{TaskHandle, WorkerPool};
pub use scheduler::{SchedulerConfig, SpikeScheduler, SpikeSink, TimingStats};
pub use stdp::{StdpParams, StdpStats};

/// Runtime crate version for compatibility checking
pub const RUNTIME_VERSION: u32 = 1;

/// Default scheduler slot width (ms)
pub const DEFAULT_DT_MS: f64 = 1.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_integration() {
        let stdp = StdpParams::default();
        assert!(stdp.a_plus > 0.0);

        let config = SchedulerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dt_ms, DEFAULT_DT_MS);

        let pool = WorkerPool::new(2);
        assert_eq!(pool.size(), 2);
    }
}
