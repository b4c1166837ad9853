//! Connectivity pattern generators
//!
//! Patterns describe how two neuron populations wire together: which
//! pairs connect and with what weight and delay. A pattern only plans
//! [`Connection`]s; [`crate::network::Network::apply_pattern`] turns the
//! plan into synapses. Randomized patterns are seedable for
//! reproducible builds.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use synfire_storage::ObjectId;

/// A planned connection between two neurons
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Presynaptic neuron
    pub source_neuron_id: ObjectId,
    /// Postsynaptic neuron
    pub target_neuron_id: ObjectId,
    /// Synaptic weight
    pub weight: f64,
    /// Synaptic delay (ms)
    pub delay_ms: f64,
}

impl Connection {
    /// Create a planned connection
    pub fn new(source: ObjectId, target: ObjectId, weight: f64, delay_ms: f64) -> Self {
        Self {
            source_neuron_id: source,
            target_neuron_id: target,
            weight,
            delay_ms,
        }
    }
}

/// A 3D position used by spatial connectivity patterns
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpatialPosition {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl SpatialPosition {
    /// Create a position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &SpatialPosition) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Generator of connections between two neuron populations
pub trait ConnectivityPattern {
    /// Plan the connections from `sources` to `targets`
    fn generate_connections(
        &mut self,
        sources: &[ObjectId],
        targets: &[ObjectId],
    ) -> Vec<Connection>;
}

/// Every source connects to every target
#[derive(Debug, Clone)]
pub struct AllToAllPattern {
    weight: f64,
    delay_ms: f64,
}

impl AllToAllPattern {
    /// Create the pattern with uniform weight and delay
    pub fn new(weight: f64, delay_ms: f64) -> Self {
        Self { weight, delay_ms }
    }
}

impl ConnectivityPattern for AllToAllPattern {
    fn generate_connections(
        &mut self,
        sources: &[ObjectId],
        targets: &[ObjectId],
    ) -> Vec<Connection> {
        let mut connections = Vec::with_capacity(sources.len() * targets.len());
        for &source in sources {
            for &target in targets {
                connections.push(Connection::new(source, target, self.weight, self.delay_ms));
            }
        }
        connections
    }
}

/// `source[i]` connects to `target[i]`
///
/// Extra neurons in the longer population are left unconnected.
#[derive(Debug, Clone)]
pub struct OneToOnePattern {
    weight: f64,
    delay_ms: f64,
}

impl OneToOnePattern {
    /// Create the pattern with uniform weight and delay
    pub fn new(weight: f64, delay_ms: f64) -> Self {
        Self { weight, delay_ms }
    }
}

impl ConnectivityPattern for OneToOnePattern {
    fn generate_connections(
        &mut self,
        sources: &[ObjectId],
        targets: &[ObjectId],
    ) -> Vec<Connection> {
        if sources.len() != targets.len() {
            log::warn!(
                "OneToOnePattern: population sizes differ ({} vs {}), pairing the overlap",
                sources.len(),
                targets.len()
            );
        }
        sources
            .iter()
            .zip(targets.iter())
            .map(|(&source, &target)| Connection::new(source, target, self.weight, self.delay_ms))
            .collect()
    }
}

/// All sources converge onto each target
#[derive(Debug, Clone)]
pub struct ManyToOnePattern {
    weight: f64,
    delay_ms: f64,
}

impl ManyToOnePattern {
    /// Create the pattern with uniform weight and delay
    pub fn new(weight: f64, delay_ms: f64) -> Self {
        Self { weight, delay_ms }
    }
}

impl ConnectivityPattern for ManyToOnePattern {
    fn generate_connections(
        &mut self,
        sources: &[ObjectId],
        targets: &[ObjectId],
    ) -> Vec<Connection> {
        let mut connections = Vec::with_capacity(sources.len() * targets.len());
        for &target in targets {
            for &source in sources {
                connections.push(Connection::new(source, target, self.weight, self.delay_ms));
            }
        }
        connections
    }
}

/// Each source-target pair connects independently with a fixed probability
#[derive(Debug)]
pub struct RandomSparsePattern {
    probability: f64,
    weight: f64,
    delay_ms: f64,
    rng: StdRng,
}

impl RandomSparsePattern {
    /// Create the pattern; `probability` is clamped into `[0, 1]`
    pub fn new(probability: f64, weight: f64, delay_ms: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            weight,
            delay_ms,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seed the generator for reproducible wiring
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl ConnectivityPattern for RandomSparsePattern {
    fn generate_connections(
        &mut self,
        sources: &[ObjectId],
        targets: &[ObjectId],
    ) -> Vec<Connection> {
        let mut connections = Vec::new();
        for &source in sources {
            for &target in targets {
                if self.rng.gen::<f64>() < self.probability {
                    connections.push(Connection::new(source, target, self.weight, self.delay_ms));
                }
            }
        }
        connections
    }
}

/// Connection probability falls off with distance as a Gaussian
///
/// `P(d) = exp(-d^2 / (2 sigma^2))`. Neurons without a registered
/// position never connect.
#[derive(Debug)]
pub struct DistanceDependentPattern {
    sigma: f64,
    weight: f64,
    delay_ms: f64,
    positions: HashMap<ObjectId, SpatialPosition>,
    rng: StdRng,
}

impl DistanceDependentPattern {
    /// Create the pattern with a Gaussian falloff width
    pub fn new(sigma: f64, weight: f64, delay_ms: f64) -> Self {
        Self {
            sigma,
            weight,
            delay_ms,
            positions: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Seed the generator for reproducible wiring
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Register a neuron's spatial position
    pub fn set_position(&mut self, neuron_id: ObjectId, position: SpatialPosition) {
        self.positions.insert(neuron_id, position);
    }
}

impl ConnectivityPattern for DistanceDependentPattern {
    fn generate_connections(
        &mut self,
        sources: &[ObjectId],
        targets: &[ObjectId],
    ) -> Vec<Connection> {
        let two_sigma_sq = 2.0 * self.sigma * self.sigma;
        let mut connections = Vec::new();
        for &source in sources {
            let Some(source_pos) = self.positions.get(&source).copied() else {
                continue;
            };
            for &target in targets {
                let Some(target_pos) = self.positions.get(&target).copied() else {
                    continue;
                };
                let distance = source_pos.distance_to(&target_pos);
                let probability = (-(distance * distance) / two_sigma_sq).exp();
                if self.rng.gen::<f64>() < probability {
                    connections.push(Connection::new(source, target, self.weight, self.delay_ms));
                }
            }
        }
        connections
    }
}
