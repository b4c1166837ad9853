//! Synapse: a weighted, delayed axon-to-dendrite connection

use serde::{Deserialize, Serialize};
use std::any::Any;

use synfire_storage::{encode_record, ObjectId, ObjectKind, Persistable};

use crate::error::{NeuralError, Result};

/// Minimum synaptic weight
pub const WEIGHT_MIN: f64 = 0.0;

/// Maximum synaptic weight
pub const WEIGHT_MAX: f64 = 2.0;

/// Connection from an upstream axon to a downstream dendrite
///
/// The weight is finite and clamped to `[WEIGHT_MIN, WEIGHT_MAX]`; the
/// transmission delay is strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synapse {
    id: ObjectId,
    axon_id: ObjectId,
    dendrite_id: ObjectId,
    weight: f64,
    delay: f64,
}

impl Synapse {
    /// Create a synapse with validated weight and delay
    pub fn new(
        id: ObjectId,
        axon_id: ObjectId,
        dendrite_id: ObjectId,
        weight: f64,
        delay_ms: f64,
    ) -> Result<Self> {
        if !weight.is_finite() {
            return Err(NeuralError::invalid_parameter(
                "weight",
                weight.to_string(),
                "finite",
            ));
        }
        if !delay_ms.is_finite() || delay_ms <= 0.0 {
            return Err(NeuralError::invalid_parameter(
                "delay_ms",
                delay_ms.to_string(),
                "> 0.0",
            ));
        }

        Ok(Self {
            id,
            axon_id,
            dendrite_id,
            weight: weight.clamp(WEIGHT_MIN, WEIGHT_MAX),
            delay: delay_ms,
        })
    }

    /// Synapse identifier
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Upstream axon
    pub fn axon_id(&self) -> ObjectId {
        self.axon_id
    }

    /// Downstream dendrite
    pub fn dendrite_id(&self) -> ObjectId {
        self.dendrite_id
    }

    /// Current synaptic weight
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Set the weight, clamping into `[WEIGHT_MIN, WEIGHT_MAX]`
    ///
    /// Non-finite values are rejected and leave the weight unchanged.
    pub fn set_weight(&mut self, weight: f64) {
        if !weight.is_finite() {
            log::warn!("Synapse {}: ignoring non-finite weight {}", self.id, weight);
            return;
        }
        self.weight = weight.clamp(WEIGHT_MIN, WEIGHT_MAX);
    }

    /// Transmission delay in milliseconds
    pub fn delay_ms(&self) -> f64 {
        self.delay
    }

    /// Rebuild from record text
    pub fn from_record(record: &str) -> synfire_storage::Result<Self> {
        synfire_storage::decode_record(record, ObjectKind::Synapse.type_tag())
    }
}

impl Persistable for Synapse {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn type_tag(&self) -> &'static str {
        ObjectKind::Synapse.type_tag()
    }

    fn to_record(&self) -> synfire_storage::Result<String> {
        encode_record(self, self.type_tag())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
