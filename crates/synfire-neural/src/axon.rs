//! Axon: a neuron's output process fanning out to synapses

use serde::{Deserialize, Serialize};
use std::any::Any;

use synfire_storage::{encode_record, ObjectId, ObjectKind, Persistable};

/// Output process of a neuron, feeding a set of synapses
///
/// Back-link invariant: the source neuron's axon id equals this axon's
/// id. The synapse list deduplicates on insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axon {
    id: ObjectId,
    source_neuron_id: ObjectId,
    synapse_ids: Vec<ObjectId>,
}

impl Axon {
    /// Create an axon for a source neuron
    pub fn new(id: ObjectId, source_neuron_id: ObjectId) -> Self {
        Self {
            id,
            source_neuron_id,
            synapse_ids: Vec::new(),
        }
    }

    /// Axon identifier
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Neuron this axon carries spikes from
    pub fn source_neuron_id(&self) -> ObjectId {
        self.source_neuron_id
    }

    /// Synapses fed by this axon
    pub fn synapse_ids(&self) -> &[ObjectId] {
        &self.synapse_ids
    }

    /// Attach a synapse, deduplicating on insertion
    pub fn add_synapse(&mut self, synapse_id: ObjectId) {
        if self.synapse_ids.contains(&synapse_id) {
            log::warn!("Axon {}: synapse {} already connected", self.id, synapse_id);
            return;
        }
        self.synapse_ids.push(synapse_id);
        log::debug!(
            "Axon {}: added synapse {} (total: {})",
            self.id,
            synapse_id,
            self.synapse_ids.len()
        );
    }

    /// Detach a synapse, reporting whether it was present
    pub fn remove_synapse(&mut self, synapse_id: ObjectId) -> bool {
        if let Some(position) = self.synapse_ids.iter().position(|&s| s == synapse_id) {
            self.synapse_ids.remove(position);
            log::debug!(
                "Axon {}: removed synapse {} (remaining: {})",
                self.id,
                synapse_id,
                self.synapse_ids.len()
            );
            return true;
        }
        log::warn!("Axon {}: synapse {} not found for removal", self.id, synapse_id);
        false
    }

    /// Rebuild from record text
    pub fn from_record(record: &str) -> synfire_storage::Result<Self> {
        synfire_storage::decode_record(record, ObjectKind::Axon.type_tag())
    }
}

impl Persistable for Axon {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn type_tag(&self) -> &'static str {
        ObjectKind::Axon.type_tag()
    }

    fn to_record(&self) -> synfire_storage::Result<String> {
        encode_record(self, self.type_tag())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
