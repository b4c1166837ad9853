//! Dendrite: a neuron's input process

use serde::{Deserialize, Serialize};
use std::any::Any;

use synfire_storage::{encode_record, ObjectId, ObjectKind, Persistable};

/// Input process delivering spikes to its target neuron
///
/// Back-link invariant: the target neuron's dendrite set contains this
/// dendrite's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dendrite {
    id: ObjectId,
    target_neuron_id: ObjectId,
}

impl Dendrite {
    /// Create a dendrite for a target neuron
    pub fn new(id: ObjectId, target_neuron_id: ObjectId) -> Self {
        Self {
            id,
            target_neuron_id,
        }
    }

    /// Dendrite identifier
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Neuron this dendrite delivers into
    pub fn target_neuron_id(&self) -> ObjectId {
        self.target_neuron_id
    }

    /// Rebuild from record text
    pub fn from_record(record: &str) -> synfire_storage::Result<Self> {
        synfire_storage::decode_record(record, ObjectKind::Dendrite.type_tag())
    }
}

impl Persistable for Dendrite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn type_tag(&self) -> &'static str {
        ObjectKind::Dendrite.type_tag()
    }

    fn to_record(&self) -> synfire_storage::Result<String> {
        encode_record(self, self.type_tag())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
