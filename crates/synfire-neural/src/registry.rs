//! Store factory registration for the standard entity set

use std::sync::Arc;

use synfire_storage::{ObjectStore, Persistable};

use crate::axon::Axon;
use crate::dendrite::Dendrite;
use crate::hierarchy::{Brain, Cluster, Column, Hemisphere, Layer, Lobe, Nucleus, Region};
use crate::neuron::Neuron;
use crate::synapse::Synapse;

macro_rules! register {
    ($store:expr, $entity:ty, $tag:literal) => {
        $store.register_factory(
            $tag,
            Arc::new(|record: &str| {
                let entity = <$entity>::from_record(record)?;
                Ok(Arc::new(entity) as Arc<dyn Persistable>)
            }),
        );
    };
}

/// Register deserialization factories for every standard entity type
///
/// Call once at startup, before the store sees read traffic. Records
/// with tags outside this set still need their own factories.
pub fn register_standard_factories(store: &ObjectStore) {
    register!(store, Neuron, "Neuron");
    register!(store, Axon, "Axon");
    register!(store, Dendrite, "Dendrite");
    register!(store, Synapse, "Synapse");
    register!(store, Cluster, "Cluster");
    register!(store, Layer, "Layer");
    register!(store, Column, "Column");
    register!(store, Nucleus, "Nucleus");
    register!(store, Region, "Region");
    register!(store, Lobe, "Lobe");
    register!(store, Hemisphere, "Hemisphere");
    register!(store, Brain, "Brain");
}
