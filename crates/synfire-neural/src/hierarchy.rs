//! Anatomical containment hierarchy
//!
//! Brain → Hemispheres → Lobes → Regions → Nuclei → Columns → Layers →
//! Clusters → Neurons. Each level is a persistable record holding the
//! ids of its children; membership is by id only, so the hierarchy stays
//! acyclic and store-friendly.

use serde::{Deserialize, Serialize};
use std::any::Any;

use synfire_storage::{encode_record, ObjectId, ObjectKind, Persistable};

macro_rules! containment_entity {
    (
        $(#[$outer:meta])*
        $name:ident, $kind:expr, $children:ident
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            id: ObjectId,
            $children: Vec<ObjectId>,
        }

        impl $name {
            /// Create an empty container
            pub fn new(id: ObjectId) -> Self {
                Self {
                    id,
                    $children: Vec::new(),
                }
            }

            /// Container identifier
            pub fn id(&self) -> ObjectId {
                self.id
            }

            /// Child identifiers in insertion order
            pub fn children(&self) -> &[ObjectId] {
                &self.$children
            }

            /// Number of children
            pub fn len(&self) -> usize {
                self.$children.len()
            }

            /// Whether the container has no children
            pub fn is_empty(&self) -> bool {
                self.$children.is_empty()
            }

            /// Add a child id, deduplicating on insertion
            pub fn add(&mut self, child_id: ObjectId) {
                if self.$children.contains(&child_id) {
                    log::warn!(
                        "{} {}: child {} already present",
                        self.type_tag(),
                        self.id,
                        child_id
                    );
                    return;
                }
                self.$children.push(child_id);
            }

            /// Remove a child id, reporting whether it was present
            pub fn remove(&mut self, child_id: ObjectId) -> bool {
                if let Some(position) = self.$children.iter().position(|&c| c == child_id) {
                    self.$children.remove(position);
                    return true;
                }
                false
            }

            /// Child at an index, if present
            pub fn child(&self, index: usize) -> Option<ObjectId> {
                self.$children.get(index).copied()
            }

            /// Drop all children
            pub fn clear(&mut self) {
                self.$children.clear();
            }

            /// Rebuild from record text
            pub fn from_record(record: &str) -> synfire_storage::Result<Self> {
                synfire_storage::decode_record(record, $kind.type_tag())
            }
        }

        impl Persistable for $name {
            fn id(&self) -> ObjectId {
                self.id
            }

            fn type_tag(&self) -> &'static str {
                $kind.type_tag()
            }

            fn to_record(&self) -> synfire_storage::Result<String> {
                encode_record(self, self.type_tag())
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

containment_entity!(
    /// Group of neurons
    Cluster,
    ObjectKind::Cluster,
    neuron_ids
);

containment_entity!(
    /// Group of clusters
    Layer,
    ObjectKind::Layer,
    cluster_ids
);

containment_entity!(
    /// Group of layers
    Column,
    ObjectKind::Column,
    layer_ids
);

containment_entity!(
    /// Group of columns
    Nucleus,
    ObjectKind::Nucleus,
    column_ids
);

containment_entity!(
    /// Group of nuclei
    Region,
    ObjectKind::Region,
    nucleus_ids
);

containment_entity!(
    /// Group of regions
    Lobe,
    ObjectKind::Lobe,
    region_ids
);

containment_entity!(
    /// Group of lobes
    Hemisphere,
    ObjectKind::Hemisphere,
    lobe_ids
);

containment_entity!(
    /// Top-level container of hemispheres
    Brain,
    ObjectKind::Brain,
    hemisphere_ids
);
