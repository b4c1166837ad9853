//! Spike events carried by the scheduler's time wheel

use synfire_storage::ObjectId;

/// Forward spike: excites a dendrite at a future simulation time
///
/// The weight is captured from the synapse at emission time, so later
/// plasticity does not retroactively change an in-flight spike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionPotential {
    /// Scheduled delivery time (ms)
    pub scheduled_time_ms: f64,
    /// Target dendrite
    pub dendrite_id: ObjectId,
    /// Weight carried from the emitting synapse
    pub weight: f64,
}

impl ActionPotential {
    /// Create a forward spike
    pub fn new(scheduled_time_ms: f64, dendrite_id: ObjectId, weight: f64) -> Self {
        Self {
            scheduled_time_ms,
            dendrite_id,
            weight,
        }
    }
}

/// Retrograde spike: carries a temporal offset back to a synapse for STDP
///
/// `temporal_offset_ms` is the post-synaptic neuron's firing time minus
/// the dispatch time of the spike the synapse delivered; positive means
/// potentiation, negative means depression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrogradeActionPotential {
    /// Scheduled arrival time (ms)
    pub scheduled_time_ms: f64,
    /// Target synapse
    pub synapse_id: ObjectId,
    /// Post-fire minus dispatch time (ms)
    pub temporal_offset_ms: f64,
}

impl RetrogradeActionPotential {
    /// Create a retrograde spike
    pub fn new(scheduled_time_ms: f64, synapse_id: ObjectId, temporal_offset_ms: f64) -> Self {
        Self {
            scheduled_time_ms,
            synapse_id,
            temporal_offset_ms,
        }
    }
}

/// An event owned by exactly one time slot until delivery
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Forward spike toward a dendrite
    Forward(ActionPotential),
    /// Retrograde spike toward a synapse
    Retrograde(RetrogradeActionPotential),
}

impl Event {
    /// Event-type tag, readable without matching
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Forward(_) => "ActionPotential",
            Event::Retrograde(_) => "RetrogradeActionPotential",
        }
    }

    /// Scheduled simulation time of this event
    pub fn scheduled_time_ms(&self) -> f64 {
        match self {
            Event::Forward(spike) => spike.scheduled_time_ms,
            Event::Retrograde(spike) => spike.scheduled_time_ms,
        }
    }
}
