//! Network driver: wiring, registration, and firing propagation
//!
//! The scheduler only delivers events; it is the network that decides
//! what a firing neuron means. The driver owns the neuron handles and
//! wiring records, registers dendrite endpoints and synapses with the
//! scheduler, and consumes the neuron's fired signal: a neuron firing at
//! `t` schedules a forward spike through every synapse on its axon at
//! `t + delay` carrying the synapse's current weight, plus retrograde
//! STDP events back to the synapses that fed it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use synfire_neural::{Axon, Dendrite, Neuron, Synapse};
use synfire_storage::{IdAllocator, ObjectId, ObjectKind};

use crate::connectivity::ConnectivityPattern;
use crate::error::{Result, RuntimeError};
use crate::event::{ActionPotential, RetrogradeActionPotential};
use crate::scheduler::{SpikeScheduler, SpikeSink};

struct NetworkShared {
    scheduler: Arc<SpikeScheduler>,
    allocator: Arc<IdAllocator>,
    neurons: Mutex<HashMap<ObjectId, Arc<Mutex<Neuron>>>>,
    axons: Mutex<HashMap<ObjectId, Axon>>,
    dendrites: Mutex<HashMap<ObjectId, Dendrite>>,
    synapses: Mutex<HashMap<ObjectId, Arc<Mutex<Synapse>>>>,
    /// Synapses delivering into each neuron
    incoming: Mutex<HashMap<ObjectId, Vec<ObjectId>>>,
    /// Most recent dispatch (arrival) time per synapse
    last_dispatch: Mutex<HashMap<ObjectId, f64>>,
}

impl NetworkShared {
    /// Propagate a neuron firing at `fire_time_ms`
    fn propagate_firing(&self, neuron_id: ObjectId, fire_time_ms: f64) {
        self.propagate_forward(neuron_id, fire_time_ms);
        self.post_retrograde(neuron_id, fire_time_ms);
    }

    fn propagate_forward(&self, neuron_id: ObjectId, fire_time_ms: f64) {
        let axon_id = {
            let neurons = self.neurons.lock();
            match neurons.get(&neuron_id) {
                Some(neuron) => neuron.lock().axon_id(),
                None => None,
            }
        };
        let Some(axon_id) = axon_id else {
            return;
        };

        let synapse_ids: Vec<ObjectId> = {
            let axons = self.axons.lock();
            match axons.get(&axon_id) {
                Some(axon) => axon.synapse_ids().to_vec(),
                None => return,
            }
        };

        // Delivery runs behind the clock, so a nominally due spike may
        // already be in a consumed slot; push it to the next open one
        let floor = self.scheduler.current_time_ms() + self.scheduler.dt_ms();

        for synapse_id in synapse_ids {
            let (dendrite_id, weight, delay_ms) = {
                let synapses = self.synapses.lock();
                match synapses.get(&synapse_id) {
                    Some(synapse) => {
                        let synapse = synapse.lock();
                        (synapse.dendrite_id(), synapse.weight(), synapse.delay_ms())
                    }
                    None => continue,
                }
            };

            let arrival = (fire_time_ms + delay_ms).max(floor);
            match self
                .scheduler
                .schedule_spike(ActionPotential::new(arrival, dendrite_id, weight))
            {
                Ok(()) => {
                    self.last_dispatch.lock().insert(synapse_id, arrival);
                }
                Err(err) => {
                    log::warn!(
                        "Network: dropped forward spike through synapse {}: {}",
                        synapse_id,
                        err
                    );
                }
            }
        }
    }

    fn post_retrograde(&self, neuron_id: ObjectId, fire_time_ms: f64) {
        let incoming: Vec<ObjectId> = {
            let incoming = self.incoming.lock();
            incoming.get(&neuron_id).cloned().unwrap_or_default()
        };
        if incoming.is_empty() {
            return;
        }

        let arrival = self.scheduler.current_time_ms() + self.scheduler.dt_ms();
        let dispatch_times = self.last_dispatch.lock();
        for synapse_id in incoming {
            let Some(&dispatch_ms) = dispatch_times.get(&synapse_id) else {
                continue;
            };
            let offset = fire_time_ms - dispatch_ms;
            if let Err(err) = self.scheduler.schedule_retrograde_spike(
                RetrogradeActionPotential::new(arrival, synapse_id, offset),
            ) {
                log::warn!(
                    "Network: dropped retrograde spike for synapse {}: {}",
                    synapse_id,
                    err
                );
            }
        }
    }
}

/// Endpoint registered with the scheduler for one dendrite
///
/// Delivers into the target neuron and, when the neuron fires, hands the
/// firing back to the network for propagation. The network reference is
/// weak so the scheduler's registry never keeps a dropped network alive.
struct NeuronEndpoint {
    neuron_id: ObjectId,
    neuron: Arc<Mutex<Neuron>>,
    network: Weak<NetworkShared>,
}

impl SpikeSink for NeuronEndpoint {
    fn receive_spike(&self, spike: &ActionPotential) {
        let fired = self.neuron.lock().insert_spike(spike.scheduled_time_ms);
        if fired {
            if let Some(network) = self.network.upgrade() {
                network.propagate_firing(self.neuron_id, spike.scheduled_time_ms);
            }
        }
    }
}

/// A scheduler-backed network of pattern-matching neurons
pub struct Network {
    shared: Arc<NetworkShared>,
}

impl Network {
    /// Create a network driving the given scheduler
    pub fn new(scheduler: Arc<SpikeScheduler>, allocator: Arc<IdAllocator>) -> Self {
        Self {
            shared: Arc::new(NetworkShared {
                scheduler,
                allocator,
                neurons: Mutex::new(HashMap::new()),
                axons: Mutex::new(HashMap::new()),
                dendrites: Mutex::new(HashMap::new()),
                synapses: Mutex::new(HashMap::new()),
                incoming: Mutex::new(HashMap::new()),
                last_dispatch: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Create a neuron with its axon and add both to the network
    pub fn add_neuron(
        &self,
        window_size_ms: f64,
        similarity_threshold: f64,
        max_patterns: usize,
    ) -> Result<ObjectId> {
        let neuron_id = self.shared.allocator.next(ObjectKind::Neuron)?;
        let axon_id = self.shared.allocator.next(ObjectKind::Axon)?;

        let mut neuron = Neuron::new(neuron_id, window_size_ms, similarity_threshold, max_patterns)?;
        neuron.set_axon(axon_id);

        self.shared
            .neurons
            .lock()
            .insert(neuron_id, Arc::new(Mutex::new(neuron)));
        self.shared
            .axons
            .lock()
            .insert(axon_id, Axon::new(axon_id, neuron_id));

        log::debug!("Network: created neuron {} with axon {}", neuron_id, axon_id);
        Ok(neuron_id)
    }

    /// Handle to a neuron, if present
    pub fn neuron(&self, neuron_id: ObjectId) -> Option<Arc<Mutex<Neuron>>> {
        self.shared.neurons.lock().get(&neuron_id).cloned()
    }

    /// Handle to a synapse, if present
    pub fn synapse(&self, synapse_id: ObjectId) -> Option<Arc<Mutex<Synapse>>> {
        self.shared.synapses.lock().get(&synapse_id).cloned()
    }

    /// Connect two neurons: pre's axon → new synapse → new dendrite → post
    ///
    /// Maintains the back-link invariants (the post neuron's dendrite set
    /// gains the dendrite, the pre axon's synapse list gains the synapse)
    /// and registers both ends with the scheduler. Returns the synapse id.
    pub fn connect(
        &self,
        pre_neuron_id: ObjectId,
        post_neuron_id: ObjectId,
        weight: f64,
        delay_ms: f64,
    ) -> Result<ObjectId> {
        let pre_axon_id = {
            let neurons = self.shared.neurons.lock();
            let pre = neurons
                .get(&pre_neuron_id)
                .ok_or(RuntimeError::UnknownEntity {
                    id: pre_neuron_id.raw(),
                })?;
            if !neurons.contains_key(&post_neuron_id) {
                return Err(RuntimeError::UnknownEntity {
                    id: post_neuron_id.raw(),
                });
            }
            let axon_id = pre.lock().axon_id().ok_or(RuntimeError::UnknownEntity {
                id: pre_neuron_id.raw(),
            })?;
            axon_id
        };

        let dendrite_id = self.attach_input(post_neuron_id)?;
        let synapse_id = self.shared.allocator.next(ObjectKind::Synapse)?;
        let synapse = Arc::new(Mutex::new(Synapse::new(
            synapse_id,
            pre_axon_id,
            dendrite_id,
            weight,
            delay_ms,
        )?));

        if let Some(axon) = self.shared.axons.lock().get_mut(&pre_axon_id) {
            axon.add_synapse(synapse_id);
        }
        self.shared
            .synapses
            .lock()
            .insert(synapse_id, Arc::clone(&synapse));
        self.shared
            .incoming
            .lock()
            .entry(post_neuron_id)
            .or_default()
            .push(synapse_id);
        self.shared.scheduler.register_synapse(synapse);

        log::debug!(
            "Network: connected {} -> {} via synapse {} (dendrite {})",
            pre_neuron_id,
            post_neuron_id,
            synapse_id,
            dendrite_id
        );
        Ok(synapse_id)
    }

    /// Create a free dendrite on a neuron and register its endpoint
    ///
    /// Used both by [`Network::connect`] and for external stimulus
    /// injection. Returns the dendrite id.
    pub fn attach_input(&self, neuron_id: ObjectId) -> Result<ObjectId> {
        let neuron = self
            .neuron(neuron_id)
            .ok_or(RuntimeError::UnknownEntity {
                id: neuron_id.raw(),
            })?;

        let dendrite_id = self.shared.allocator.next(ObjectKind::Dendrite)?;
        neuron.lock().add_dendrite(dendrite_id);
        self.shared
            .dendrites
            .lock()
            .insert(dendrite_id, Dendrite::new(dendrite_id, neuron_id));

        let endpoint = NeuronEndpoint {
            neuron_id,
            neuron,
            network: Arc::downgrade(&self.shared),
        };
        self.shared
            .scheduler
            .register_dendrite(dendrite_id, Arc::new(endpoint));
        Ok(dendrite_id)
    }

    /// Schedule an external stimulus spike into a dendrite
    pub fn inject_spike(&self, dendrite_id: ObjectId, time_ms: f64, weight: f64) -> Result<()> {
        self.shared
            .scheduler
            .schedule_spike(ActionPotential::new(time_ms, dendrite_id, weight))
    }

    /// Wire two populations with a connectivity pattern
    ///
    /// Every planned connection becomes a synapse via [`Network::connect`].
    /// Returns the created synapse ids in plan order.
    pub fn apply_pattern(
        &self,
        pattern: &mut dyn ConnectivityPattern,
        sources: &[ObjectId],
        targets: &[ObjectId],
    ) -> Result<Vec<ObjectId>> {
        let connections = pattern.generate_connections(sources, targets);
        let mut synapse_ids = Vec::with_capacity(connections.len());
        for connection in connections {
            synapse_ids.push(self.connect(
                connection.source_neuron_id,
                connection.target_neuron_id,
                connection.weight,
                connection.delay_ms,
            )?);
        }
        log::info!(
            "Network: applied connectivity pattern ({} sources, {} targets, {} synapses)",
            sources.len(),
            targets.len(),
            synapse_ids.len()
        );
        Ok(synapse_ids)
    }

    /// Number of neurons in the network
    pub fn neuron_count(&self) -> usize {
        self.shared.neurons.lock().len()
    }

    /// Number of synapses in the network
    pub fn synapse_count(&self) -> usize {
        self.shared.synapses.lock().len()
    }

    /// The scheduler this network drives
    pub fn scheduler(&self) -> &Arc<SpikeScheduler> {
        &self.shared.scheduler
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("neurons", &self.neuron_count())
            .field("synapses", &self.synapse_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerConfig;

    fn network() -> Network {
        let scheduler = Arc::new(
            SpikeScheduler::new(
                SchedulerConfig::new(1000, 1.0, 2)
                    .unwrap()
                    .with_real_time(false),
            )
            .unwrap(),
        );
        Network::new(scheduler, Arc::new(IdAllocator::new()))
    }

    #[test]
    fn test_add_neuron_wires_axon() {
        let net = network();
        let neuron_id = net.add_neuron(50.0, 0.9, 10).unwrap();
        let neuron = net.neuron(neuron_id).unwrap();
        let axon_id = neuron.lock().axon_id().unwrap();
        assert_eq!(axon_id.kind(), Some(ObjectKind::Axon));
        assert_eq!(net.neuron_count(), 1);
    }

    #[test]
    fn test_connect_maintains_backlinks() {
        let net = network();
        let pre = net.add_neuron(50.0, 0.9, 10).unwrap();
        let post = net.add_neuron(50.0, 0.9, 10).unwrap();
        let synapse_id = net.connect(pre, post, 0.8, 2.0).unwrap();

        let synapse = net.synapse(synapse_id).unwrap();
        let (axon_id, dendrite_id) = {
            let synapse = synapse.lock();
            (synapse.axon_id(), synapse.dendrite_id())
        };

        let pre_neuron = net.neuron(pre).unwrap();
        assert_eq!(pre_neuron.lock().axon_id(), Some(axon_id));

        let post_neuron = net.neuron(post).unwrap();
        assert!(post_neuron.lock().dendrite_ids().contains(&dendrite_id));
    }

    #[test]
    fn test_connect_unknown_neuron_fails() {
        let net = network();
        let pre = net.add_neuron(50.0, 0.9, 10).unwrap();
        let bogus = ObjectId::new(100_000_000_000_099);
        assert!(matches!(
            net.connect(pre, bogus, 0.5, 1.0),
            Err(RuntimeError::UnknownEntity { .. })
        ));
        assert!(matches!(
            net.connect(bogus, pre, 0.5, 1.0),
            Err(RuntimeError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_inject_requires_window() {
        let net = network();
        let neuron_id = net.add_neuron(50.0, 0.9, 10).unwrap();
        let dendrite_id = net.attach_input(neuron_id).unwrap();

        assert!(net.inject_spike(dendrite_id, 5.0, 0.7).is_ok());
        assert!(net.inject_spike(dendrite_id, 1e9, 0.7).is_err());
    }
}
