//! Integration tests for population wiring through connectivity patterns

use std::sync::Arc;

use synfire_runtime::{
    AllToAllPattern, IdAllocator, Network, ObjectId, OneToOnePattern, RandomSparsePattern,
    SchedulerConfig, SpikeScheduler,
};

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

fn population(net: &Network, count: usize) -> Vec<ObjectId> {
    (0..count)
        .map(|_| net.add_neuron(50.0, 0.9, 10).unwrap())
        .collect()
}

#[test]
fn all_to_all_wires_every_pair() {
    let net = network();
    let sources = population(&net, 3);
    let targets = population(&net, 4);

    let synapses = net
        .apply_pattern(&mut AllToAllPattern::new(0.5, 1.0), &sources, &targets)
        .unwrap();
    assert_eq!(synapses.len(), 12);
    assert_eq!(net.synapse_count(), 12);

    // Each created synapse is registered and carries the pattern weight
    for synapse_id in synapses {
        let synapse = net.synapse(synapse_id).expect("synapse registered");
        assert_eq!(synapse.lock().weight(), 0.5);
    }
}

#[test]
fn one_to_one_respects_population_order() {
    let net = network();
    let sources = population(&net, 3);
    let targets = population(&net, 3);

    let synapses = net
        .apply_pattern(&mut OneToOnePattern::new(1.0, 2.0), &sources, &targets)
        .unwrap();
    assert_eq!(synapses.len(), 3);

    for (i, synapse_id) in synapses.iter().enumerate() {
        let synapse = net.synapse(*synapse_id).unwrap();
        let dendrite_id = synapse.lock().dendrite_id();
        let target = net.neuron(targets[i]).unwrap();
        assert!(target.lock().dendrite_ids().contains(&dendrite_id));
    }
}

#[test]
fn seeded_random_wiring_is_reproducible() {
    let net_a = network();
    let sources_a = population(&net_a, 6);
    let targets_a = population(&net_a, 6);
    let count_a = net_a
        .apply_pattern(
            &mut RandomSparsePattern::new(0.5, 1.0, 1.0).with_seed(42),
            &sources_a,
            &targets_a,
        )
        .unwrap()
        .len();

    let net_b = network();
    let sources_b = population(&net_b, 6);
    let targets_b = population(&net_b, 6);
    let count_b = net_b
        .apply_pattern(
            &mut RandomSparsePattern::new(0.5, 1.0, 1.0).with_seed(42),
            &sources_b,
            &targets_b,
        )
        .unwrap()
        .len();

    assert_eq!(count_a, count_b);
}
