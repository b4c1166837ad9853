//! Property tests for the typed identifier allocator

use std::collections::HashSet;

use proptest::prelude::*;

use synfire_storage::{IdAllocator, ObjectKind};

proptest! {
    #[test]
    fn prop_minted_ids_are_distinct_and_in_range(
        kind_index in 0usize..12,
        count in 1usize..500,
    ) {
        let kind = ObjectKind::ALL[kind_index];
        let allocator = IdAllocator::new();

        let mut seen = HashSet::new();
        for _ in 0..count {
            let id = allocator.next(kind).unwrap();
            prop_assert!(seen.insert(id), "duplicate id {}", id);
            prop_assert!(id.raw() >= kind.range_start());
            prop_assert!(id.raw() <= kind.range_end());
            prop_assert_eq!(id.kind(), Some(kind));
        }
        prop_assert_eq!(allocator.count(kind), count as u64);
    }

    #[test]
    fn prop_kinds_do_not_collide(
        a_index in 0usize..12,
        b_index in 0usize..12,
    ) {
        prop_assume!(a_index != b_index);
        let allocator = IdAllocator::new();
        let a = allocator.next(ObjectKind::ALL[a_index]).unwrap();
        let b = allocator.next(ObjectKind::ALL[b_index]).unwrap();
        prop_assert_ne!(a, b);
        prop_assert_ne!(a.kind(), b.kind());
    }
}

#[test]
fn interleaved_allocation_keeps_per_kind_sequences() {
    let allocator = IdAllocator::new();
    let n1 = allocator.next(ObjectKind::Neuron).unwrap();
    let a1 = allocator.next(ObjectKind::Axon).unwrap();
    let n2 = allocator.next(ObjectKind::Neuron).unwrap();
    let a2 = allocator.next(ObjectKind::Axon).unwrap();

    assert_eq!(n2.raw(), n1.raw() + 1);
    assert_eq!(a2.raw(), a1.raw() + 1);
    assert_eq!(allocator.count(ObjectKind::Neuron), 2);
    assert_eq!(allocator.count(ObjectKind::Axon), 2);
    assert_eq!(allocator.current(ObjectKind::Neuron), n2.raw() + 1);
}
