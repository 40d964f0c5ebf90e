use std::collections::HashMap;

use photon_align_core::offset::{highest_value_dense, highest_value_sparse};
use photon_align_core::qubit::{Qubit, SlotID};

#[test]
fn dense_search_recovers_a_nonzero_offset() {
    let truth = vec![
        Qubit::ZERO, Qubit::ONE, Qubit::POS, Qubit::NEG,
        Qubit::ZERO, Qubit::ONE, Qubit::POS, Qubit::NEG,
        Qubit::ZERO, Qubit::ONE,
    ];
    // irregular is truth shifted left by 3: irregular[i] == truth[i + 3]
    let valid_slots: Vec<SlotID> = vec![0, 1, 2, 3, 4, 5, 6];
    let irregular: Vec<Qubit> = (0..7).map(|i| truth[i + 3]).collect();

    let result = highest_value_dense(&truth, &valid_slots, &irregular, -8..8, 0);
    assert_eq!(result.offset, 3);
    assert_eq!(result.value, 1.0);
}

#[test]
fn sparse_search_handles_partial_basis_agreement() {
    let mut markers = HashMap::new();
    markers.insert(0u64, Qubit::ZERO); // same basis as ONE-at-slot-0 below, bit mismatches
    markers.insert(1u64, Qubit::POS); // matches both basis and value

    let valid_slots: Vec<SlotID> = vec![0, 1];
    let irregular = vec![Qubit::ONE, Qubit::POS];

    let result = highest_value_sparse(&markers, &valid_slots, &irregular, 0..1, 0);
    assert_eq!(result.offset, 0);
    assert_eq!(result.value, 0.5);
}
