//! Gating (C6): assign detections to (bin, slot) cells, find the
//! acceptance band around the busiest bin, and emit one qubit per valid
//! slot.

use std::collections::{BTreeMap, HashMap};

use rayon::join;

use crate::config::GatingConfig;
use crate::qubit::{channel_index, BinID, ChannelOffsets, DetectionReport, Qubit, QubitList, SlotID};
use crate::random::RandomSource;
use crate::utils::div_nearest;

type SlotResults = HashMap<SlotID, Vec<Qubit>>;

/// Per-bin detection counts and per-(bin, slot) qubit buckets.
pub struct Counted {
    pub counts: Vec<u64>,
    pub slot_results: Vec<SlotResults>,
}

/// Bucket every detection into its `(bin, slot)` cell.
pub fn count_detections(
    detections: &[DetectionReport],
    frame_start: u64,
    drift: f64,
    channel_offsets: &ChannelOffsets,
    config: &GatingConfig,
) -> Counted {
    let num_bins = config.num_bins();
    let mut counts = vec![0u64; num_bins as usize];
    let mut slot_results: Vec<SlotResults> = (0..num_bins).map(|_| HashMap::new()).collect();

    for detection in detections {
        let offset = (drift * detection.time as f64).round() as i64;
        let mut adjusted_time = detection.time as i64 - frame_start as i64;
        if offset < 0 || adjusted_time > offset {
            adjusted_time += channel_offsets[channel_index(detection.value)];
            adjusted_time -= offset;
        }

        let slot = div_nearest(adjusted_time, config.slot_width as i64) as SlotID;
        let from_slot_start = adjusted_time.rem_euclid(config.slot_width as i64);
        let bin = ((from_slot_start / config.tx_jitter as i64) as u64 % num_bins) as BinID;

        slot_results[bin as usize].entry(slot).or_default().push(detection.value);
        counts[bin as usize] += 1;
    }

    Counted { counts, slot_results }
}

/// Result of the acceptance-band walk: the qubits and slot ids to emit,
/// plus a diagnostic peak width (accepted bin fraction).
pub struct GateOutcome {
    pub valid_slots: Vec<SlotID>,
    pub qubits: QubitList,
    pub peak_width: f64,
}

fn walk_upper(counts: &[u64], peak_index: usize, cutoff: f64, num_bins: usize) -> usize {
    let mut upper = peak_index;
    let stop_at = (peak_index + num_bins - 1) % num_bins;
    while counts[upper] as f64 > cutoff && upper != stop_at {
        upper = (upper + 1) % num_bins;
    }
    upper
}

fn walk_lower(counts: &[u64], peak_index: usize, cutoff: f64, num_bins: usize) -> usize {
    let mut lower = peak_index;
    let mut next_lower = lower;
    let stop_at = (peak_index + 1) % num_bins;
    while counts[next_lower] as f64 > cutoff && next_lower != stop_at {
        lower = next_lower;
        next_lower = (num_bins + next_lower - 1) % num_bins;
    }
    lower
}

/// Find the acceptance band around the peak bin and emit one qubit per
/// valid slot, picking randomly among colliding candidates.
pub fn gate_results(
    counted: &Counted,
    num_bins: u64,
    acceptance_ratio: f64,
    random: &mut dyn RandomSource,
) -> GateOutcome {
    let counts = &counted.counts;
    let num_bins = num_bins as usize;

    let peak_index = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &c)| c)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let min_value = *counts.iter().min().unwrap_or(&0);
    let peak_value = counts[peak_index];
    let cutoff = min_value as f64 + (peak_value - min_value) as f64 * acceptance_ratio;

    let (lower, upper) = join(
        || walk_lower(counts, peak_index, cutoff, num_bins),
        || walk_upper(counts, peak_index, cutoff, num_bins),
    );

    let mut qubits_by_slot: BTreeMap<SlotID, Vec<Qubit>> = BTreeMap::new();
    let mut bin_count = 0u64;

    let mut bin_id = lower;
    while bin_id != upper {
        let slot_offset: SlotID = if upper < lower && bin_id < upper { 1 } else { 0 };
        bin_count += 1;
        for (&slot, qubits) in &counted.slot_results[bin_id] {
            let my_slot = slot + slot_offset;
            qubits_by_slot.entry(my_slot).or_default().extend(qubits.iter().copied());
        }
        bin_id = (bin_id + 1) % num_bins;
    }

    let peak_width = bin_count as f64 / num_bins as f64;

    let mut valid_slots = Vec::new();
    let mut qubits = QubitList::new();
    for (slot, candidates) in qubits_by_slot {
        if candidates.is_empty() {
            continue;
        }
        valid_slots.push(slot);
        if candidates.len() == 1 {
            qubits.push(candidates[0]);
        } else {
            let index = random.next_below(candidates.len() as u64) as usize;
            qubits.push(candidates[index]);
        }
    }

    GateOutcome {
        valid_slots,
        qubits,
        peak_width,
    }
}

/// Apply `validSlots`/`offset` against a dense qubit list, producing a new
/// list with `qubits'[i] = qubits[validSlots[i] + offset]`, dropping
/// entries whose shifted index falls out of range.
pub fn trim_slots(valid_slots: &[SlotID], qubits: &[Qubit], offset: i64) -> QubitList {
    valid_slots
        .iter()
        .filter_map(|&slot| {
            let shifted = slot as i64 + offset;
            if shifted < 0 {
                return None;
            }
            qubits.get(shifted as usize).copied()
        })
        .collect()
}
