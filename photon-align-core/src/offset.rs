//! Offset search (C7): find the integer slot-offset that maximizes
//! agreement between a trusted source of qubit values and the receiver's
//! gated output.

use std::ops::Range;

use rayon::prelude::*;

use crate::qubit::{Markers, Qubit, QubitList, SlotID};

/// Confidence at a candidate offset: `valid_count / bases_matched`, NaN
/// when no bases were compared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence {
    pub offset: i64,
    pub value: f64,
    /// Number of sampled positions that fell within range and were
    /// compared at this offset. A smaller window (e.g. one that only
    /// partially overlaps the valid range) can score the same confidence
    /// as a fuller one by chance; ranking by this first before the
    /// smallest-offset tie-break favours the offset backed by more
    /// evidence.
    bases_matched: u64,
}

fn confidence_value(valid_count: u64, bases_matched: u64) -> f64 {
    if bases_matched == 0 {
        f64::NAN
    } else {
        valid_count as f64 / bases_matched as f64
    }
}

/// Better than `other` if strictly higher confidence; ties go to whichever
/// candidate compared more bases, and remaining ties to the smaller offset
/// (deterministic tie-break). NaN never wins.
fn is_better(candidate: Confidence, best: Option<Confidence>) -> bool {
    match best {
        None => !candidate.value.is_nan(),
        Some(best) => {
            if candidate.value.is_nan() {
                false
            } else if best.value.is_nan() {
                true
            } else if candidate.value > best.value {
                true
            } else if candidate.value == best.value {
                if candidate.bases_matched != best.bases_matched {
                    candidate.bases_matched > best.bases_matched
                } else {
                    candidate.offset < best.offset
                }
            } else {
                false
            }
        }
    }
}

fn reduce_best(scores: Vec<Confidence>) -> Confidence {
    scores
        .into_iter()
        .fold(None, |best, candidate| {
            if is_better(candidate, best) {
                Some(candidate)
            } else {
                best
            }
        })
        .unwrap_or(Confidence {
            offset: 0,
            value: f64::NAN,
            bases_matched: 0,
        })
}

/// Sparse-markers variant: compare each `(slot, qubit)` marker against
/// the receiver's gated output, offset-adjusted.
pub fn highest_value_sparse(
    markers: &Markers,
    valid_slots: &[SlotID],
    irregular: &QubitList,
    range: Range<i64>,
    samples: u32,
) -> Confidence {
    let scores: Vec<Confidence> = range
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|offset| {
            let mut bases_matched = 0u64;
            let mut valid_count = 0u64;

            for (&slot, &transmitted) in markers {
                if samples != 0 && bases_matched > samples as u64 {
                    break;
                }
                let adjusted = slot as i64 - offset;
                if adjusted < 0 {
                    continue;
                }
                let adjusted = adjusted as SlotID;
                if let Ok(index) = valid_slots.binary_search(&adjusted) {
                    let received = irregular[index];
                    if received.same_basis(transmitted) {
                        bases_matched += 1;
                        if received == transmitted {
                            valid_count += 1;
                        }
                    }
                }
            }

            Confidence {
                offset,
                value: confidence_value(valid_count, bases_matched),
                bases_matched,
            }
        })
        .collect();

    reduce_best(scores)
}

/// Dense variant: ground truth is a full `QubitList` indexed by slot id.
pub fn highest_value_dense(
    truth: &QubitList,
    valid_slots: &[SlotID],
    irregular: &QubitList,
    range: Range<i64>,
    samples: usize,
) -> Confidence {
    let step = if samples == 0 {
        1
    } else {
        (irregular.len() / samples.max(1)).max(1)
    };

    let scores: Vec<Confidence> = range
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|offset| {
            let mut bases_matched = 0u64;
            let mut valid_count = 0u64;

            let mut i = 0usize;
            while i < irregular.len() {
                let adjusted = offset + valid_slots[i] as i64;
                if adjusted >= 0 && (adjusted as usize) < truth.len() {
                    let transmitted = truth[adjusted as usize];
                    let received = irregular[i];
                    if received.same_basis(transmitted) {
                        bases_matched += 1;
                        if received == transmitted {
                            valid_count += 1;
                        }
                    }
                }
                i += step;
            }

            Confidence {
                offset,
                value: confidence_value(valid_count, bases_matched),
                bases_matched,
            }
        })
        .collect();

    reduce_best(scores)
}
