//! Core data model: qubits, detection reports, and the small identifier
//! types threaded through the rest of the alignment pipeline.

use std::collections::HashMap;

/// An 8-bit value encoding a BB84 basis (bits 1-2) and bit value (bit 0).
///
/// Only the four canonical values used by this pipeline are named;
/// other values may appear (e.g. `Right`/`Left` bases in the original
/// source) but are not distinguished by the alignment core, which only
/// ever compares basis bits or full values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Qubit(pub u8);

impl Qubit {
    pub const ZERO: Qubit = Qubit(0x00);
    pub const ONE: Qubit = Qubit(0x01);
    pub const POS: Qubit = Qubit(0x02);
    pub const NEG: Qubit = Qubit(0x03);

    /// The basis bits, discarding the binary value.
    pub fn basis(self) -> u8 {
        self.0 & 0b110
    }

    /// The binary value, discarding the basis.
    pub fn bit(self) -> u8 {
        self.0 & 0b001
    }

    /// True if two qubits were sent/measured in the same basis, regardless
    /// of bit value.
    pub fn same_basis(self, other: Qubit) -> bool {
        self.basis() == other.basis()
    }
}

impl From<u8> for Qubit {
    fn from(value: u8) -> Self {
        Qubit(value)
    }
}

/// A single detection event: arrival time in picoseconds, and the qubit
/// value read off the triggering channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionReport {
    pub time: u64,
    pub value: Qubit,
}

/// An ordered sequence of detections, monotonically non-decreasing in time.
/// The alignment core operates on slices of this list; it never copies the
/// underlying detection data, only the `(start, end)` bounds into it.
pub type DetectionReportList = Vec<DetectionReport>;

/// Identifies a transmission slot relative to a chosen origin (the first
/// detection in the frame).
pub type SlotID = u64;

/// Identifies a sub-slot time bin. `numBins = slotWidth / txJitter`.
pub type BinID = u16;

/// Number of distinct canonical qubit values gating tracks offsets for.
pub const NUM_CHANNELS: usize = 4;

/// One signed picosecond offset per channel, applied additively to a
/// detection's time before slot assignment.
pub type ChannelOffsets = [i64; NUM_CHANNELS];

/// Index a channel offset table by the canonical qubit value's raw code.
pub fn channel_index(value: Qubit) -> usize {
    (value.0 as usize) % NUM_CHANNELS
}

/// A sparse mapping revealed by the transmitter to aid offset discovery.
pub type Markers = HashMap<SlotID, Qubit>;

/// An ordered sequence of qubit values.
pub type QubitList = Vec<Qubit>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basis_masks_out_bit_value() {
        assert_eq!(Qubit::ZERO.basis(), Qubit::ONE.basis());
        assert_eq!(Qubit::POS.basis(), Qubit::NEG.basis());
        assert_ne!(Qubit::ZERO.basis(), Qubit::POS.basis());
    }

    #[test]
    fn bit_value_ignores_basis() {
        assert_eq!(Qubit::ZERO.bit(), 0);
        assert_eq!(Qubit::ONE.bit(), 1);
        assert_eq!(Qubit::POS.bit(), 0);
        assert_eq!(Qubit::NEG.bit(), 1);
    }

    #[test]
    fn same_basis_compares_basis_bits_only() {
        assert!(Qubit::ZERO.same_basis(Qubit::ONE));
        assert!(!Qubit::ZERO.same_basis(Qubit::POS));
    }

    #[test]
    fn full_equality_compares_bit_and_basis() {
        assert_eq!(Qubit::ZERO, Qubit::ZERO);
        assert_ne!(Qubit::ZERO, Qubit::ONE);
        assert_ne!(Qubit::ZERO, Qubit::POS);
    }
}
