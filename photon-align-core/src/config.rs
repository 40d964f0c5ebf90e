//! Configuration types for the alignment pipeline.
use serde::{Deserialize, Serialize};

use crate::qubit::Qubit;

/// Parameters for the NOX time-tag decoder (C1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Coarse counter tick frequency in Hz. Device-dependent; the
    /// canonical tagger runs at 130 MHz, but other deployments have been
    /// seen at 225 MHz, so this stays a config field rather than a
    /// hard-coded constant.
    pub coarse_hz: u64,
    /// Number of fine taps per coarse tick.
    pub fine_taps: u32,
    /// Channel index (0-based, after the decoder's -1 shift) to canonical
    /// qubit value lookup.
    pub channel_mapping: Vec<Qubit>,
    /// Drop detections seen before the first config record.
    pub wait_for_config: bool,
    /// Stop decoding once the coarse counter exceeds this value. 0 means
    /// unlimited.
    pub max_coarse_time: u64,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            coarse_hz: 130_000_000,
            fine_taps: 4096,
            channel_mapping: vec![Qubit::ZERO, Qubit::ONE, Qubit::POS, Qubit::NEG],
            wait_for_config: false,
            max_coarse_time: 0,
        }
    }
}

/// Parameters for the envelope filter / Isolate pass (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub sigma: f64,
    pub width: usize,
    pub coarse_threshold: f64,
    pub fine_threshold: f64,
    pub stride: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sigma: 5.0,
            width: 5,
            coarse_threshold: 0.2,
            fine_threshold: 0.08,
            stride: 25,
        }
    }
}

/// Parameters for the drift estimator (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Sub-window length in picoseconds.
    pub drift_sample_time: u64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            drift_sample_time: 100_000_000_000,
        }
    }
}

/// Parameters for gating (C6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatingConfig {
    /// Transmission slot duration in picoseconds.
    pub slot_width: u64,
    /// Per-qubit detection window in picoseconds; `numBins = slotWidth/txJitter`.
    pub tx_jitter: u64,
    /// Fraction of the peak bin count above which bins are accepted.
    pub acceptance_ratio: f64,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            slot_width: 1_000_000,
            tx_jitter: 100_000,
            acceptance_ratio: 0.2,
        }
    }
}

impl GatingConfig {
    pub fn num_bins(&self) -> u64 {
        self.slot_width / self.tx_jitter
    }
}

/// Parameters for offset search (C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffsetConfig {
    /// Maximum number of bases to consider; 0 means all.
    pub offset_samples: u32,
    /// Minimum confidence required to accept a frame.
    pub acceptance_confidence: f64,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            offset_samples: 0,
            acceptance_confidence: 0.8,
        }
    }
}

/// Aggregate configuration for a single alignment pass, combining the
/// per-component structs above the way the orchestrator consumes them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlignmentConfig {
    pub decoder: DecoderConfig,
    pub filter: FilterConfig,
    pub drift: DriftConfig,
    pub gating: GatingConfig,
    pub offset: OffsetConfig,
}
