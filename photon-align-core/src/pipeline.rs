//! Alignment orchestrator (C8): drives a single frame through Isolate,
//! drift estimation, gating, marker exchange, offset search, and
//! slot-trimming, one frame at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::AlignmentConfig;
use crate::drift::{calculate_drift, channel_find_peak};
use crate::errors::{AlignError, LowConfidenceError, MarkerFetchError};
use crate::gating::{count_detections, gate_results, trim_slots};
use crate::logging::SignalLogger;
use crate::offset::highest_value_sparse;
use crate::qubit::{ChannelOffsets, DetectionReport, Markers, QubitList, SlotID};
use crate::random::RandomSource;
use crate::signal_processing::isolate;

/// External collaborator contract against the transmitter. Narrowed to
/// the two calls the orchestrator actually makes; everything about how
/// requests reach the transmitter (RPC framing, retries, transport) is
/// the implementor's concern.
pub trait MarkerExchange {
    fn request_markers(
        &mut self,
        frame_id: u64,
        number_of_markers: u32,
        send_all_basis: bool,
    ) -> Result<Markers, MarkerFetchError>;

    fn discard_transmissions(&mut self, frame_id: u64, slot_ids: &[SlotID]);
}

/// Frame-boundary hook. The orchestrator calls exactly one of these per
/// frame it processes; a default no-op implementation is provided so a
/// caller uninterested in telemetry need not implement anything.
pub trait AlignmentObserver {
    fn on_frame_complete(&mut self, _frame_id: u64, _result: &FrameResult) {}
    fn on_frame_failed(&mut self, _frame_id: u64, _error: &AlignError) {}
}

/// A no-op observer, used when the caller doesn't care about telemetry.
#[derive(Debug, Default)]
pub struct NullObserver;

impl AlignmentObserver for NullObserver {}

/// Output of a successfully aligned frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub valid_slots: Vec<SlotID>,
    pub qubits: QubitList,
    pub drift: f64,
    pub peak_width: f64,
    pub confidence: f64,
    pub offset: i64,
    pub dropped_detections: u64,
}

/// Drives one frame's worth of detections through the alignment state
/// machine. Holds no detection data between frames; everything it needs
/// is passed into [`Self::process_frame`].
pub struct AlignmentOrchestrator {
    config: AlignmentConfig,
    channel_offsets: ChannelOffsets,
    cancelled: Arc<AtomicBool>,
}

impl AlignmentOrchestrator {
    pub fn new(config: AlignmentConfig) -> Self {
        Self {
            config,
            channel_offsets: [0; crate::qubit::NUM_CHANNELS],
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A clone of the cancellation flag a caller can set from another
    /// thread to stop the orchestrator at its next suspension point.
    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn check_cancelled(&self) -> Result<(), AlignError> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(AlignError::CancelRequested)
        } else {
            Ok(())
        }
    }

    /// Run Isolate → EstimateDrift → Gate → RequestMarkers → OffsetSearch
    /// → TrimSlots → Emit for one frame, notifying `observer` either way.
    #[allow(clippy::too_many_arguments)]
    pub fn process_frame(
        &mut self,
        frame_id: u64,
        detections: &[DetectionReport],
        markers: &mut dyn MarkerExchange,
        random: &mut dyn RandomSource,
        observer: &mut dyn AlignmentObserver,
        logger: &mut SignalLogger,
    ) -> Result<FrameResult, AlignError> {
        self.check_cancelled()?;

        let (start, end) = isolate(detections, &self.config.filter)?;
        let window = &detections[start..end];
        logger.debug("ISOLATE", format!("frame {frame_id}: window [{start}, {end})"));

        let drift = calculate_drift(window, &self.config.drift, &self.config.gating);
        if drift == 0.0 && !window.is_empty() {
            logger.warn("DRIFT", format!("frame {frame_id}: zero drift over {} detections", window.len()));
        }

        let num_bins = self.config.gating.num_bins();
        if num_bins > 1 {
            self.channel_offsets = channel_find_peak(window, num_bins, self.config.gating.slot_width);
        }

        let frame_start = window.first().map(|d| d.time).unwrap_or(0);
        let counted = count_detections(window, frame_start, drift, &self.channel_offsets, &self.config.gating);
        let dropped_detections = (detections.len() - window.len()) as u64;

        let gate_outcome = gate_results(&counted, num_bins, self.config.gating.acceptance_ratio, random);

        self.check_cancelled()?;
        let samples = self.config.offset.offset_samples;
        let received_markers = markers
            .request_markers(frame_id, samples, samples == 0)
            .map_err(AlignError::MarkerFetch)?;

        let range = -(gate_outcome.valid_slots.len() as i64)..(gate_outcome.valid_slots.len() as i64);
        let best = highest_value_sparse(
            &received_markers,
            &gate_outcome.valid_slots,
            &gate_outcome.qubits,
            range,
            samples,
        );
        logger.info(
            "OFFSET",
            format!("frame {frame_id}: offset={} confidence={:.4}", best.offset, best.value),
        );

        if !(best.value >= self.config.offset.acceptance_confidence) {
            let error = AlignError::LowConfidence(LowConfidenceError {
                confidence: best.value,
                offset: best.offset,
                threshold: self.config.offset.acceptance_confidence,
            });
            observer.on_frame_failed(frame_id, &error);
            return Err(error);
        }

        let trimmed_qubits = trim_slots(&gate_outcome.valid_slots, &gate_outcome.qubits, best.offset);
        let final_slots: Vec<SlotID> = gate_outcome
            .valid_slots
            .iter()
            .filter(|&&slot| {
                let shifted = slot as i64 + best.offset;
                shifted >= 0 && (shifted as usize) < gate_outcome.qubits.len()
            })
            .copied()
            .collect();

        let discard_slots: Vec<SlotID> = final_slots
            .iter()
            .map(|&slot| (slot as i64 + best.offset) as SlotID)
            .collect();
        markers.discard_transmissions(frame_id, &discard_slots);

        let result = FrameResult {
            valid_slots: final_slots,
            qubits: trimmed_qubits,
            drift,
            peak_width: gate_outcome.peak_width,
            confidence: best.value,
            offset: best.offset,
            dropped_detections,
        };

        observer.on_frame_complete(frame_id, &result);
        Ok(result)
    }
}
