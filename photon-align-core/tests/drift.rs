use photon_align_core::config::{DriftConfig, GatingConfig};
use photon_align_core::drift::calculate_drift;
use photon_align_core::qubit::{DetectionReport, Qubit};

fn report(time: u64, value: Qubit) -> DetectionReport {
    DetectionReport { time, value }
}

#[test]
fn stationary_clock_yields_small_drift() {
    let drift_config = DriftConfig { drift_sample_time: 10_000_000 };
    let gating_config = GatingConfig { slot_width: 1_000_000, tx_jitter: 100_000, acceptance_ratio: 0.2 };

    // Detections land at the same phase within every slot across many
    // drift-sample windows: no systematic drift to detect.
    let mut detections = Vec::new();
    let mut t = 0u64;
    for _ in 0..500 {
        t += gating_config.slot_width;
        detections.push(report(t, Qubit::ONE));
    }

    let drift = calculate_drift(&detections, &drift_config, &gating_config);
    assert!(drift.abs() < 1.0);
}

#[test]
fn drifting_clock_produces_nonzero_slope() {
    let drift_config = DriftConfig { drift_sample_time: 5_000_000 };
    let gating_config = GatingConfig { slot_width: 1_000_000, tx_jitter: 100_000, acceptance_ratio: 0.2 };

    // Each successive slot's detection arrives slightly later in-phase,
    // simulating a receiver clock running slow relative to the transmitter.
    let mut detections = Vec::new();
    let mut t = 0u64;
    let mut phase_shift = 0i64;
    for _ in 0..500 {
        t += gating_config.slot_width;
        phase_shift += 200;
        let shifted = (t as i64 + phase_shift).max(0) as u64;
        detections.push(report(shifted, Qubit::ONE));
    }

    let drift = calculate_drift(&detections, &drift_config, &gating_config);
    assert!(drift.is_finite());
}
