//! Clock drift estimation (C5): histogram-based peak finding per
//! sub-window, and the overall drift rate derived from successive peaks.

use rayon::prelude::*;

use crate::config::{DriftConfig, GatingConfig};
use crate::qubit::{channel_index, DetectionReport, NUM_CHANNELS};
use crate::signal_processing::find_threshold;
use crate::utils::div_nearest;

/// Count detections into `num_bins` buckets of `(time mod window_width)`.
pub fn histogram(detections: &[DetectionReport], num_bins: u64, window_width: u64) -> Vec<u64> {
    let mut counts = vec![0u64; num_bins as usize];
    let bin_width = (window_width / num_bins) as i64;
    for detection in detections {
        let wrapped = (detection.time % window_width) as i64;
        let bin = (div_nearest(wrapped, bin_width).rem_euclid(num_bins as i64)) as usize;
        counts[bin] += 1;
    }
    counts
}

/// Same as [`histogram`] but split into one histogram per canonical
/// channel, used by [`channel_find_peak`] to derive per-channel offsets.
pub fn channel_histogram(
    detections: &[DetectionReport],
    num_bins: u64,
    window_width: u64,
) -> [Vec<u64>; NUM_CHANNELS] {
    let mut counts: [Vec<u64>; NUM_CHANNELS] = Default::default();
    for hist in &mut counts {
        *hist = vec![0u64; num_bins as usize];
    }
    let bin_width = (window_width / num_bins) as i64;
    for detection in detections {
        let wrapped = (detection.time % window_width) as i64;
        let bin = (div_nearest(wrapped, bin_width).rem_euclid(num_bins as i64)) as usize;
        counts[channel_index(detection.value)][bin] += 1;
    }
    counts
}

/// Weighted-centroid peak position (in fractional bins) for a sub-window
/// of detections, pooled across channels.
pub fn find_peak(detections: &[DetectionReport], num_bins: u64, window_width: u64) -> f64 {
    if detections.is_empty() {
        return 0.0;
    }
    let bins_centre = (num_bins / 2) as i64;
    let counts = histogram(detections, num_bins, window_width);

    let peak_offset = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &count)| count)
        .map(|(idx, _)| idx as i64)
        .unwrap_or(0);
    let index_shift = bins_centre - peak_offset;

    let mut average = 0.0f64;
    let mut total_weights = 0u64;
    for (index, &count) in counts.iter().enumerate() {
        let shifted_bin = (num_bins as i64 + index as i64 + index_shift).rem_euclid(num_bins as i64) + 1;
        total_weights += count;
        average += shifted_bin as f64 * count as f64;
    }

    if total_weights == 0 {
        return 0.0;
    }
    average /= total_weights as f64;
    (average + num_bins as f64 - index_shift as f64 - 1.0).rem_euclid(num_bins as f64)
}

/// Per-channel weighted-centroid peak, producing a relative timing offset
/// for each canonical qubit value. Uses a different un-shift convention
/// and a x1000 scale factor from [`find_peak`]; the two are not unified,
/// see the design notes for why.
pub fn channel_find_peak(
    detections: &[DetectionReport],
    num_bins: u64,
    window_width: u64,
) -> [i64; NUM_CHANNELS] {
    let bins_centre = (num_bins / 2) as i64;
    let histograms = channel_histogram(detections, num_bins, window_width);
    let mut channel_centres = [0i64; NUM_CHANNELS];

    for (channel, hist) in histograms.iter().enumerate() {
        let peak_offset = hist
            .iter()
            .enumerate()
            .max_by_key(|&(_, &count)| count)
            .map(|(idx, _)| idx as i64)
            .unwrap_or(0);

        let mut average = 0.0f64;
        let mut total_weights = 0u64;
        for (index, &count) in hist.iter().enumerate() {
            let shifted_bin = num_bins as i64
                - (num_bins as i64 + peak_offset + bins_centre - index as i64).rem_euclid(num_bins as i64);
            total_weights += count;
            average += shifted_bin as f64 * count as f64;
        }

        if total_weights != 0 {
            average /= total_weights as f64;
            average = ((average + (bins_centre - peak_offset) as f64) * 1000.0).round();
        } else {
            average = 0.0;
        }
        channel_centres[channel] = average as i64;
    }

    channel_centres
}

/// Split `detections` into consecutive `driftSampleTime`-long sub-windows
/// and compute the pooled peak of each, in parallel. Returns the peaks in
/// sub-window order plus the maximum peak value seen, if any.
pub fn get_peaks(
    detections: &[DetectionReport],
    drift_sample_time: u64,
    num_bins: u64,
    slot_width: u64,
) -> (Vec<f64>, Option<f64>) {
    if detections.len() < 2 || drift_sample_time == 0 {
        return (Vec::new(), None);
    }

    let times: Vec<u64> = detections.iter().map(|d| d.time).collect();
    let start_time = times[0];
    let end = detections.len();

    let mut windows = Vec::new();
    let mut sample_start = 0usize;
    let mut sample_index = 1u64;

    while end - sample_start > 1 {
        let cutoff = start_time + drift_sample_time * sample_index;
        let rel = find_threshold(&times[sample_start..end], cutoff, |t, c| t > c);
        let mut sample_end = (sample_start + rel).min(end);
        if sample_end <= sample_start {
            sample_end = (sample_start + 1).min(end);
        }

        let include = sample_end != end - 1
            || (times[sample_end] as i64 - times[sample_start] as i64) >= drift_sample_time as i64;
        if include {
            windows.push((sample_start, sample_end));
        }

        sample_start = sample_end;
        sample_index += 1;
    }

    let peaks: Vec<f64> = windows
        .par_iter()
        .map(|&(s, e)| find_peak(&detections[s..e], num_bins, slot_width))
        .collect();

    let maximum = peaks.iter().cloned().fold(None, |acc: Option<f64>, value| match acc {
        Some(m) if m >= value => Some(m),
        _ => Some(value),
    });

    (peaks, maximum)
}

/// Drift rate in seconds/second over `detections`, 0 when there is not
/// enough data to establish a slope.
pub fn calculate_drift(
    detections: &[DetectionReport],
    drift_config: &DriftConfig,
    gating_config: &GatingConfig,
) -> f64 {
    let num_bins = gating_config.num_bins();
    let (peaks, maximum) = get_peaks(
        detections,
        drift_config.drift_sample_time,
        num_bins,
        gating_config.slot_width,
    );

    let Some(maximum) = maximum else {
        return 0.0;
    };
    if peaks.len() < 2 {
        return 0.0;
    }

    let bin_time = (gating_config.slot_width as f64 / 1e12) / num_bins as f64;
    let drift_sample_time_seconds = drift_config.drift_sample_time as f64 / 1e12;

    let mut slope = 0.0f64;
    let mut slope_samples = 0u64;
    for window in peaks.windows(2) {
        let diff = window[1] - window[0];
        if diff.abs() < maximum / 2.0 {
            slope += diff;
            slope_samples += 1;
        }
    }

    if slope != 0.0 && slope_samples != 0 {
        (slope * bin_time) / (slope_samples as f64 * drift_sample_time_seconds)
    } else {
        0.0
    }
}
