//! Envelope filter / Isolate (C4), plus the shared threshold-finding
//! binary search reused by the drift estimator.

use crate::config::FilterConfig;
use crate::errors::FilterError;
use crate::qubit::DetectionReport;
use crate::signal_processing::convolution::convolve_valid;
use crate::signal_processing::kernel::gaussian_window_1d;

/// Binary search for the boundary of a single monotone transition.
///
/// `comparator(data[i], cutoff)` is assumed false for a prefix of `data`
/// and true for the remaining suffix (at most one transition). Returns
/// the first index where the predicate holds, or `data.len()` if it
/// never does.
pub fn find_threshold<T, F>(data: &[T], cutoff: T, comparator: F) -> usize
where
    T: Copy,
    F: Fn(T, T) -> bool,
{
    if data.is_empty() {
        return 0;
    }
    if comparator(data[0], cutoff) {
        return 0;
    }
    if !comparator(data[data.len() - 1], cutoff) {
        return data.len();
    }

    let mut lower: i64 = 0;
    let mut upper: i64 = (data.len() - 1) as i64;
    while upper - lower > 1 {
        let mid = lower + (upper - lower) / 2;
        if comparator(data[mid as usize], cutoff) {
            upper = mid;
        } else {
            lower = mid;
        }
    }
    upper as usize
}

/// Locate `[start, end)` bounding the transmission window within
/// `detections`, by strided differencing, Gaussian smoothing, and
/// threshold crossing.
pub fn isolate(
    detections: &[DetectionReport],
    config: &FilterConfig,
) -> Result<(usize, usize), FilterError> {
    let stride = config.stride;
    let n = detections.len();
    if n <= stride {
        return Err(FilterError::InsufficientSamples {
            available: n,
            stride,
        });
    }

    let mut diffs = Vec::with_capacity(n / stride);
    let mut idx = stride;
    while idx < n {
        let diff = detections[idx].time as f64 - detections[idx - stride].time as f64;
        diffs.push(diff);
        idx += stride;
    }

    let window = gaussian_window_1d(config.sigma, config.width, 1.0);
    let convolved = convolve_valid(&diffs, &window)?;

    let min_v = convolved.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_v = convolved.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let cutoff = (config.coarse_threshold + min_v) * max_v;

    let above = |v: f64, c: f64| v > c;
    let first = find_threshold(&convolved, cutoff, above);

    let reversed: Vec<f64> = convolved.iter().rev().copied().collect();
    let last_from_end = find_threshold(&reversed, cutoff, above);
    let last = convolved.len().saturating_sub(last_from_end);

    let start = (first * stride).min(n);
    let end = (last * stride).min(n);
    Ok((start, end.max(start)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::Qubit;

    fn report(time: u64) -> DetectionReport {
        DetectionReport { time, value: Qubit::ZERO }
    }

    #[test]
    fn find_threshold_locates_single_transition() {
        let data = [0.0, 0.0, 0.0, 5.0, 5.0, 5.0];
        let idx = find_threshold(&data, 1.0, |v, c| v > c);
        assert_eq!(idx, 3);
    }

    #[test]
    fn find_threshold_returns_len_when_never_true() {
        let data = [0.0, 0.0, 0.0];
        let idx = find_threshold(&data, 1.0, |v, c| v > c);
        assert_eq!(idx, data.len());
    }

    #[test]
    fn find_threshold_returns_zero_when_always_true() {
        let data = [5.0, 5.0, 5.0];
        let idx = find_threshold(&data, 1.0, |v, c| v > c);
        assert_eq!(idx, 0);
    }

    #[test]
    fn insufficient_samples_is_an_error() {
        let config = FilterConfig::default();
        let detections: Vec<_> = (0..10).map(|i| report(i * 1000)).collect();
        let err = isolate(&detections, &config).unwrap_err();
        assert!(matches!(err, FilterError::InsufficientSamples { available: 10, .. }));
    }

    #[test]
    fn isolate_finds_a_burst_in_the_middle() {
        let config = FilterConfig {
            stride: 2,
            ..FilterConfig::default()
        };
        // Sparse arrivals, then a dense burst, then sparse again.
        let mut times = Vec::new();
        let mut t = 0u64;
        for _ in 0..20 {
            t += 100_000;
            times.push(t);
        }
        for _ in 0..20 {
            t += 1_000;
            times.push(t);
        }
        for _ in 0..20 {
            t += 100_000;
            times.push(t);
        }
        let detections: Vec<_> = times.into_iter().map(report).collect();
        let (start, end) = isolate(&detections, &config).unwrap();
        assert!(start < end);
        assert!(end <= detections.len());
    }
}
