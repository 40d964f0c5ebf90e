use photon_align_core::signal_processing::convolution::convolve_valid;
use photon_align_core::signal_processing::filter::find_threshold;
use photon_align_core::signal_processing::kernel::gaussian_window_1d;
use photon_align_core::utils::{div_nearest, div_nearest_u};
use proptest::prelude::*;

proptest! {
    #[test]
    fn gaussian_window_is_always_mirror_symmetric(
        sigma in 0.05f64..50.0,
        width in 1usize..64,
        peak in 0.01f64..10.0,
    ) {
        let window = gaussian_window_1d(sigma, width, peak);
        for i in 0..width {
            prop_assert!((window[i] - window[width - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn gaussian_window_peak_is_the_global_maximum(
        sigma in 0.05f64..50.0,
        width in 1usize..64,
        peak in 0.01f64..10.0,
    ) {
        let window = gaussian_window_1d(sigma, width, peak);
        let max = window.iter().cloned().fold(f64::MIN, f64::max);
        // The Gaussian is strictly decreasing away from its centre, so the
        // largest sampled value is always within rounding error of `peak`.
        prop_assert!((max - peak).abs() < 1e-6);
    }

    #[test]
    fn valid_convolution_output_length_matches_n_minus_k_plus_one(
        n in 1usize..200,
        k in 1usize..50,
    ) {
        prop_assume!(n >= k);
        let data = vec![1.0f64; n];
        let kernel = vec![1.0f64; k];
        let out = convolve_valid(&data, &kernel).unwrap();
        prop_assert_eq!(out.len(), n - k + 1);
    }

    #[test]
    fn valid_convolution_rejects_kernel_longer_than_data(
        n in 0usize..20,
        extra in 1usize..20,
    ) {
        let data = vec![0.0f64; n];
        let kernel = vec![0.0f64; n + extra];
        prop_assert!(convolve_valid(&data, &kernel).is_err());
    }

    #[test]
    fn div_nearest_is_within_half_a_denominator_of_exact(
        numerator in -1_000_000i64..1_000_000,
        denominator in 1i64..10_000,
    ) {
        let rounded = div_nearest(numerator, denominator);
        let exact = numerator as f64 / denominator as f64;
        prop_assert!((rounded as f64 - exact).abs() <= 0.5 + 1e-9);
    }

    #[test]
    fn div_nearest_u_is_within_half_a_denominator_of_exact(
        numerator in 0u64..1_000_000,
        denominator in 1u64..10_000,
    ) {
        let rounded = div_nearest_u(numerator, denominator);
        let exact = numerator as f64 / denominator as f64;
        prop_assert!((rounded as f64 - exact).abs() <= 0.5 + 1e-9);
    }

    #[test]
    fn div_nearest_agrees_with_unsigned_variant_on_nonnegative_input(
        numerator in 0i64..1_000_000,
        denominator in 1i64..10_000,
    ) {
        let signed = div_nearest(numerator, denominator);
        let unsigned = div_nearest_u(numerator as u64, denominator as u64) as i64;
        prop_assert_eq!(signed, unsigned);
    }

    #[test]
    fn find_threshold_matches_a_linear_scan_over_monotone_data(
        mut values in prop::collection::vec(0i64..1000, 1..200),
        cutoff in 0i64..1000,
    ) {
        values.sort_unstable();
        let data: Vec<i64> = values;
        let idx = find_threshold(&data, cutoff, |v, c| v > c);
        let expected = data.iter().position(|&v| v > cutoff).unwrap_or(data.len());
        prop_assert_eq!(idx, expected);
    }
}
