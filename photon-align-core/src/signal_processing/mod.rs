//! Signal processing building blocks for the alignment pipeline:
//! Gaussian kernel generation, valid convolution, and the envelope
//! filter that isolates the transmission window from raw detections.

pub mod convolution;
pub mod filter;
pub mod kernel;

pub use convolution::convolve_valid;
pub use filter::{find_threshold, isolate};
pub use kernel::{gaussian, gaussian_window_1d};
