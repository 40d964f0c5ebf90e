//! Alignment error types with granular categories

use thiserror::Error;

/// Top-level error type for all alignment operations
#[derive(Debug, Error)]
pub enum AlignError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Convolution error: {0}")]
    Convolution(#[from] ConvolutionError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Low confidence: {0}")]
    LowConfidence(#[from] LowConfidenceError),

    #[error("Marker fetch error: {0}")]
    MarkerFetch(#[from] MarkerFetchError),

    #[error("Cancel requested")]
    CancelRequested,
}

/// Errors raised while decoding a time-tag file or auxiliary formats (C1)
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("file length {len} is not a multiple of the record size {record_size}")]
    TruncatedFile { len: usize, record_size: usize },

    #[error("invalid record type {0:#x}")]
    InvalidRecordType(u8),

    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by valid convolution (C3)
#[derive(Debug, Error)]
pub enum ConvolutionError {
    #[error("kernel length {kernel_len} exceeds data length {data_len}")]
    KernelTooLarge { data_len: usize, kernel_len: usize },
}

/// Errors raised by the envelope filter / Isolate (C4)
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("insufficient samples: have {available}, need more than stride {stride}")]
    InsufficientSamples { available: usize, stride: usize },

    #[error(transparent)]
    Convolution(#[from] ConvolutionError),
}

/// Raised when offset-search confidence falls below the acceptance threshold (C7/C8)
#[derive(Debug, Error)]
#[error("confidence {confidence:.4} at offset {offset} is below acceptance threshold {threshold:.4}")]
pub struct LowConfidenceError {
    pub confidence: f64,
    pub offset: i64,
    pub threshold: f64,
}

/// Raised when the marker-exchange collaborator fails (C8, external transport)
#[derive(Debug, Error)]
#[error("marker fetch failed for frame {frame_id}: {reason}")]
pub struct MarkerFetchError {
    pub frame_id: u64,
    pub reason: String,
}

/// Result type alias for alignment operations
pub type Result<T> = std::result::Result<T, AlignError>;
