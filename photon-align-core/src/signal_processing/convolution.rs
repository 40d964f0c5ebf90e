//! "Valid" convolution (C3): only outputs where the kernel fully overlaps
//! the data are produced.

use crate::errors::ConvolutionError;

/// Convolve `data` with `kernel`, producing `data.len() - kernel.len() + 1`
/// outputs. Fails when `data` is shorter than `kernel`.
pub fn convolve_valid(data: &[f64], kernel: &[f64]) -> Result<Vec<f64>, ConvolutionError> {
    if data.len() < kernel.len() {
        return Err(ConvolutionError::KernelTooLarge {
            data_len: data.len(),
            kernel_len: kernel.len(),
        });
    }

    let out_len = data.len() - kernel.len() + 1;
    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let mut acc = 0.0;
        for (j, &k) in kernel.iter().enumerate() {
            acc += data[i + j] * k;
        }
        output.push(acc);
    }
    Ok(output)
}
