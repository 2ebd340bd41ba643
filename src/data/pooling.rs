// --- File: src/data/pooling.rs ---

//! Average pooling over 3D volumes.

use ndarray::Array3;

/// Average Pooling 3D without padding.
///
/// Output size along each axis is `(n - kernel) / stride + 1`. Trailing
/// voxels that do not fill a window are dropped.
pub fn avg_pool3d(input: &Array3<f64>, kernel_size: usize, stride: usize) -> Array3<f64> {
    let (h, w, d) = input.dim();
    let out = |n: usize| {
        if n < kernel_size {
            0
        } else {
            (n - kernel_size) / stride + 1
        }
    };
    let (out_h, out_w, out_d) = (out(h), out(w), out(d));

    let mut output = Array3::<f64>::zeros((out_h, out_w, out_d));
    let kernel_volume = (kernel_size * kernel_size * kernel_size) as f64;

    for oh in 0..out_h {
        for ow in 0..out_w {
            for od in 0..out_d {
                let mut sum = 0.0f64;
                for kh in 0..kernel_size {
                    for kw in 0..kernel_size {
                        for kd in 0..kernel_size {
                            sum += input[[oh * stride + kh, ow * stride + kw, od * stride + kd]];
                        }
                    }
                }
                output[[oh, ow, od]] = sum / kernel_volume;
            }
        }
    }

    output
}
