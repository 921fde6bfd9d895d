use emo_core::{Image, Kernel};
use rayon::prelude::*;

/// Output `(height, width)` of a valid convolution of a `height x width`
/// input with `kernel`.
///
/// # Panics
/// Panics if the kernel does not fit inside the input.
pub fn valid_output_dims(height: usize, width: usize, kernel: &Kernel) -> (usize, usize) {
    assert!(
        kernel.rows() <= height && kernel.cols() <= width,
        "kernel {}x{} larger than input {}x{}",
        kernel.rows(),
        kernel.cols(),
        height,
        width
    );
    (height - kernel.rows() + 1, width - kernel.cols() + 1)
}

/// Valid 2D convolution: every fully overlapping kernel position produces
/// `sum(window * kernel) * scale + bias`.
pub fn valid_convolve(source: &Image, kernel: &Kernel) -> Image {
    let (h, w) = valid_output_dims(source.height(), source.stride(), kernel);
    let mut target = Image::new(w, h, source.channels());
    valid_convolve_into(source, kernel, &mut target);
    target
}

/// Like [`valid_convolve`], writing into a pre-sized target. Only the
/// channels both images share are processed.
///
/// # Panics
/// Panics if `target` is not exactly the valid output size.
pub fn valid_convolve_into(source: &Image, kernel: &Kernel, target: &mut Image) {
    let (out_h, out_w) = valid_output_dims(source.height(), source.stride(), kernel);
    assert_eq!(target.stride(), out_w, "target stride does not match valid output width");
    assert_eq!(target.height(), out_h, "target height does not match valid output height");

    let channels = source.shared_channels(target);
    let src_stride = source.stride();

    target.planes_mut()[..channels]
        .par_iter_mut()
        .zip(source.planes()[..channels].par_iter())
        .for_each(|(dst, src)| convolve_plane(src, src_stride, kernel, dst, out_w));
}

fn convolve_plane(src: &[f64], src_stride: usize, kernel: &Kernel, dst: &mut [f64], out_w: usize) {
    let k_rows = kernel.rows();
    let k_cols = kernel.cols();
    let coeffs = kernel.values();
    let scale = kernel.scale();
    let bias = kernel.bias();

    for (out_row, dst_row) in dst.chunks_exact_mut(out_w).enumerate() {
        for (out_col, out) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for kr in 0..k_rows {
                let start = (out_row + kr) * src_stride + out_col;
                let window = &src[start..start + k_cols];
                let k_row = &coeffs[kr * k_cols..(kr + 1) * k_cols];
                acc += window.iter().zip(k_row).map(|(s, k)| s * k).sum::<f64>();
            }
            *out = acc * scale + bias;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{KernelKind, KernelRegistry};
    use proptest::prelude::*;

    fn ramp(stride: usize, height: usize, channels: usize) -> Image {
        let planes = (0..channels)
            .map(|c| {
                (0..stride * height)
                    .map(|i| ((i % stride) as f64) * (c + 1) as f64)
                    .collect()
            })
            .collect();
        Image::from_planes(stride, planes)
    }

    #[test]
    fn test_identity_kernel() {
        let img = ramp(6, 5, 3);
        let identity = Kernel::new(3, 3, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 1.0, 0.0);
        let out = valid_convolve(&img, &identity);
        assert_eq!((out.stride(), out.height()), (4, 3));
        for c in 0..3 {
            for (row, col, v) in out.samples(c) {
                assert_eq!(v, img.get(row + 1, col + 1, c));
            }
        }
    }

    #[test]
    fn test_scale_and_bias_are_applied() {
        let img = Image::filled(4, 4, 1, 2.0);
        let k = Kernel::new(2, 2, vec![1.0; 4], 0.5, 1.0);
        let out = valid_convolve(&img, &k);
        // (4 * 2.0) * 0.5 + 1.0
        assert!(out.plane(0).iter().all(|&v| (v - 5.0).abs() < 1e-12));
    }

    #[test]
    fn test_sobel_x_on_horizontal_ramp() {
        // value = col, so Sobel-X gives (1 + 2 + 1) * 2 = 8 everywhere.
        let img = ramp(8, 6, 1);
        let out = valid_convolve(&img, &KernelKind::SobelX.build());
        assert!(out.plane(0).iter().all(|&v| (v - 8.0).abs() < 1e-12));
        let out_y = valid_convolve(&img, &KernelKind::SobelY.build());
        assert!(out_y.plane(0).iter().all(|&v| v.abs() < 1e-12));
    }

    #[test]
    fn test_gaussian_preserves_constant() {
        let img = Image::filled(12, 12, 3, 0.7);
        let out = valid_convolve(&img, KernelRegistry::global().get(KernelKind::Gaussian9Sigma3));
        assert_eq!((out.stride(), out.height()), (4, 4));
        for c in 0..3 {
            assert!(out.plane(c).iter().all(|&v| (v - 0.7).abs() < 1e-12));
        }
    }

    #[test]
    fn test_channel_mismatch_processes_overlap_only() {
        let img = ramp(5, 5, 4);
        let k = KernelKind::SobelX.build();
        let mut target = Image::filled(3, 3, 2, -1.0);
        valid_convolve_into(&img, &k, &mut target);
        assert_eq!(target.channels(), 2);
        assert!(target.plane(1).iter().all(|&v| (v - 16.0).abs() < 1e-12));
    }

    #[test]
    #[should_panic(expected = "larger than input")]
    fn test_kernel_larger_than_input_panics() {
        let img = Image::new(4, 4, 1);
        valid_convolve(&img, &KernelKind::Gaussian5Sigma1.build());
    }

    #[test]
    #[should_panic(expected = "target stride")]
    fn test_wrong_target_shape_panics() {
        let img = Image::new(6, 6, 1);
        let mut target = Image::new(5, 4, 1);
        valid_convolve_into(&img, &KernelKind::SobelX.build(), &mut target);
    }

    proptest! {
        #[test]
        fn prop_valid_output_size(
            h in 1usize..20,
            w in 1usize..20,
            kh in 1usize..6,
            kw in 1usize..6,
        ) {
            prop_assume!(kh <= h && kw <= w);
            let img = Image::new(w, h, 2);
            let k = Kernel::new(kh, kw, vec![1.0; kh * kw], 1.0, 0.0);
            let out = valid_convolve(&img, &k);
            prop_assert_eq!(out.stride(), w - kw + 1);
            prop_assert_eq!(out.height(), h - kh + 1);
            prop_assert_eq!(out.pixel_count(), (h - kh + 1) * (w - kw + 1));
        }
    }
}
