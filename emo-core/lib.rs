use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Planar multi-channel image of `f64` samples.
///
/// Every channel is stored as its own row-major plane, so the sample of
/// pixel `(row, col)` in channel `c` lives at `plane(c)[row * stride + col]`.
/// The row stride travels with the buffer; the height is always derived as
/// `plane_len / stride`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    planes: Vec<Vec<f64>>,
    stride: usize,
}

impl Image {
    /// Zero-filled image of `stride x height` pixels with `channels` planes.
    pub fn new(stride: usize, height: usize, channels: usize) -> Self {
        Self::filled(stride, height, channels, 0.0)
    }

    /// Image where every sample of every channel equals `value`.
    pub fn filled(stride: usize, height: usize, channels: usize, value: f64) -> Self {
        assert!(stride > 0, "stride must be positive");
        assert!(channels > 0, "image needs at least one channel");
        Self {
            planes: vec![vec![value; stride * height]; channels],
            stride,
        }
    }

    /// Wrap existing planes. All planes must have the same length, a
    /// multiple of `stride`.
    pub fn from_planes(stride: usize, planes: Vec<Vec<f64>>) -> Self {
        assert!(stride > 0, "stride must be positive");
        assert!(!planes.is_empty(), "image needs at least one channel");
        let len = planes[0].len();
        assert!(
            len % stride == 0,
            "plane length {} is not a multiple of stride {}",
            len,
            stride
        );
        assert!(
            planes.iter().all(|p| p.len() == len),
            "all planes must have the same length"
        );
        Self { planes, stride }
    }

    /// Build from pixel-interleaved samples (`[r, g, b, r, g, b, ...]`).
    pub fn from_interleaved(stride: usize, channels: usize, samples: &[f64]) -> Self {
        assert!(channels > 0, "image needs at least one channel");
        assert!(
            samples.len() % channels == 0,
            "sample count {} is not a multiple of channel count {}",
            samples.len(),
            channels
        );
        let pixels = samples.len() / channels;
        let mut planes = vec![Vec::with_capacity(pixels); channels];
        for pixel in samples.chunks_exact(channels) {
            for (plane, &v) in planes.iter_mut().zip(pixel) {
                plane.push(v);
            }
        }
        Self::from_planes(stride, planes)
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn height(&self) -> usize {
        self.planes[0].len() / self.stride
    }

    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    /// Number of pixels per channel.
    pub fn pixel_count(&self) -> usize {
        self.planes[0].len()
    }

    pub fn plane(&self, channel: usize) -> &[f64] {
        &self.planes[channel]
    }

    pub fn plane_mut(&mut self, channel: usize) -> &mut [f64] {
        &mut self.planes[channel]
    }

    pub fn planes(&self) -> &[Vec<f64>] {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.planes
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> f64 {
        self.planes[channel][row * self.stride + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, channel: usize, value: f64) {
        self.planes[channel][row * self.stride + col] = value;
    }

    /// Copy samples from an image of identical shape.
    pub fn copy_from(&mut self, other: &Image) {
        assert_eq!(self.stride, other.stride, "stride mismatch");
        assert_eq!(self.channels(), other.channels(), "channel count mismatch");
        assert_eq!(self.pixel_count(), other.pixel_count(), "pixel count mismatch");
        for (dst, src) in self.planes.iter_mut().zip(&other.planes) {
            dst.copy_from_slice(src);
        }
    }

    /// Channel count both images have in common.
    pub fn shared_channels(&self, other: &Image) -> usize {
        self.channels().min(other.channels())
    }

    /// Iterate `(row, col, value)` over one channel.
    pub fn samples(&self, channel: usize) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let stride = self.stride;
        self.planes[channel]
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i / stride, i % stride, v))
    }
}

/// Immutable 2D convolution kernel; each output sample is
/// `sum(window * values) * scale + bias`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
    scale: f64,
    bias: f64,
}

impl Kernel {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>, scale: f64, bias: f64) -> Self {
        assert!(rows > 0 && cols > 0, "kernel dimensions must be positive");
        assert_eq!(values.len(), rows * cols, "kernel value count must equal rows * cols");
        Self {
            rows,
            cols,
            values,
            scale,
            bias,
        }
    }

    /// Kernel whose scale makes the coefficients sum to one.
    pub fn normalized(rows: usize, cols: usize, values: Vec<f64>) -> Self {
        let sum: f64 = values.iter().sum();
        assert!(sum != 0.0, "cannot normalise a zero-sum kernel");
        Self::new(rows, cols, values, 1.0 / sum, 0.0)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// Sum of the coefficients after scaling.
    pub fn effective_sum(&self) -> f64 {
        self.values.iter().sum::<f64>() * self.scale
    }
}

/// A ranked corner pick: linear position in the response buffer plus the
/// channel it was chosen from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Corner {
    pub position: usize,
    pub channel: usize,
    pub response: f64,
}

impl Corner {
    /// Convert to 2D coordinates, translated by `offset` (row, col).
    pub fn point(&self, stride: usize, offset: (usize, usize)) -> CornerPoint {
        CornerPoint {
            row: self.position / stride + offset.0,
            col: self.position % stride + offset.1,
            channel: self.channel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CornerPoint {
    pub row: usize,
    pub col: usize,
    pub channel: usize,
}

/// Sensitivities accepted for the Harris `kappa` parameter.
pub const KAPPA_RANGE: RangeInclusive<f64> = 0.04..=0.15;

/// Detection parameters handed in by the surrounding application.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectionConfig {
    /// Harris sensitivity; the pipeline clamps it into [`KAPPA_RANGE`].
    pub kappa: f64,
    /// Minimum row and column separation between picks.
    pub min_distance: usize,
    pub n_corners: usize,
    /// Exponential penalty on a channel that is ahead of the others.
    pub ahead_cost: f64,
    pub n_threads: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            kappa: 0.1,
            min_distance: 8,
            n_corners: 20,
            ahead_cost: 1.4,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
