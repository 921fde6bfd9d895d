use emo_core::Image;
use rayon::prelude::*;

/// Per-pixel, per-channel symmetric 2x2 second-moment matrix.
///
/// Only the three distinct entries are stored: `[a00, a01, a11]` with
/// `a10 == a01`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureTensor {
    stride: usize,
    planes: Vec<Vec<[f64; 3]>>,
}

impl StructureTensor {
    pub fn new(stride: usize, height: usize, channels: usize) -> Self {
        assert!(stride > 0, "stride must be positive");
        Self {
            stride,
            planes: vec![vec![[0.0; 3]; stride * height]; channels],
        }
    }

    /// `[[Ix², IxIy], [IxIy, Iy²]]` from a pair of gradient buffers.
    pub fn from_gradients(ix: &Image, iy: &Image) -> Self {
        let mut tensor = Self::new(ix.stride(), ix.height().min(iy.height()), ix.shared_channels(iy));
        tensor.fill_from_gradients(ix, iy);
        tensor
    }

    pub fn fill_from_gradients(&mut self, ix: &Image, iy: &Image) {
        assert_eq!(ix.stride(), iy.stride(), "gradient strides differ");
        assert_eq!(self.stride, ix.stride(), "tensor stride differs from gradients");
        let channels = ix.shared_channels(iy).min(self.planes.len());
        let len = ix.pixel_count().min(iy.pixel_count()).min(self.pixel_count());

        self.planes[..channels]
            .par_iter_mut()
            .zip(ix.planes()[..channels].par_iter())
            .zip(iy.planes()[..channels].par_iter())
            .for_each(|((dst, gx), gy)| {
                for ((m, &x), &y) in dst[..len].iter_mut().zip(gx).zip(gy) {
                    *m = [x * x, x * y, y * y];
                }
            });
    }

    /// Tensor from already windowed products `Sxx`, `Syy`, `Sxy`.
    pub fn from_products(sxx: &Image, syy: &Image, sxy: &Image) -> Self {
        let channels = sxx.shared_channels(syy).min(sxy.channels());
        let height = sxx.height().min(syy.height()).min(sxy.height());
        let mut tensor = Self::new(sxx.stride(), height, channels);
        tensor.fill_from_products(sxx, syy, sxy);
        tensor
    }

    pub fn fill_from_products(&mut self, sxx: &Image, syy: &Image, sxy: &Image) {
        assert!(
            sxx.stride() == syy.stride() && syy.stride() == sxy.stride(),
            "product strides differ"
        );
        assert_eq!(self.stride, sxx.stride(), "tensor stride differs from products");
        let channels = sxx
            .shared_channels(syy)
            .min(sxy.channels())
            .min(self.planes.len());
        let len = sxx
            .pixel_count()
            .min(syy.pixel_count())
            .min(sxy.pixel_count())
            .min(self.pixel_count());

        self.planes[..channels]
            .par_iter_mut()
            .zip(sxx.planes()[..channels].par_iter())
            .zip(syy.planes()[..channels].par_iter())
            .zip(sxy.planes()[..channels].par_iter())
            .for_each(|(((dst, xx), yy), xy)| {
                for (i, m) in dst[..len].iter_mut().enumerate() {
                    *m = [xx[i], xy[i], yy[i]];
                }
            });
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn height(&self) -> usize {
        self.pixel_count() / self.stride
    }

    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    pub fn pixel_count(&self) -> usize {
        self.planes.first().map_or(0, Vec::len)
    }

    /// Full 2x2 matrix at a linear position.
    pub fn matrix(&self, position: usize, channel: usize) -> [[f64; 2]; 2] {
        let [a00, a01, a11] = self.planes[channel][position];
        [[a00, a01], [a01, a11]]
    }

    /// Harris response of every entry; see [`harris_measure`].
    pub fn response(&self, kappa: f64) -> Image {
        let mut target = Image::new(self.stride, self.height(), self.channels().max(1));
        self.response_into(kappa, &mut target);
        target
    }

    pub fn response_into(&self, kappa: f64, target: &mut Image) {
        assert_eq!(target.stride(), self.stride, "response stride differs from tensor");
        let channels = self.planes.len().min(target.channels());
        let len = self.pixel_count().min(target.pixel_count());

        target.planes_mut()[..channels]
            .par_iter_mut()
            .zip(self.planes[..channels].par_iter())
            .for_each(|(dst, src)| {
                for (d, &[a00, a01, a11]) in dst[..len].iter_mut().zip(src) {
                    *d = harris_measure(a00, a01, a11, kappa);
                }
            });
    }
}

/// `det(M) - kappa * trace(M)^2` for `M = [[a00, a01], [a01, a11]]`.
///
/// Positive for corners, negative along edges, near zero in flat regions.
#[inline]
pub fn harris_measure(a00: f64, a01: f64, a11: f64, kappa: f64) -> f64 {
    let det = a00 * a11 - a01 * a01;
    let trace = a00 + a11;
    det - kappa * trace * trace
}

pub fn harris_response(tensor: &StructureTensor, kappa: f64) -> Image {
    tensor.response(kappa)
}

/// Same measure as [`harris_response`], straight from the windowed
/// products without materialising a tensor.
pub fn harris_response_from_products(sxx: &Image, syy: &Image, sxy: &Image, kappa: f64) -> Image {
    assert!(
        sxx.stride() == syy.stride() && syy.stride() == sxy.stride(),
        "product strides differ"
    );
    let channels = sxx.shared_channels(syy).min(sxy.channels());
    let height = sxx.height().min(syy.height()).min(sxy.height());
    let mut target = Image::new(sxx.stride(), height, channels);
    let len = target.pixel_count();

    target
        .planes_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(c, dst)| {
            let (xx, yy, xy) = (sxx.plane(c), syy.plane(c), sxy.plane(c));
            for (i, d) in dst[..len].iter_mut().enumerate() {
                *d = harris_measure(xx[i], xy[i], yy[i], kappa);
            }
        });
    target
}
