//! Element-wise arithmetic over multi-channel buffers.
//!
//! Operands must share a stride. Only the overlapping channels and rows
//! are touched; anything in the target beyond that is left as it was.

use emo_core::Image;
use rayon::prelude::*;

fn zip_into<F>(a: &Image, b: &Image, target: &mut Image, op: F)
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    assert_eq!(a.stride(), b.stride(), "operand strides differ");
    assert_eq!(target.stride(), a.stride(), "target stride differs from operands");

    let channels = a.shared_channels(b).min(target.channels());
    let len = a.pixel_count().min(b.pixel_count()).min(target.pixel_count());

    target.planes_mut()[..channels]
        .par_iter_mut()
        .zip(a.planes()[..channels].par_iter())
        .zip(b.planes()[..channels].par_iter())
        .for_each(|((dst, pa), pb)| {
            for ((d, &x), &y) in dst[..len].iter_mut().zip(pa).zip(pb) {
                *d = op(x, y);
            }
        });
}

fn overlap_shape(a: &Image, b: &Image) -> Image {
    Image::new(a.stride(), a.height().min(b.height()), a.shared_channels(b))
}

pub fn add(a: &Image, b: &Image) -> Image {
    let mut target = overlap_shape(a, b);
    add_into(a, b, &mut target);
    target
}

pub fn add_into(a: &Image, b: &Image, target: &mut Image) {
    zip_into(a, b, target, |x, y| x + y);
}

pub fn subtract(a: &Image, b: &Image) -> Image {
    let mut target = overlap_shape(a, b);
    subtract_into(a, b, &mut target);
    target
}

pub fn subtract_into(a: &Image, b: &Image, target: &mut Image) {
    zip_into(a, b, target, |x, y| x - y);
}

pub fn multiply(a: &Image, b: &Image) -> Image {
    let mut target = overlap_shape(a, b);
    multiply_into(a, b, &mut target);
    target
}

pub fn multiply_into(a: &Image, b: &Image, target: &mut Image) {
    zip_into(a, b, target, |x, y| x * y);
}

/// Raise every sample to `exponent`.
pub fn power(a: &Image, exponent: f64) -> Image {
    let mut target = Image::new(a.stride(), a.height(), a.channels());
    power_into(a, exponent, &mut target);
    target
}

pub fn power_into(a: &Image, exponent: f64, target: &mut Image) {
    assert_eq!(target.stride(), a.stride(), "target stride differs from operand");
    let channels = a.shared_channels(target);
    let len = a.pixel_count().min(target.pixel_count());

    target.planes_mut()[..channels]
        .par_iter_mut()
        .zip(a.planes()[..channels].par_iter())
        .for_each(|(dst, src)| {
            for (d, &x) in dst[..len].iter_mut().zip(src) {
                *d = x.powf(exponent);
            }
        });
}
