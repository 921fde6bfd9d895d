use emo_core::Image;
use rayon::prelude::*;

/// Minimum and maximum of one channel, ignoring NaN. `None` if the channel
/// holds no finite comparison values.
pub fn channel_min_max(image: &Image, channel: usize) -> Option<(f64, f64)> {
    plane_min_max(image.plane(channel))
}

/// Minimum and maximum across every channel.
pub fn global_min_max(image: &Image) -> Option<(f64, f64)> {
    image
        .planes()
        .iter()
        .filter_map(|p| plane_min_max(p))
        .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)))
}

fn plane_min_max(plane: &[f64]) -> Option<(f64, f64)> {
    plane
        .iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn rescale_plane(plane: &mut [f64], min: f64, max: f64) {
    let span = max - min;
    if span > 0.0 && span.is_finite() {
        for v in plane.iter_mut() {
            *v = (*v - min) / span;
        }
    } else {
        // Constant (or empty) input: no contrast to stretch.
        plane.fill(0.0);
    }
}

/// Rescale each channel into `[0, 1]` using that channel's own min/max.
pub fn value_scale_to_unit_range(image: &mut Image) {
    image.planes_mut().par_iter_mut().for_each(|plane| {
        let (min, max) = plane_min_max(plane).unwrap_or((0.0, 0.0));
        rescale_plane(plane, min, max);
    });
}

/// Rescale every channel into `[0, 1]` using one global min/max, keeping
/// values comparable across channels.
pub fn value_scale_to_unit_range_uniform(image: &mut Image) {
    let (min, max) = global_min_max(image).unwrap_or((0.0, 0.0));
    image
        .planes_mut()
        .par_iter_mut()
        .for_each(|plane| rescale_plane(plane, min, max));
}
