use emo_core::Image;
use rayon::prelude::*;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Border colour used around a buffer smaller than its display canvas.
pub const DISPLAY_PADDING: [u8; 4] = [128, 128, 128, 255];

/// Centred source rectangle with the target's aspect ratio, shrunk by a
/// digital `zoom` factor (values below 1 or non-finite act as 1).
pub fn zoom_crop_rect(
    source_width: usize,
    source_height: usize,
    target_stride: usize,
    target_height: usize,
    zoom: f64,
) -> Rect {
    assert!(source_width > 0 && source_height > 0, "empty source");
    assert!(target_stride > 0 && target_height > 0, "empty target");

    let zoom = if zoom.is_finite() { zoom.max(1.0) } else { 1.0 };
    let target_aspect = target_stride as f64 / target_height as f64;
    let (sw, sh) = (source_width as f64, source_height as f64);

    let (w, h) = if sw / sh > target_aspect {
        (sh * target_aspect, sh)
    } else {
        (sw, sw / target_aspect)
    };

    let width = ((w / zoom).round() as usize).clamp(1, source_width);
    let height = ((h / zoom).round() as usize).clamp(1, source_height);

    Rect {
        x: (source_width - width) / 2,
        y: (source_height - height) / 2,
        width,
        height,
    }
}

/// Nearest-neighbour resample of `rect` into a `target_stride x target_height`
/// buffer.
pub fn subsample(pixels: &Image, rect: Rect, target_stride: usize, target_height: usize) -> Image {
    let mut target = Image::new(target_stride, target_height, pixels.channels());
    subsample_into(pixels, rect, &mut target);
    target
}

pub fn subsample_into(pixels: &Image, rect: Rect, target: &mut Image) {
    assert!(
        rect.x + rect.width <= pixels.stride() && rect.y + rect.height <= pixels.height(),
        "crop rectangle {:?} exceeds source {}x{}",
        rect,
        pixels.stride(),
        pixels.height()
    );

    let target_stride = target.stride();
    let target_height = target.height();
    let col_map: Vec<usize> = (0..target_stride)
        .map(|tx| rect.x + tx * rect.width / target_stride)
        .collect();
    let row_map: Vec<usize> = (0..target_height)
        .map(|ty| rect.y + ty * rect.height / target_height)
        .collect();

    let src_stride = pixels.stride();
    let channels = pixels.shared_channels(target);

    target.planes_mut()[..channels]
        .par_iter_mut()
        .zip(pixels.planes()[..channels].par_iter())
        .for_each(|(dst, src)| {
            for (dst_row, &sy) in dst.chunks_exact_mut(target_stride).zip(&row_map) {
                let src_row = &src[sy * src_stride..(sy + 1) * src_stride];
                for (d, &sx) in dst_row.iter_mut().zip(&col_map) {
                    *d = src_row[sx];
                }
            }
        });
}

/// Centre `buffer` on an RGBA8 canvas of `target_stride x target_height`,
/// padding the border with [`DISPLAY_PADDING`].
///
/// One channel renders as gray, two as red/green, three or more as RGB.
/// Response pixels are always opaque.
pub fn convert_to_display(buffer: &Image, target_stride: usize, target_height: usize) -> Vec<[u8; 4]> {
    let mut canvas = vec![DISPLAY_PADDING; target_stride * target_height];
    convert_to_display_into(buffer, target_stride, &mut canvas);
    canvas
}

pub fn convert_to_display_into(buffer: &Image, target_stride: usize, canvas: &mut [[u8; 4]]) {
    assert!(target_stride > 0, "target stride must be positive");
    assert!(
        canvas.len() % target_stride == 0,
        "canvas length {} is not a multiple of stride {}",
        canvas.len(),
        target_stride
    );
    let target_height = canvas.len() / target_stride;
    assert!(
        buffer.stride() <= target_stride && buffer.height() <= target_height,
        "buffer {}x{} larger than display canvas {}x{}",
        buffer.stride(),
        buffer.height(),
        target_stride,
        target_height
    );

    let x0 = (target_stride - buffer.stride()) / 2;
    let y0 = (target_height - buffer.height()) / 2;
    canvas.fill(DISPLAY_PADDING);

    for (row, canvas_row) in canvas
        .chunks_exact_mut(target_stride)
        .skip(y0)
        .take(buffer.height())
        .enumerate()
    {
        for col in 0..buffer.stride() {
            canvas_row[x0 + col] = display_pixel(buffer, row * buffer.stride() + col);
        }
    }
}

#[inline]
fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn display_pixel(buffer: &Image, index: usize) -> [u8; 4] {
    let s = |c: usize| to_byte(buffer.plane(c)[index]);
    match buffer.channels() {
        1 => {
            let g = s(0);
            [g, g, g, 255]
        }
        2 => [s(0), s(1), 0, 255],
        // Channels past the third are responses of non-colour planes
        // (alpha), not opacity.
        _ => [s(0), s(1), s(2), 255],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_matches_target_aspect() {
        // 4:3 source into a square target: crop the sides.
        let r = zoom_crop_rect(640, 480, 100, 100, 1.0);
        assert_eq!(r, Rect { x: 80, y: 0, width: 480, height: 480 });

        // Wide target from a tall source: crop top and bottom.
        let r = zoom_crop_rect(300, 600, 200, 100, 1.0);
        assert_eq!(r, Rect { x: 0, y: 225, width: 300, height: 150 });
    }

    #[test]
    fn test_zoom_shrinks_rect() {
        let r = zoom_crop_rect(640, 480, 100, 100, 2.0);
        assert_eq!(r, Rect { x: 200, y: 120, width: 240, height: 240 });
        // Zoom below one is treated as no zoom.
        assert_eq!(zoom_crop_rect(640, 480, 100, 100, 0.5), zoom_crop_rect(640, 480, 100, 100, 1.0));
    }

    #[test]
    fn test_subsample_nearest_neighbour() {
        let src = Image::from_planes(4, vec![(0..16).map(f64::from).collect()]);
        let rect = Rect { x: 0, y: 0, width: 4, height: 4 };
        let out = subsample(&src, rect, 2, 2);
        assert_eq!(out.plane(0), &[0.0, 2.0, 8.0, 10.0]);

        let rect = Rect { x: 1, y: 1, width: 2, height: 2 };
        let out = subsample(&src, rect, 2, 2);
        assert_eq!(out.plane(0), &[5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    #[should_panic(expected = "exceeds source")]
    fn test_subsample_out_of_bounds_panics() {
        let src = Image::new(4, 4, 1);
        subsample(&src, Rect { x: 2, y: 0, width: 4, height: 4 }, 2, 2);
    }

    #[test]
    fn test_display_centres_and_pads() {
        let buf = Image::filled(2, 2, 1, 1.0);
        let canvas = convert_to_display(&buf, 4, 4);
        assert_eq!(canvas.len(), 16);
        assert_eq!(canvas[0], DISPLAY_PADDING);
        assert_eq!(canvas[5], [255, 255, 255, 255]);
        assert_eq!(canvas[10], [255, 255, 255, 255]);
        assert_eq!(canvas[15], DISPLAY_PADDING);
    }

    #[test]
    fn test_display_channel_layouts() {
        let rgb = Image::from_planes(1, vec![vec![1.0], vec![0.0], vec![0.5]]);
        assert_eq!(convert_to_display(&rgb, 1, 1)[0], [255, 0, 128, 255]);
        let rgba = Image::from_planes(1, vec![vec![0.2], vec![0.0], vec![1.0], vec![0.0]]);
        assert_eq!(convert_to_display(&rgba, 1, 1)[0], [51, 0, 255, 255]);
        let two = Image::from_planes(1, vec![vec![1.0], vec![0.0]]);
        assert_eq!(convert_to_display(&two, 1, 1)[0], [255, 0, 0, 255]);
        let gray = Image::from_planes(1, vec![vec![0.5]]);
        assert_eq!(convert_to_display(&gray, 1, 1)[0], [128, 128, 128, 255]);
    }

    #[test]
    #[should_panic(expected = "larger than display canvas")]
    fn test_display_too_small_panics() {
        convert_to_display(&Image::new(5, 5, 3), 4, 4);
    }
}
