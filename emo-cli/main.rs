use emo_cli::{load_rgb, Config, CornerFinder};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_circle_mut;
use std::error::Error;
use std::time::Instant;

const MARKER_COLORS: [Rgba<u8>; 3] = [Rgba([255, 0, 0, 255]), Rgba([0, 255, 0, 255]), Rgba([0, 0, 255, 255])];

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // emo-corners [input] [output] [corner count]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = args.first().map(String::as_str).unwrap_or("lenna.png");
    let output = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| format!("{}_corners.png", input.trim_end_matches(".png")));
    let mut cfg = Config::default();
    if let Some(n) = args.get(2) {
        cfg.n_corners = n.parse()?;
    }

    let img = load_rgb(input)?;
    let (width, height) = (img.stride(), img.height());
    println!("Loaded {} ({}x{})", input, width, height);

    let mut finder = CornerFinder::new(cfg, width, height, img.channels())?;

    // Time the full pipeline
    let t0 = Instant::now();
    let points = finder.detect(&img)?;
    let elapsed = t0.elapsed();

    println!("Time taken: {:.2?}", elapsed);
    println!("Selected {} corners", points.len());

    let rgba: Vec<u8> = (0..width * height)
        .flat_map(|i| {
            let px = |c: usize| (img.plane(c)[i] * 255.0).round() as u8;
            [px(0), px(1), px(2), 255]
        })
        .collect();
    let mut annotated = RgbaImage::from_raw(width as u32, height as u32, rgba).ok_or("frame size mismatch")?;

    // Marker colour follows the channel the corner was picked from
    for p in &points {
        draw_hollow_circle_mut(
            &mut annotated,
            (p.col as i32, p.row as i32),
            4,
            MARKER_COLORS[p.channel % MARKER_COLORS.len()],
        );
    }
    annotated.save(&output)?;
    println!("Saved annotated image as {}", output);

    let (dw, dh) = finder.display_dimensions();
    let response_path = format!("{}_response.png", output.trim_end_matches(".png"));
    let flat: Vec<u8> = finder.display().iter().flatten().copied().collect();
    let response = RgbaImage::from_raw(dw as u32, dh as u32, flat).ok_or("display size mismatch")?;
    response.save(&response_path)?;
    println!("Saved response map as {}", response_path);

    Ok(())
}
