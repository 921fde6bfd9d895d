use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use emo_core::{DetectionConfig, Image};
use emo_harris::{valid_convolve, CornerPipeline, KernelKind, KernelRegistry, PipelineBuilder, PipelineConfig};
use emo_select::CornerSelector;

/// Create benchmark frame with corner-like structures on a noisy gradient
fn create_benchmark_image(width: usize, height: usize, channels: usize) -> Image {
    let mut img = Image::new(width, height, channels);
    for c in 0..channels {
        for y in 0..height {
            for x in 0..width {
                let gradient = (x as f64 / width as f64) * 50.0;
                let noise = ((x + y + c) % 7) as f64;
                img.set(y, x, c, 100.0 + gradient + noise);
            }
        }
        for i in 0..20 {
            let cx = (i * width / 20 + c * 3) % width;
            let cy = (i * height / 20) % height;
            for dy in 0..5 {
                for dx in 0..5 {
                    let (x, y) = (cx + dx, cy + dy);
                    if x < width && y < height {
                        img.set(y, x, c, if (dx + dy) % 2 == 0 { 50.0 } else { 200.0 });
                    }
                }
            }
        }
    }
    img
}

/// Benchmark valid convolution with each registered kernel
fn bench_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("convolution");
    let registry = KernelRegistry::global();

    for &size in &[64usize, 128, 256] {
        let img = create_benchmark_image(size, size, 3);
        for kind in [KernelKind::SobelX, KernelKind::Gaussian5Sigma1, KernelKind::Gaussian9Sigma3] {
            let kernel = registry.get(kind);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", kind), format!("{}x{}", size, size)),
                &img,
                |b, img| b.iter(|| black_box(valid_convolve(black_box(img), kernel))),
            );
        }
    }

    group.finish();
}

/// Benchmark a full response pass for both presets
fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");

    for &size in &[64usize, 128, 256] {
        let img = create_benchmark_image(size, size, 3);
        let presets = [
            ("responsive", PipelineConfig::responsive(size, size)),
            ("stable", PipelineConfig::stable(size, size)),
        ];
        for (name, cfg) in presets {
            let mut pipeline = CornerPipeline::new(cfg).unwrap();
            group.bench_function(BenchmarkId::new(name, format!("{}x{}", size, size)), |b| {
                b.iter(|| {
                    let response = pipeline.run(black_box(&img)).unwrap();
                    black_box(response.pixel_count())
                })
            });
        }
    }

    group.finish();
}

/// Benchmark greedy selection over a real response buffer
fn bench_selection(c: &mut Criterion) {
    let size = 256;
    let img = create_benchmark_image(size, size, 3);
    let mut pipeline = PipelineBuilder::new(size, size).preset_responsive().build().unwrap();
    let response = pipeline.run(&img).unwrap().clone();

    let mut group = c.benchmark_group("selection");

    for &n in &[10usize, 50, 200] {
        let cfg = DetectionConfig {
            n_corners: n,
            ..DetectionConfig::default()
        };
        let selector = CornerSelector::from_config(&cfg).unwrap();
        group.bench_with_input(BenchmarkId::new("select", n), &response, |b, response| {
            b.iter(|| black_box(selector.select(black_box(response))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_convolution, bench_full_pipeline, bench_selection);
criterion_main!(benches);
