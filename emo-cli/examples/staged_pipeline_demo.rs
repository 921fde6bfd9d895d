use emo_cli::load_rgb;
use emo_harris::PipelineBuilder;
use emo_select::CornerSelector;
use std::time::Instant;

/// Drives the pipeline one stage at a time, the way an interactive front end
/// interleaves detection with its own work.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🎯 Staged Corner Pipeline Demo");
    println!("===============================\n");

    let img = load_rgb("lenna.png")?;
    let (width, height) = (img.stride(), img.height());

    let builders = [
        ("responsive", PipelineBuilder::new(width, height).preset_responsive()),
        ("stable", PipelineBuilder::new(width, height).preset_stable()),
        ("custom", PipelineBuilder::new(width, height).kappa(0.12)),
    ];

    for (name, builder) in builders {
        println!("⚙️  {}", builder.summary());
        let mut pipeline = builder.build()?;

        pipeline.begin(&img)?;
        while pipeline.in_progress() {
            let t0 = Instant::now();
            let stage = pipeline.step()?;
            println!("   {:?}: {:.2?}", stage, t0.elapsed());
        }

        let selector = CornerSelector::new(20, 1.4, 8)?;
        let corners = selector.select(pipeline.response());
        let per_channel: Vec<usize> = (0..img.channels())
            .map(|c| corners.iter().filter(|k| k.channel == c).count())
            .collect();
        println!("   {}: {} corners, per channel {:?}\n", name, corners.len(), per_channel);
    }

    Ok(())
}
