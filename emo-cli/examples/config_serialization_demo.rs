#[cfg(feature = "serde")]
use emo_cli::{load_rgb, Config, CornerFinder};
#[cfg(feature = "serde")]
use emo_harris::PipelineConfig;
#[cfg(feature = "serde")]
use std::time::Instant;

#[cfg(feature = "serde")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔧 Corner Pipeline Configuration Demo");
    println!("======================================\n");

    let img = load_rgb("lenna.png")?;
    let (width, height) = (img.stride(), img.height());
    println!("📷 Image dimensions: {}x{}", width, height);

    // Demo 1: Create configurations
    println!("📋 Demo 1: Creating Configurations");
    let responsive = PipelineConfig::responsive(width, height);
    let stable = PipelineConfig::stable(width, height);
    let custom = PipelineConfig::new(width, height).with_name("Custom");
    for cfg in [&responsive, &stable, &custom] {
        println!("   • {}", cfg.summary());
    }

    // Demo 2: JSON and TOML files
    println!("\n📄 Demo 2: Saving");
    responsive.save_json("responsive_pipeline.json")?;
    stable.save_toml("stable_pipeline.toml")?;
    println!("   ✅ Saved responsive_pipeline.json and stable_pipeline.toml");

    // Demo 3: Load, validate and detect
    println!("\n🎯 Demo 3: Configuration-Based Detection");
    let loaded = [
        ("Responsive (JSON)", PipelineConfig::load_json("responsive_pipeline.json")?),
        ("Stable (TOML)", PipelineConfig::load_toml("stable_pipeline.toml")?),
    ];
    for (name, cfg) in loaded {
        let start = Instant::now();
        let mut finder = CornerFinder::with_pipeline_config(Config::default(), cfg)?;
        let points = finder.detect(&img)?;
        println!("   • {}: {:.2?}, {} corners", name, start.elapsed(), points.len());
    }

    // Demo 4: Round-trip
    println!("\n🔄 Demo 4: Round-trip Testing");
    let original = custom.to_builder().kappa(0.08).to_config();
    let from_json = PipelineConfig::from_json(&original.to_json()?)?;
    let from_toml = PipelineConfig::from_toml(&original.to_toml()?)?;
    assert_eq!(original, from_json);
    assert_eq!(original, from_toml);
    println!("   ✅ Round-trip serialization is consistent");

    Ok(())
}

#[cfg(not(feature = "serde"))]
fn main() {
    println!("🔧 Corner Pipeline Configuration Demo");
    println!("❌ This demo requires the 'serde' feature to be enabled.");
    println!("   Run with: cargo run --example config_serialization_demo --features=serde");
}
