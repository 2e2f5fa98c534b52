//! Example: Drive a visualizer headlessly and save the last frame.
//!
//! Feeds synthetic amplitude buffers to a GPU-backed visualizer for a couple
//! of seconds, then writes the final frame to a PNG.
//!
//! Run with:
//!     cargo run --example render_headless -- [bar|circular] [output.png]

use anyhow::{bail, Context, Result};
use phobz_live::{create_gpu_visualizer, HeadlessSurface, VisualizerConfig, VisualizerKind};
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

/// Amplitude buffer of a slowly travelling wave.
fn synthetic_buffer(len: usize, t: f32) -> Vec<u8> {
    (0..len)
        .map(|i| {
            let phase = i as f32 / len as f32 * TAU;
            let level = 0.5 + 0.5 * (phase * 3.0 + t * 4.0).sin();
            (level * 255.0) as u8
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let kind_name = args.next().unwrap_or_else(|| "bar".to_string());
    let output = args.next().unwrap_or_else(|| format!("{}_frame.png", kind_name));

    let Some(kind) = VisualizerKind::from_str(&kind_name) else {
        let available: Vec<_> = VisualizerKind::all().iter().map(|k| k.name()).collect();
        bail!("Unknown visualizer '{}'. Available: {}", kind_name, available.join(", "));
    };

    println!("Phobz Live - Headless Render");
    println!("============================\n");
    println!("  Visualizer: {} ({})", kind.name(), kind.description());

    let surface = HeadlessSurface::new(640, 360);
    let config = VisualizerConfig::default();
    let visualizer = create_gpu_visualizer(kind, Box::new(surface.clone()), &config)
        .context("Failed to create visualizer")?;

    let start = Instant::now();
    let duration = Duration::from_secs(2);
    while start.elapsed() < duration {
        let t = start.elapsed().as_secs_f32();
        visualizer.update(&synthetic_buffer(kind.element_count(), t))?;
        std::thread::sleep(Duration::from_millis(20));
    }

    // Simulate the host resizing its window
    surface.set_size(800, 450);
    visualizer.on_resize()?;
    std::thread::sleep(Duration::from_millis(100));

    visualizer.dispose();
    println!("  Frames presented: {}", surface.present_count());

    surface
        .save_png(&output)
        .with_context(|| format!("Failed to write {}", output))?;
    println!("  Saved last frame to {}", output);

    Ok(())
}
