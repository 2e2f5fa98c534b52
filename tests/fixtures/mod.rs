//! Shared fixtures for visualizer integration tests.
#![allow(dead_code)]

use phobz_live::{
    create_visualizer, FrameRecorder, HeadlessSurface, Visualizer, VisualizerConfig,
    VisualizerKind,
};
use std::time::{Duration, Instant};

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Default scene with a short tick so tests see draws quickly.
pub fn fast_config() -> VisualizerConfig {
    let mut config = VisualizerConfig::default();
    config.frame.tick_interval_ms = 2;
    config
}

/// A visualizer drawing through a [`FrameRecorder`] into a headless surface.
pub struct Harness {
    pub surface: HeadlessSurface,
    pub recorder: FrameRecorder,
    pub visualizer: Box<dyn Visualizer>,
}

pub fn harness(kind: VisualizerKind, width: u32, height: u32) -> Harness {
    harness_with(kind, HeadlessSurface::new(width, height), FrameRecorder::new())
}

pub fn harness_with(
    kind: VisualizerKind,
    surface: HeadlessSurface,
    recorder: FrameRecorder,
) -> Harness {
    init_logging();
    let visualizer = create_visualizer(
        kind,
        Box::new(surface.clone()),
        Box::new(recorder.clone()),
        &fast_config(),
    )
    .expect("visualizer creation failed");
    Harness {
        surface,
        recorder,
        visualizer,
    }
}

/// Poll `done` until it holds or five seconds pass. Returns the final result.
pub fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    done()
}

/// Buffer of `len` samples rising from `start` in steps of 3 (never zero).
pub fn ramp(len: usize, start: u8) -> Vec<u8> {
    (0..len)
        .map(|i| ((start as usize + i * 3) % 255) as u8 + 1)
        .collect()
}
