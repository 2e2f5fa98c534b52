//! Phobz Live Core
//!
//! Real-time 3D audio visualizers driven by amplitude buffers.
//!
//! # Features
//!
//! - Radial bar ring (32 bars) and spinning particle circle (128 points)
//! - Orbiting camera redrawn at a fixed tick rate on a worker thread
//! - GPU rendering via wgpu into a headless target, presented to a host surface
//! - GPU-free `FrameRecorder` renderer for tests and headless hosts
//! - JSON-configurable scene constants

pub mod config;
pub mod gpu;
pub mod mapping;
pub mod render_loop;
pub mod renderer;
pub mod scene;
pub mod surface;
pub mod viewport;
pub mod visualizers;

// Re-export commonly used types
pub use config::{ConfigError, VisualizerConfig};
pub use gpu::{GpuContext, GpuError, GpuRenderer};
pub use mapping::{map_bar, map_circular, BarTransform, ParticleTransform};
pub use render_loop::{CameraOrbit, LoopState, RenderLoop};
pub use renderer::{DrawRecord, FrameRecorder, RenderError, Renderer};
pub use scene::{ElementTransform, SceneGraph};
pub use surface::{Frame, HeadlessSurface, Surface, SurfaceError};
pub use viewport::{Camera, Viewport};
pub use visualizers::{
    create_gpu_visualizer, create_visualizer, BarVisualizer, CircularVisualizer, Visualizer,
    VisualizerError, VisualizerKind,
};
