//! Visualizer strategies and their registry.
//!
//! Every strategy shares one lifecycle: create against a host surface,
//! `update` with amplitude buffers, `on_resize` when the surface changes and
//! `dispose` once at the end. Calls after disposal are no-ops.

mod bar;
mod circular;
mod instance;

pub use bar::BarVisualizer;
pub use circular::CircularVisualizer;

use crate::config::{ConfigError, VisualizerConfig};
use crate::gpu::{GpuContext, GpuError, GpuRenderer};
use crate::renderer::{RenderError, Renderer};
use crate::scene::SceneGraph;
use crate::surface::Surface;

/// Errors surfaced to the host.
#[derive(Debug, thiserror::Error)]
pub enum VisualizerError {
    #[error("Output surface has no drawable area")]
    MissingSurface,
    #[error("Output surface lost")]
    SurfaceLost,
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Render error: {0}")]
    Render(RenderError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to spawn render loop: {0}")]
    LoopSpawn(#[source] std::io::Error),
}

impl From<RenderError> for VisualizerError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::SurfaceLost => Self::SurfaceLost,
            RenderError::Gpu(err) => Self::Gpu(err),
            other => Self::Render(other),
        }
    }
}

/// Available visualizer strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualizerKind {
    Bar,
    Circular,
}

impl VisualizerKind {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bar" | "bars" => Some(Self::Bar),
            "circular" | "circle" | "particles" => Some(Self::Circular),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Circular => "circular",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Bar => "Ring of 32 lit bars scaling with amplitude",
            Self::Circular => "Spinning cloud of 128 points pushed outward by amplitude",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Bar, Self::Circular]
    }

    /// Number of amplitude samples (and visual elements) the strategy uses.
    pub fn element_count(&self) -> usize {
        match self {
            Self::Bar => BarVisualizer::ELEMENT_COUNT,
            Self::Circular => CircularVisualizer::ELEMENT_COUNT,
        }
    }
}

/// Common lifecycle of every visualizer strategy.
pub trait Visualizer: Send + Sync {
    fn kind(&self) -> VisualizerKind;

    /// Apply one amplitude buffer. Only the first `min(len, N)` elements
    /// change; the rest keep their previous transform.
    ///
    /// Never waits on a draw in progress. The next tick draws the change.
    fn update(&self, audio: &[u8]) -> Result<(), VisualizerError>;

    /// Re-query the surface size before the next tick draws.
    fn on_resize(&self) -> Result<(), VisualizerError>;

    /// Stop the render loop, release GPU resources and detach from the
    /// surface. Safe to call more than once.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    /// The fatal error that stopped the render loop, if any.
    fn fatal_error(&self) -> Option<VisualizerError>;

    /// Copy of the current scene state, staged updates included.
    fn scene_snapshot(&self) -> SceneGraph;
}

/// Create a visualizer drawing into `surface` with `renderer`.
pub fn create_visualizer(
    kind: VisualizerKind,
    surface: Box<dyn Surface>,
    renderer: Box<dyn Renderer>,
    config: &VisualizerConfig,
) -> Result<Box<dyn Visualizer>, VisualizerError> {
    Ok(match kind {
        VisualizerKind::Bar => Box::new(BarVisualizer::create(surface, renderer, config)?),
        VisualizerKind::Circular => {
            Box::new(CircularVisualizer::create(surface, renderer, config)?)
        }
    })
}

/// Create a visualizer backed by a freshly acquired wgpu device.
///
/// Blocks until the device is ready.
pub fn create_gpu_visualizer(
    kind: VisualizerKind,
    surface: Box<dyn Surface>,
    config: &VisualizerConfig,
) -> Result<Box<dyn Visualizer>, VisualizerError> {
    config.validate()?;
    instance::ensure_drawable(surface.as_ref())?;
    let ctx = GpuContext::new_blocking()?;
    let renderer = GpuRenderer::new(ctx, kind.element_count());
    create_visualizer(kind, surface, Box::new(renderer), config)
}
