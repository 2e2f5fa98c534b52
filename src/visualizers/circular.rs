use super::instance::Instance;
use super::{Visualizer, VisualizerError, VisualizerKind};
use crate::config::VisualizerConfig;
use crate::mapping::{base_angle, map_circular};
use crate::renderer::Renderer;
use crate::scene::{ElementTransform, SceneGraph};
use crate::surface::Surface;

/// Point cloud on a circle whose radius and height follow each sample.
///
/// Every available sample is applied, zeros included. The cloud also spins
/// slowly about the vertical axis on every tick.
pub struct CircularVisualizer {
    inner: Instance,
    base_radius: f32,
}

impl CircularVisualizer {
    pub const ELEMENT_COUNT: usize = 128;

    pub fn create(
        surface: Box<dyn Surface>,
        renderer: Box<dyn Renderer>,
        config: &VisualizerConfig,
    ) -> Result<Self, VisualizerError> {
        let scene = SceneGraph::with_points(Self::ELEMENT_COUNT, config);
        Ok(Self {
            inner: Instance::create(VisualizerKind::Circular, scene, surface, renderer, config)?,
            base_radius: config.particles.base_radius,
        })
    }
}

impl Visualizer for CircularVisualizer {
    fn kind(&self) -> VisualizerKind {
        self.inner.kind()
    }

    fn update(&self, audio: &[u8]) -> Result<(), VisualizerError> {
        let base_radius = self.base_radius;
        self.inner.update(audio, |index, sample| {
            let angle = base_angle(index, Self::ELEMENT_COUNT);
            Some(ElementTransform::Particle(map_circular(
                sample,
                angle,
                base_radius,
            )))
        })
    }

    fn on_resize(&self) -> Result<(), VisualizerError> {
        self.inner.resize()
    }

    fn dispose(&self) {
        self.inner.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    fn fatal_error(&self) -> Option<VisualizerError> {
        self.inner.fatal_error()
    }

    fn scene_snapshot(&self) -> SceneGraph {
        self.inner.scene_snapshot()
    }
}
