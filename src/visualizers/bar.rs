use super::instance::Instance;
use super::{Visualizer, VisualizerError, VisualizerKind};
use crate::config::VisualizerConfig;
use crate::mapping::map_bar;
use crate::renderer::Renderer;
use crate::scene::{ElementTransform, SceneGraph};
use crate::surface::Surface;

/// Ring of lit bars, one per amplitude sample.
///
/// A zero sample leaves its bar untouched, the same as a missing one.
pub struct BarVisualizer {
    inner: Instance,
}

impl BarVisualizer {
    pub const ELEMENT_COUNT: usize = 32;

    pub fn create(
        surface: Box<dyn Surface>,
        renderer: Box<dyn Renderer>,
        config: &VisualizerConfig,
    ) -> Result<Self, VisualizerError> {
        let scene = SceneGraph::with_bars(Self::ELEMENT_COUNT, config);
        Ok(Self {
            inner: Instance::create(VisualizerKind::Bar, scene, surface, renderer, config)?,
        })
    }
}

impl Visualizer for BarVisualizer {
    fn kind(&self) -> VisualizerKind {
        self.inner.kind()
    }

    fn update(&self, audio: &[u8]) -> Result<(), VisualizerError> {
        self.inner.update(audio, |_, sample| {
            (sample != 0).then(|| ElementTransform::Bar(map_bar(sample)))
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
