//! Per-instance context shared by both strategies.

use super::{VisualizerError, VisualizerKind};
use crate::config::VisualizerConfig;
use crate::render_loop::{lock_frame, FrameContext, PendingInput, RenderLoop, SharedFrame};
use crate::renderer::Renderer;
use crate::scene::{ElementTransform, SceneGraph};
use crate::surface::Surface;
use crate::viewport::Viewport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Fail with [`VisualizerError::MissingSurface`] on a zero-area surface.
pub(super) fn ensure_drawable(surface: &dyn Surface) -> Result<(), VisualizerError> {
    let (width, height) = surface.size();
    if width == 0 || height == 0 {
        return Err(VisualizerError::MissingSurface);
    }
    Ok(())
}

/// Scene, viewport and render loop of one visualizer.
///
/// Host calls only touch `input`; the frame lock is left to the render loop
/// and to teardown.
pub(super) struct Instance {
    kind: VisualizerKind,
    element_count: usize,
    frame: SharedFrame,
    input: Arc<PendingInput>,
    render_loop: Mutex<RenderLoop>,
    disposed: AtomicBool,
    warned_oversize: AtomicBool,
}

impl Instance {
    pub(super) fn create(
        kind: VisualizerKind,
        scene: SceneGraph,
        surface: Box<dyn Surface>,
        renderer: Box<dyn Renderer>,
        config: &VisualizerConfig,
    ) -> Result<Self, VisualizerError> {
        config.validate()?;
        ensure_drawable(surface.as_ref())?;

        let viewport = Viewport::new(surface, renderer, &config.camera)?;
        let (width, height) = viewport.size();
        let element_count = scene.len();
        let context = FrameContext::new(scene, viewport, config);
        let input = context.input();
        let frame: SharedFrame = Arc::new(Mutex::new(context));

        let mut render_loop = RenderLoop::new(config.frame.tick_interval());
        if let Err(err) = render_loop.start(frame.clone()) {
            lock_frame(&frame).viewport.dispose();
            return Err(VisualizerError::LoopSpawn(err));
        }

        log::info!(
            "Created {} visualizer ({} elements, {}x{})",
            kind.name(),
            element_count,
            width,
            height
        );

        Ok(Self {
            kind,
            element_count,
            frame,
            input,
            render_loop: Mutex::new(render_loop),
            disposed: AtomicBool::new(false),
            warned_oversize: AtomicBool::new(false),
        })
    }

    pub(super) fn kind(&self) -> VisualizerKind {
        self.kind
    }

    /// Map each available sample through `map` and stage the result for the
    /// next tick. Never waits on a draw.
    ///
    /// `map` returning `None` leaves that element unchanged.
    pub(super) fn update<F>(&self, audio: &[u8], mut map: F) -> Result<(), VisualizerError>
    where
        F: FnMut(usize, u8) -> Option<ElementTransform>,
    {
        if self.is_disposed() {
            return Ok(());
        }
        if self.input.is_surface_lost() {
            return Err(VisualizerError::SurfaceLost);
        }

        let count = self.element_count;
        if audio.len() > count && !self.warned_oversize.swap(true, Ordering::Relaxed) {
            log::warn!(
                "{} visualizer got {} samples, using the first {}",
                self.kind.name(),
                audio.len(),
                count
            );
        }
        self.input.stage(
            audio
                .iter()
                .take(count)
                .enumerate()
                .filter_map(|(index, &sample)| map(index, sample).map(|t| (index, t))),
        );
        Ok(())
    }

    /// Flag the viewport for a resize on the next tick.
    pub(super) fn resize(&self) -> Result<(), VisualizerError> {
        if self.is_disposed() {
            return Ok(());
        }
        if self.input.is_surface_lost() {
            return Err(VisualizerError::SurfaceLost);
        }
        self.input.request_resize();
        Ok(())
    }

    pub(super) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        // The loop must be gone before anything it draws with is released
        self.render_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop();

        let mut ctx = lock_frame(&self.frame);
        ctx.viewport.dispose();
        ctx.scene.teardown();
        log::info!("Disposed {} visualizer", self.kind.name());
    }

    pub(super) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub(super) fn fatal_error(&self) -> Option<VisualizerError> {
        self.input
            .is_surface_lost()
            .then_some(VisualizerError::SurfaceLost)
    }

    /// The drawn scene with staged updates applied. Waits for a running draw.
    pub(super) fn scene_snapshot(&self) -> SceneGraph {
        let mut scene = lock_frame(&self.frame).scene.clone();
        self.input.overlay(&mut scene);
        scene
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.dispose();
    }
}
