//! Renderer abstraction used by the viewport.
//!
//! [`crate::gpu::GpuRenderer`] draws the scene with wgpu; [`FrameRecorder`]
//! draws nothing and records what each draw saw, for headless hosts and
//! tests.

use crate::gpu::GpuError;
use crate::scene::SceneGraph;
use crate::surface::{Frame, Surface, SurfaceError};
use crate::viewport::Camera;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Errors that can occur while drawing a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Output surface lost")]
    SurfaceLost,
    #[error("Renderer resources already released")]
    Released,
    #[error("Surface error: {0}")]
    Surface(SurfaceError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

impl RenderError {
    /// Whether the error ends the render loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SurfaceLost)
    }
}

impl From<SurfaceError> for RenderError {
    fn from(err: SurfaceError) -> Self {
        match err {
            SurfaceError::Lost => Self::SurfaceLost,
            other => Self::Surface(other),
        }
    }
}

/// Draws a scene into an output surface.
pub trait Renderer: Send {
    /// Resize the render target. Called before the next draw that needs it.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Draw the current scene state once and present it.
    ///
    /// Takes the scene mutably so dirty point buffers can be marked uploaded.
    fn draw(
        &mut self,
        scene: &mut SceneGraph,
        camera: &Camera,
        surface: &mut dyn Surface,
    ) -> Result<(), RenderError>;

    /// Release every GPU-resident resource. Later draws fail with
    /// [`RenderError::Released`].
    fn release(&mut self);
}

/// What one draw observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub width: u32,
    pub height: u32,
    pub aspect: f32,
    pub eye: [f32; 3],
    pub element_count: usize,
    /// Whether the point buffer needed a re-upload for this draw.
    pub points_dirty: bool,
}

#[derive(Debug, Default)]
struct RecorderState {
    draws: Vec<DrawRecord>,
    released: bool,
    max_in_flight: usize,
}

/// GPU-free renderer that records every draw.
///
/// Clones share state so a test or host can inspect draws while the viewport
/// owns another clone. Each draw presents a cleared frame to the surface.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    state: Arc<Mutex<RecorderState>>,
    in_flight: Arc<AtomicUsize>,
    draw_delay: Duration,
    width: u32,
    height: u32,
    scratch: Vec<u8>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every draw for `delay`, widening the window in which overlapping
    /// draws would be observable.
    pub fn with_draw_delay(mut self, delay: Duration) -> Self {
        self.draw_delay = delay;
        self
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn draw_count(&self) -> usize {
        self.lock().draws.len()
    }

    pub fn last_draw(&self) -> Option<DrawRecord> {
        self.lock().draws.last().copied()
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.lock().draws.clone()
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    /// Highest number of draws observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }
}

impl Renderer for FrameRecorder {
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.width = width;
        self.height = height;
        self.scratch = vec![0; (width as usize) * (height as usize) * 4];
        Ok(())
    }

    fn draw(
        &mut self,
        scene: &mut SceneGraph,
        camera: &Camera,
        surface: &mut dyn Surface,
    ) -> Result<(), RenderError> {
        if self.is_released() {
            return Err(RenderError::Released);
        }

        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.draw_delay.is_zero() {
            std::thread::sleep(self.draw_delay);
        }
        let presented = surface.present(&Frame {
            width: self.width,
            height: self.height,
            pixels: &self.scratch,
        });
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut state = self.lock();
        state.max_in_flight = state.max_in_flight.max(concurrent);
        presented?;

        let points_dirty = match scene.point_cloud_mut() {
            Some(cloud) if cloud.is_dirty() => {
                cloud.mark_uploaded();
                true
            }
            _ => false,
        };
        state.draws.push(DrawRecord {
            width: self.width,
            height: self.height,
            aspect: camera.aspect(),
            eye: camera.position().to_array(),
            element_count: scene.len(),
            points_dirty,
        });
        Ok(())
    }

    fn release(&mut self) {
        self.scratch = Vec::new();
        self.lock().released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, VisualizerConfig};
    use crate::surface::HeadlessSurface;

    #[test]
    fn test_surface_lost_maps_to_fatal_error() {
        let err = RenderError::from(SurfaceError::Lost);
        assert!(matches!(err, RenderError::SurfaceLost));
        assert!(err.is_fatal());
        assert!(!RenderError::Released.is_fatal());
    }

    #[test]
    fn test_recorder_records_camera_and_presents() {
        let mut scene = SceneGraph::with_bars(32, &VisualizerConfig::default());
        let mut camera = Camera::new(&CameraConfig::default(), 1.0);
        camera.set_aspect(2.0);
        let surface = HeadlessSurface::new(4, 2);
        let mut owned_surface = surface.clone();

        let recorder = FrameRecorder::new();
        let mut renderer = recorder.clone();
        renderer.resize(4, 2).unwrap();
        renderer.draw(&mut scene, &camera, &mut owned_surface).unwrap();

        let record = recorder.last_draw().unwrap();
        assert_eq!(record.aspect, 2.0);
        assert_eq!(record.element_count, 32);
        assert!(!record.points_dirty);
        assert_eq!((record.width, record.height), (4, 2));
        assert_eq!(surface.present_count(), 1);
        assert_eq!(recorder.max_in_flight(), 1);
    }

    #[test]
    fn test_released_recorder_refuses_to_draw() {
        let mut scene = SceneGraph::with_points(8, &VisualizerConfig::default());
        let camera = Camera::new(&CameraConfig::default(), 1.0);
        let mut surface = HeadlessSurface::new(1, 1);

        let mut renderer = FrameRecorder::new();
        renderer.release();
        let result = renderer.draw(&mut scene, &camera, &mut surface);
        assert!(matches!(result, Err(RenderError::Released)));
        assert_eq!(renderer.draw_count(), 0);
    }

    #[test]
    fn test_point_buffer_uploaded_once() {
        let mut scene = SceneGraph::with_points(8, &VisualizerConfig::default());
        let camera = Camera::new(&CameraConfig::default(), 1.0);
        let mut surface = HeadlessSurface::new(2, 2);

        let recorder = FrameRecorder::new();
        let mut renderer = recorder.clone();
        renderer.resize(2, 2).unwrap();
        renderer.draw(&mut scene, &camera, &mut surface).unwrap();
        renderer.draw(&mut scene, &camera, &mut surface).unwrap();

        let draws = recorder.draws();
        assert!(draws[0].points_dirty);
        assert!(!draws[1].points_dirty);
        assert!(!scene.point_cloud().unwrap().is_dirty());
    }
}
