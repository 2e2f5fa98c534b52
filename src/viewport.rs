//! Camera and output surface of one visualizer.

use crate::config::CameraConfig;
use crate::renderer::{RenderError, Renderer};
use crate::scene::SceneGraph;
use crate::surface::Surface;
use glam::{Mat4, Vec3};

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: Vec3,
    target: Vec3,
    projection: Mat4,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let fov_y = config.fov_degrees.to_radians();
        Self {
            fov_y,
            aspect,
            near: config.near,
            far: config.far,
            position: Vec3::from(config.initial_position),
            target: Vec3::ZERO,
            projection: Mat4::perspective_rh(fov_y, aspect, config.near, config.far),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Set the aspect ratio and rebuild the projection.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }
}

/// Owns the camera, the output surface and the renderer drawing into it.
pub struct Viewport {
    camera: Camera,
    surface: Box<dyn Surface>,
    renderer: Box<dyn Renderer>,
    size: (u32, u32),
    disposed: bool,
}

impl Viewport {
    /// Attach `renderer`'s output to `surface`, sized to the surface.
    ///
    /// The surface must have a non-zero size.
    pub fn new(
        mut surface: Box<dyn Surface>,
        mut renderer: Box<dyn Renderer>,
        config: &CameraConfig,
    ) -> Result<Self, RenderError> {
        let (width, height) = surface.size();
        renderer.resize(width, height)?;
        surface.attach();

        Ok(Self {
            camera: Camera::new(config, aspect_of(width, height)),
            surface,
            renderer,
            size: (width, height),
            disposed: false,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Size the projection and render target were last configured for.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Re-query the surface size and update the projection and render target.
    ///
    /// Idempotent. A zero-area surface keeps the previous configuration.
    pub fn resize(&mut self) -> Result<(), RenderError> {
        if self.disposed {
            return Ok(());
        }
        let (width, height) = self.surface.size();
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to empty surface {}x{}", width, height);
            return Ok(());
        }
        if (width, height) != self.size {
            self.renderer.resize(width, height)?;
            self.size = (width, height);
            log::debug!("Viewport resized to {}x{}", width, height);
        }
        self.camera.set_aspect(aspect_of(width, height));
        Ok(())
    }

    /// Draw `scene` from the current camera. No-op once disposed.
    pub fn draw(&mut self, scene: &mut SceneGraph) -> Result<(), RenderError> {
        if self.disposed {
            return Ok(());
        }
        self.renderer
            .draw(scene, &self.camera, self.surface.as_mut())
    }

    /// Release the renderer and detach from the surface.
    ///
    /// Returns `false` if the viewport was already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.renderer.release();
        self.surface.detach();
        self.disposed = true;
        true
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}
