//! wgpu implementation of [`Renderer`].
//!
//! Draws into an offscreen target, reads the pixels back and presents them
//! to the host surface. There is no depth buffer: the ground is drawn first,
//! bars are sorted back to front and culled, and points go last.

use super::arena::{GpuResource, ResourceArena, ResourceId};
use super::context::GpuContext;
use super::geometry::{self, MeshVertex, CUBE_VERTEX_COUNT, PLANE_VERTEX_COUNT};
use super::pipelines::{create_pipeline_layout, create_scene_layout, RenderPipelineBuilder};
use super::textures::{ReadbackBuffer, RenderTarget, OUTPUT_FORMAT};
use crate::renderer::{RenderError, Renderer};
use crate::scene::{BarElement, PhongMaterial, SceneGraph};
use crate::surface::{Frame, Surface};
use crate::viewport::Camera;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;
use wgpu::{BindGroup, RenderPipeline};

/// Per-frame scene uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    pub ambient: [f32; 4],
    /// xyz = position, w = intensity
    pub spot_position: [f32; 4],
    /// xyz = direction, w = cos(outer angle)
    pub spot_direction: [f32; 4],
    /// rgb = colour, w = cos(inner angle)
    pub spot_color: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_range: [f32; 4],
    pub cloud_rotation: [f32; 4],
}

impl SceneUniforms {
    pub fn new(scene: &SceneGraph, camera: &Camera) -> Self {
        let view = camera.view();
        let lights = scene.lights();
        let spot = &lights.spot;
        let (cos_outer, cos_inner) = spot.cone_cosines();
        let direction = spot.direction();
        let fog = scene.fog();
        let rotation = scene.point_cloud().map_or(0.0, |cloud| cloud.rotation_y());

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_position: camera.position().extend(1.0).to_array(),
            camera_right: view.row(0).truncate().extend(0.0).to_array(),
            camera_up: view.row(1).truncate().extend(0.0).to_array(),
            ambient: rgb_w(lights.ambient.color, 1.0),
            spot_position: rgb_w(spot.position, spot.intensity),
            spot_direction: direction.extend(cos_outer).to_array(),
            spot_color: rgb_w(spot.color, cos_inner),
            fog_color: rgb_w(fog.color, 1.0),
            fog_range: [fog.near, fog.far, 0.0, 0.0],
            cloud_rotation: [rotation.cos(), rotation.sin(), 0.0, 0.0],
        }
    }
}

/// One lit mesh instance (ground plane or bar).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    /// rgb = diffuse, a = opacity
    pub color: [f32; 4],
    /// rgb = specular, a = shininess
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
}

impl MeshInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 10] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
        11 => Float32x4,
    ];

    /// `rotation` transforms normals; the box faces stay axis-aligned under
    /// scaling, so the rotation alone is enough.
    pub fn new(model: Mat4, rotation: Mat3, material: &PhongMaterial) -> Self {
        let cols = rotation.to_cols_array_2d();
        Self {
            model: model.to_cols_array_2d(),
            normal: cols.map(|c| [c[0], c[1], c[2], 0.0]),
            color: rgb_w(material.color, material.opacity),
            specular: rgb_w(material.specular, material.shininess),
            emissive: rgb_w(material.emissive, 0.0),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One billboarded point.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

impl PointInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

fn rgb_w(rgb: [f32; 3], w: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], w]
}

struct Resources {
    vertices: ResourceId,
    uniforms: ResourceId,
    meshes: ResourceId,
    points: ResourceId,
    target: ResourceId,
    readback: ResourceId,
}

/// Draws a [`SceneGraph`] with wgpu.
pub struct GpuRenderer {
    ctx: GpuContext,
    capacity: usize,
    mesh_pipeline: RenderPipeline,
    point_pipeline: RenderPipeline,
    bind_group: BindGroup,
    arena: ResourceArena,
    resources: Resources,
    size: (u32, u32),
    pixels: Vec<u8>,
    mesh_scratch: Vec<MeshInstance>,
    order_scratch: Vec<(f32, usize)>,
    point_scratch: Vec<PointInstance>,
    released: bool,
}

impl GpuRenderer {
    /// Create a renderer for scenes of at most `capacity` elements.
    ///
    /// The render target starts at 1x1; the viewport resizes it before the
    /// first draw.
    pub fn new(ctx: GpuContext, capacity: usize) -> Self {
        let device = &ctx.device;
        let mut arena = ResourceArena::new();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let scene_layout = create_scene_layout(device);
        let pipeline_layout =
            create_pipeline_layout(device, "scene_pipeline_layout", &[&scene_layout]);

        let mesh_pipeline = RenderPipelineBuilder::new("mesh_pipeline", &shader)
            .layout(&pipeline_layout)
            .entry_points("vs_mesh", "fs_mesh")
            .vertex_buffers(vec![MeshVertex::layout(), MeshInstance::layout()])
            .format(OUTPUT_FORMAT)
            .blend(wgpu::BlendState::ALPHA_BLENDING)
            .cull_mode(wgpu::Face::Back)
            .build(device);

        let point_pipeline = RenderPipelineBuilder::new("point_pipeline", &shader)
            .layout(&pipeline_layout)
            .entry_points("vs_point", "fs_point")
            .vertex_buffers(vec![PointInstance::layout()])
            .format(OUTPUT_FORMAT)
            .blend(wgpu::BlendState::ALPHA_BLENDING)
            .build(device);

        let vertex_data = geometry::scene_vertices();
        let vertices = create_buffer(
            &ctx,
            "scene_vertices",
            std::mem::size_of_val(vertex_data.as_slice()),
            wgpu::BufferUsages::VERTEX,
        );
        ctx.queue
            .write_buffer(&vertices, 0, bytemuck::cast_slice(&vertex_data));

        let uniforms = create_buffer(
            &ctx,
            "scene_uniforms",
            std::mem::size_of::<SceneUniforms>(),
            wgpu::BufferUsages::UNIFORM,
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });

        // Ground plus one instance per bar
        let meshes = create_buffer(
            &ctx,
            "mesh_instances",
            std::mem::size_of::<MeshInstance>() * (capacity + 1),
            wgpu::BufferUsages::VERTEX,
        );
        let points = create_buffer(
            &ctx,
            "point_instances",
            std::mem::size_of::<PointInstance>() * capacity.max(1),
            wgpu::BufferUsages::VERTEX,
        );

        let resources = Resources {
            vertices: arena.insert(GpuResource::Buffer(vertices)),
            uniforms: arena.insert(GpuResource::Buffer(uniforms)),
            meshes: arena.insert(GpuResource::Buffer(meshes)),
            points: arena.insert(GpuResource::Buffer(points)),
            target: arena.insert(GpuResource::Target(RenderTarget::for_output(device, 1, 1))),
            readback: arena.insert(GpuResource::Readback(ReadbackBuffer::new(device, 1, 1))),
        };

        log::debug!("GPU renderer created for {} elements", capacity);

        Self {
            ctx,
            capacity,
            mesh_pipeline,
            point_pipeline,
            bind_group,
            arena,
            resources,
            size: (1, 1),
            pixels: Vec::new(),
            mesh_scratch: Vec::with_capacity(capacity + 1),
            order_scratch: Vec::with_capacity(capacity),
            point_scratch: Vec::with_capacity(capacity),
            released: false,
        }
    }

    /// Number of GPU resources currently held.
    pub fn live_resources(&self) -> usize {
        self.arena.live_count()
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.ctx.adapter_info()
    }

    fn buffer(&self, id: ResourceId) -> Result<&wgpu::Buffer, RenderError> {
        self.arena.buffer(id).ok_or(RenderError::Released)
    }

    /// Fill `mesh_scratch` with the ground followed by bars, farthest first.
    fn collect_meshes(&mut self, scene: &SceneGraph, eye: Vec3) {
        self.mesh_scratch.clear();

        let ground = scene.ground();
        self.mesh_scratch.push(MeshInstance::new(
            ground.model_matrix(),
            Mat3::from_rotation_x(-FRAC_PI_2),
            &ground.material,
        ));

        if let Some(bars) = scene.bars() {
            order_far_to_near(bars, eye, self.capacity, &mut self.order_scratch);

            let bar_box = scene.bar_box();
            for &(_, i) in &self.order_scratch {
                let bar = &bars[i];
                self.mesh_scratch.push(MeshInstance::new(
                    bar.model_matrix(bar_box),
                    Mat3::from_rotation_y(-bar.angle()),
                    bar.material(),
                ));
            }
        }
    }

    /// Upload point positions if they changed since the last draw.
    ///
    /// Returns the number of points to draw.
    fn upload_points(&mut self, scene: &mut SceneGraph) -> Result<u32, RenderError> {
        let capacity = self.capacity;
        let Some(cloud) = scene.point_cloud_mut() else {
            return Ok(0);
        };
        let count = cloud.len().min(capacity);
        if cloud.is_dirty() {
            let (size, opacity) = (cloud.point_size(), cloud.opacity());
            self.point_scratch.clear();
            self.point_scratch.extend(
                cloud
                    .positions()
                    .iter()
                    .zip(cloud.colors())
                    .take(count)
                    .map(|(position, color)| PointInstance {
                        position: *position,
                        size,
                        color: rgb_w(*color, opacity),
                    }),
            );
            let buffer = self.buffer(self.resources.points)?;
            self.ctx
                .queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(&self.point_scratch));
            cloud.mark_uploaded();
        }
        Ok(count as u32)
    }
}

/// Fill `order` with `(distance², index)` of the first `limit` bars, farthest
/// from `eye` first.
fn order_far_to_near(
    bars: &[BarElement],
    eye: Vec3,
    limit: usize,
    order: &mut Vec<(f32, usize)>,
) {
    order.clear();
    order.extend(
        bars.iter()
            .take(limit)
            .enumerate()
            .map(|(i, bar)| (bar.world_position().distance_squared(eye), i)),
    );
    order.sort_by(|a, b| b.0.total_cmp(&a.0));
}

fn create_buffer(
    ctx: &GpuContext,
    label: &'static str,
    size: usize,
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl Renderer for GpuRenderer {
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.size {
            return Ok(());
        }

        let device = &self.ctx.device;
        let target = RenderTarget::for_output(device, width, height);
        let readback = ReadbackBuffer::new(device, width, height);
        if !self
            .arena
            .replace(self.resources.target, GpuResource::Target(target))
            || !self
                .arena
                .replace(self.resources.readback, GpuResource::Readback(readback))
        {
            return Err(RenderError::Released);
        }
        self.size = (width, height);
        log::debug!("GPU render target resized to {}x{}", width, height);
        Ok(())
    }

    fn draw(
        &mut self,
        scene: &mut SceneGraph,
        camera: &Camera,
        surface: &mut dyn Surface,
    ) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }

        let uniforms = SceneUniforms::new(scene, camera);
        self.collect_meshes(scene, camera.position());
        let point_count = self.upload_points(scene)?;

        let queue = &self.ctx.queue;
        queue.write_buffer(
            self.buffer(self.resources.uniforms)?,
            0,
            bytemuck::bytes_of(&uniforms),
        );
        queue.write_buffer(
            self.buffer(self.resources.meshes)?,
            0,
            bytemuck::cast_slice(&self.mesh_scratch),
        );

        let target = self
            .arena
            .target(self.resources.target)
            .ok_or(RenderError::Released)?;
        let readback = self
            .arena
            .readback(self.resources.readback)
            .ok_or(RenderError::Released)?;
        let vertices = self.buffer(self.resources.vertices)?;
        let meshes = self.buffer(self.resources.meshes)?;
        let points = self.buffer(self.resources.points)?;

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });

        {
            let clear = scene.clear_color();
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view(),
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0] as f64,
                            g: clear[1] as f64,
                            b: clear[2] as f64,
                            a: clear[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);

            render_pass.set_pipeline(&self.mesh_pipeline);
            render_pass.set_vertex_buffer(0, vertices.slice(..));
            render_pass.set_vertex_buffer(1, meshes.slice(..));
            render_pass.draw(
                CUBE_VERTEX_COUNT..CUBE_VERTEX_COUNT + PLANE_VERTEX_COUNT,
                0..1,
            );
            let bar_instances = self.mesh_scratch.len() as u32;
            if bar_instances > 1 {
                render_pass.draw(0..CUBE_VERTEX_COUNT, 1..bar_instances);
            }

            if point_count > 0 {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_vertex_buffer(0, points.slice(..));
                // Six vertices per billboard quad
                render_pass.draw(0..6, 0..point_count);
            }
        }

        readback.copy_from(&mut encoder, target);
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        readback.read_into(&self.ctx.device, &mut self.pixels)?;

        let (width, height) = target.size();
        surface.present(&Frame {
            width,
            height,
            pixels: &self.pixels,
        })?;
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        let released = self.arena.release_all();
        self.pixels = Vec::new();
        self.released = true;
        log::debug!("GPU renderer released {} resources", released);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, VisualizerConfig};
    use crate::mapping::{map_bar, map_circular};
    use crate::scene::ElementTransform;
    use crate::surface::HeadlessSurface;

    fn renderer(capacity: usize) -> Option<GpuRenderer> {
        GpuContext::new_blocking()
            .ok()
            .map(|ctx| GpuRenderer::new(ctx, capacity))
    }

    #[test]
    fn test_instance_layout_sizes() {
        assert_eq!(std::mem::size_of::<MeshInstance>(), 160);
        assert_eq!(std::mem::size_of::<PointInstance>(), 32);
        assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
    }

    #[test]
    fn test_uniforms_carry_camera_basis() {
        let scene = SceneGraph::with_bars(4, &VisualizerConfig::default());
        let camera = Camera::new(&CameraConfig::default(), 1.0);
        let uniforms = SceneUniforms::new(&scene, &camera);

        // Camera on +Z looking at the origin: right is +X, up is roughly +Y
        assert!((uniforms.camera_right[0] - 1.0).abs() < 1e-5);
        assert!(uniforms.camera_up[1] > 0.9);
        assert_eq!(uniforms.camera_position[..3], [0.0, 5.0, 15.0]);
        assert_eq!(uniforms.cloud_rotation[..2], [1.0, 0.0]);
    }

    #[test]
    fn test_bar_order_reuses_scratch() {
        let scene = SceneGraph::with_bars(32, &VisualizerConfig::default());
        let bars = scene.bars().unwrap();
        let eye = Vec3::new(0.0, 5.0, 15.0);
        let mut order = Vec::with_capacity(32);
        let storage = order.as_ptr();

        order_far_to_near(bars, eye, 32, &mut order);
        assert_eq!(order.len(), 32);
        assert!(order.windows(2).all(|w| w[0].0 >= w[1].0));
        // Bar 24 sits at angle 3π/2, on the far side of the ring
        assert_eq!(order[0].1, 24);
        assert_eq!(order[31].1, 8);

        order_far_to_near(bars, eye, 8, &mut order);
        assert_eq!(order.len(), 8);
        assert_eq!(order.as_ptr(), storage);
    }

    #[test]
    fn test_draw_bars_presents_frame() {
        let Some(mut renderer) = renderer(32) else {
            return;
        };
        let mut scene = SceneGraph::with_bars(32, &VisualizerConfig::default());
        for i in 0..32 {
            scene.apply_update(i, ElementTransform::Bar(map_bar(200)));
        }
        let camera = Camera::new(&CameraConfig::default(), 64.0 / 48.0);
        let host = HeadlessSurface::new(64, 48);
        let mut surface = host.clone();

        renderer.resize(64, 48).unwrap();
        renderer.draw(&mut scene, &camera, &mut surface).unwrap();

        let (width, height, pixels) = host.last_frame().unwrap();
        assert_eq!((width, height), (64, 48));
        assert_eq!(pixels.len(), 64 * 48 * 4);
        assert!(pixels.iter().any(|&p| p != 0));
    }

    #[test]
    fn test_draw_points_uploads_once() {
        let Some(mut renderer) = renderer(128) else {
            return;
        };
        let mut scene = SceneGraph::with_points(128, &VisualizerConfig::default());
        scene.apply_update(0, ElementTransform::Particle(map_circular(255, 0.0, 5.0)));
        let camera = Camera::new(&CameraConfig::default(), 1.0);
        let mut surface = HeadlessSurface::new(32, 32);

        renderer.resize(32, 32).unwrap();
        renderer.draw(&mut scene, &camera, &mut surface).unwrap();
        assert!(!scene.point_cloud().unwrap().is_dirty());
        assert_eq!(renderer.point_scratch.len(), 128);

        let storage = renderer.point_scratch.as_ptr();
        scene.apply_update(1, ElementTransform::Particle(map_circular(9, 1.0, 5.0)));
        renderer.draw(&mut scene, &camera, &mut surface).unwrap();
        assert_eq!(renderer.point_scratch.as_ptr(), storage);
    }

    #[test]
    fn test_release_frees_everything() {
        let Some(mut renderer) = renderer(8) else {
            return;
        };
        assert_eq!(renderer.live_resources(), 6);
        renderer.release();
        assert_eq!(renderer.live_resources(), 0);

        let mut scene = SceneGraph::with_bars(8, &VisualizerConfig::default());
        let camera = Camera::new(&CameraConfig::default(), 1.0);
        let mut surface = HeadlessSurface::new(8, 8);
        let result = renderer.draw(&mut scene, &camera, &mut surface);
        assert!(matches!(result, Err(RenderError::Released)));
    }
}
