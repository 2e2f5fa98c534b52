//! Static meshes shared by every scene: a unit box and a unit plane.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub const CUBE_VERTEX_COUNT: u32 = 36;
pub const PLANE_VERTEX_COUNT: u32 = 6;

/// Two counter-clockwise triangles for the face with normal `n`, spanned by
/// `u` and `v` where `u x v = n`.
fn push_face(out: &mut Vec<MeshVertex>, n: Vec3, u: Vec3, v: Vec3, offset: f32) {
    let center = n * offset;
    for (su, sv) in [
        (-0.5, -0.5),
        (0.5, -0.5),
        (0.5, 0.5),
        (-0.5, -0.5),
        (0.5, 0.5),
        (-0.5, 0.5),
    ] {
        out.push(MeshVertex {
            position: (center + u * su + v * sv).to_array(),
            normal: n.to_array(),
        });
    }
}

/// Unit box centred on the origin, followed by a unit plane in XY facing +Z.
///
/// Box vertices occupy `0..CUBE_VERTEX_COUNT`; plane vertices follow.
pub fn scene_vertices() -> Vec<MeshVertex> {
    let mut vertices = Vec::with_capacity((CUBE_VERTEX_COUNT + PLANE_VERTEX_COUNT) as usize);
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];
    for (n, u, v) in faces {
        push_face(&mut vertices, n, u, v, 0.5);
    }
    push_face(&mut vertices, Vec3::Z, Vec3::X, Vec3::Y, 0.0);
    vertices
}
