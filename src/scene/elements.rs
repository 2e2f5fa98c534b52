//! Visual elements: bar meshes and the particle point cloud.

use super::environment::PhongMaterial;
use crate::config::{BarsConfig, ParticlesConfig};
use crate::mapping::{base_angle, element_hue, hsl_to_rgb, BarTransform, ParticleTransform};
use glam::{Mat4, Vec3};

/// One box on the radial bar ring.
#[derive(Debug, Clone, PartialEq)]
pub struct BarElement {
    index: usize,
    angle: f32,
    position: [f32; 2],
    material: PhongMaterial,
    pub transform: BarTransform,
}

impl BarElement {
    fn new(index: usize, count: usize, config: &BarsConfig) -> Self {
        let angle = base_angle(index, count);
        let hue = element_hue(index, count);
        Self {
            index,
            angle,
            position: [angle.cos() * config.ring_radius, angle.sin() * config.ring_radius],
            material: PhongMaterial {
                color: hsl_to_rgb(hue, 1.0, config.base_lightness),
                specular: hsl_to_rgb(hue, 1.0, config.specular_lightness),
                emissive: hsl_to_rgb(hue, 1.0, config.emissive_lightness),
                shininess: config.shininess,
                opacity: 1.0,
            },
            // Untouched meshes sit at unit scale on the origin plane
            transform: BarTransform {
                scale_y: 1.0,
                offset_y: 0.0,
            },
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Angular position on the ring, in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn material(&self) -> &PhongMaterial {
        &self.material
    }

    /// Current world-space centre of the box.
    pub fn world_position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.transform.offset_y, self.position[1])
    }

    /// Model matrix for a unit cube; `box_size` is the unscaled box extent.
    ///
    /// The box is turned by `-angle` about Y so one face points away from the origin.
    pub fn model_matrix(&self, box_size: [f32; 3]) -> Mat4 {
        Mat4::from_translation(self.world_position())
            * Mat4::from_rotation_y(-self.angle)
            * Mat4::from_scale(Vec3::new(
                box_size[0],
                box_size[1] * self.transform.scale_y,
                box_size[2],
            ))
    }
}

pub(crate) fn build_bars(count: usize, config: &BarsConfig) -> Vec<BarElement> {
    (0..count).map(|i| BarElement::new(i, count, config)).collect()
}

/// Indexed point cloud with per-point position and colour buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    angles: Vec<f32>,
    colors: Vec<[f32; 3]>,
    positions: Vec<[f32; 3]>,
    point_size: f32,
    opacity: f32,
    rotation_y: f32,
    dirty: bool,
}

impl PointCloud {
    pub(crate) fn new(count: usize, config: &ParticlesConfig) -> Self {
        Self {
            angles: (0..count).map(|i| base_angle(i, count)).collect(),
            colors: (0..count)
                .map(|i| hsl_to_rgb(element_hue(i, count), 1.0, config.lightness))
                .collect(),
            positions: vec![[0.0; 3]; count],
            point_size: config.point_size,
            opacity: config.opacity,
            rotation_y: 0.0,
            dirty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn angle(&self, index: usize) -> Option<f32> {
        self.angles.get(index).copied()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Rotation of the whole cloud about Y, in radians.
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    /// Whether the position buffer changed since the last upload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_uploaded(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn set_position(&mut self, index: usize, transform: &ParticleTransform) -> bool {
        match self.positions.get_mut(index) {
            Some(slot) => {
                *slot = transform.position();
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn spin(&mut self, delta: f32) {
        self.rotation_y += delta;
    }

    /// Position of point `index` after the cloud rotation.
    pub fn world_position(&self, index: usize) -> Option<Vec3> {
        self.positions
            .get(index)
            .map(|p| Mat4::from_rotation_y(self.rotation_y).transform_point3(Vec3::from(*p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_are_placed_on_ring() {
        let config = BarsConfig::default();
        let bars = build_bars(32, &config);
        assert_eq!(bars.len(), 32);

        for bar in &bars {
            let p = bar.world_position();
            assert!(((p.x * p.x + p.z * p.z).sqrt() - 8.0).abs() < 1e-4);
        }
        // Quarter turn lands on +Z
        let p = bars[8].world_position();
        assert!(p.x.abs() < 1e-4 && (p.z - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_bar_faces_outward() {
        let config = BarsConfig::default();
        let bars = build_bars(32, &config);
        let bar = &bars[5];
        let m = bar.model_matrix(config.box_size);

        // Local +X face normal points radially away from the origin
        let normal = m.transform_vector3(Vec3::X).normalize();
        let radial = Vec3::new(bar.angle().cos(), 0.0, bar.angle().sin());
        assert!((normal - radial).length() < 1e-4);
    }

    #[test]
    fn test_bar_model_scales_height() {
        let config = BarsConfig::default();
        let mut bar = build_bars(4, &config).remove(0);
        bar.transform = BarTransform {
            scale_y: 3.0,
            offset_y: 1.0,
        };
        let m = bar.model_matrix(config.box_size);
        let bottom = m.transform_point3(Vec3::new(0.0, -0.5, 0.0));
        let top = m.transform_point3(Vec3::new(0.0, 0.5, 0.0));
        assert!((bottom.y + 0.5).abs() < 1e-5);
        assert!((top.y - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_point_cloud_marks_dirty_on_write() {
        let mut cloud = PointCloud::new(8, &ParticlesConfig::default());
        cloud.mark_uploaded();
        assert!(!cloud.is_dirty());

        let t = ParticleTransform {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            radius: 1.0,
        };
        assert!(cloud.set_position(3, &t));
        assert!(cloud.is_dirty());
        assert_eq!(cloud.positions()[3], [1.0, 2.0, 3.0]);
        assert!(!cloud.set_position(8, &t));
    }

    #[test]
    fn test_point_cloud_spin_rotates_world_positions() {
        let mut cloud = PointCloud::new(4, &ParticlesConfig::default());
        let t = ParticleTransform {
            x: 5.0,
            y: 0.0,
            z: 0.0,
            radius: 5.0,
        };
        cloud.set_position(0, &t);
        cloud.spin(std::f32::consts::FRAC_PI_2);
        let p = cloud.world_position(0).unwrap();
        // Rotating +X by a quarter turn about Y lands on -Z
        assert!(p.x.abs() < 1e-4 && (p.z + 5.0).abs() < 1e-4);
    }
}
