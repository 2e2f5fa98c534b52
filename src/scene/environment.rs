//! Static scene resources: ground plane, lights and fog.

use crate::config::{FogConfig, GroundConfig, LightingConfig};
use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Phong-style surface description shared by bars and the ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub color: [f32; 3],
    pub specular: [f32; 3],
    pub emissive: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
}

/// Horizontal, semi-transparent plane beneath the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPlane {
    pub size: f32,
    pub elevation: f32,
    pub material: PhongMaterial,
}

impl GroundPlane {
    pub fn from_config(config: &GroundConfig) -> Self {
        Self {
            size: config.size,
            elevation: config.elevation,
            material: PhongMaterial {
                color: config.color,
                specular: config.specular,
                emissive: [0.0; 3],
                shininess: config.shininess,
                opacity: config.opacity,
            },
        }
    }

    /// Model matrix for a unit quad in the XY plane facing +Z.
    ///
    /// The quad is laid flat by a -90 degree turn about X so its normal points up.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, self.elevation, 0.0))
            * Mat4::from_rotation_x(-FRAC_PI_2)
            * Mat4::from_scale(Vec3::new(self.size, self.size, 1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
}

/// Cone light aimed at the scene origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub angle: f32,
    pub penumbra: f32,
}

impl SpotLight {
    /// Cosines of the outer and inner cone edges.
    pub fn cone_cosines(&self) -> (f32, f32) {
        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra)).cos();
        (outer, inner)
    }

    pub fn direction(&self) -> Vec3 {
        (Vec3::from(self.target) - Vec3::from(self.position)).normalize_or_zero()
    }
}

/// Ambient plus spot lighting, as created for every scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub spot: SpotLight,
}

impl Lights {
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            ambient: AmbientLight {
                color: config.ambient,
            },
            spot: SpotLight {
                color: config.spot_color,
                intensity: config.spot_intensity,
                position: config.spot_position,
                target: [0.0, 0.0, 0.0],
                angle: config.spot_angle,
                penumbra: config.spot_penumbra,
            },
        }
    }
}

/// Linear fog blending distant fragments toward `color`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

impl Fog {
    pub fn from_config(config: &FogConfig) -> Self {
        Self {
            color: config.color,
            near: config.near,
            far: config.far,
        }
    }

    /// Fog contribution (0.0 = clear, 1.0 = fully fogged) at `distance`.
    pub fn factor(&self, distance: f32) -> f32 {
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}
