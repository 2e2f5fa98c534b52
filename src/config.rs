//! Visualizer configuration.
//!
//! Every tunable of the live scene lives here with the values the visualizers
//! ship with. All structs deserialize from partial JSON: missing fields fall
//! back to their defaults.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::Path;

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Perspective camera parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Eye position before the first tick.
    pub initial_position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            initial_position: [0.0, 5.0, 15.0],
        }
    }
}

/// Camera orbit driven by the phase accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub radius: f32,
    pub height: f32,
    /// Phase added on every tick, in radians.
    pub phase_step: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            radius: 15.0,
            height: 5.0,
            phase_step: 0.005,
        }
    }
}

/// Cadence of the render loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Interval between ticks in milliseconds (16 ms ~ 60 Hz refresh).
    pub tick_interval_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
        }
    }
}

impl FrameConfig {
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

/// Linear distance fog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0],
            near: 1.0,
            far: 30.0,
        }
    }
}

/// Decorative ground plane beneath the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub size: f32,
    pub elevation: f32,
    pub color: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        let spec = 0x22 as f32 / 255.0;
        Self {
            size: 50.0,
            elevation: -5.0,
            color: [0.0, 0.0, 0.0],
            specular: [spec, spec, spec],
            shininess: 100.0,
            opacity: 0.5,
        }
    }
}

/// Ambient and spot lighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient: [f32; 3],
    pub spot_color: [f32; 3],
    pub spot_intensity: f32,
    pub spot_position: [f32; 3],
    /// Half-angle of the spot cone in radians.
    pub spot_angle: f32,
    /// Fraction of the cone that fades out (0.0 - 1.0).
    pub spot_penumbra: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        let ambient = 0x11 as f32 / 255.0;
        Self {
            ambient: [ambient, ambient, ambient],
            spot_color: [1.0, 1.0, 1.0],
            spot_intensity: 1.0,
            spot_position: [0.0, 15.0, 0.0],
            spot_angle: PI / 4.0,
            spot_penumbra: 0.5,
        }
    }
}

/// Radial bar-graph geometry and materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarsConfig {
    /// Distance of every bar from the scene origin.
    pub ring_radius: f32,
    /// Box extents (width, height, depth) at scale 1.
    pub box_size: [f32; 3],
    pub shininess: f32,
    /// HSL lightness of the diffuse colour (0.0 - 1.0).
    pub base_lightness: f32,
    pub specular_lightness: f32,
    pub emissive_lightness: f32,
}

impl Default for BarsConfig {
    fn default() -> Self {
        Self {
            ring_radius: 8.0,
            box_size: [0.5, 1.0, 0.5],
            shininess: 150.0,
            base_lightness: 0.7,
            specular_lightness: 0.9,
            emissive_lightness: 0.4,
        }
    }
}

/// Particle ring geometry and material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticlesConfig {
    /// Ring radius for a silent sample.
    pub base_radius: f32,
    /// Point size in world units.
    pub point_size: f32,
    pub opacity: f32,
    pub lightness: f32,
    /// Rotation of the whole cloud about the vertical axis per tick, in radians.
    pub spin_per_tick: f32,
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            base_radius: 5.0,
            point_size: 0.2,
            opacity: 0.8,
            lightness: 0.7,
            spin_per_tick: 0.001,
        }
    }
}

/// Complete configuration for one visualizer instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub frame: FrameConfig,
    pub fog: FogConfig,
    pub ground: GroundConfig,
    pub lighting: LightingConfig,
    pub bars: BarsConfig,
    pub particles: ParticlesConfig,
    /// RGBA clear colour of the output surface.
    pub clear_color: [f32; 4],
}

impl VisualizerConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject values that would produce a degenerate projection or scene.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("camera.fov_degrees", self.camera.fov_degrees),
            ("camera.near", self.camera.near),
            ("camera.far", self.camera.far),
            ("ground.size", self.ground.size),
            ("bars.ring_radius", self.bars.ring_radius),
            ("particles.point_size", self.particles.point_size),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.camera.fov_degrees >= 180.0 {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be below 180, got {}",
                self.camera.fov_degrees
            )));
        }
        if self.camera.far <= self.camera.near {
            return Err(ConfigError::Invalid(
                "camera.far must be greater than camera.near".to_string(),
            ));
        }
        if self.frame.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.bars.box_size.iter().any(|&s| !(s > 0.0)) {
            return Err(ConfigError::Invalid(
                "bars.box_size extents must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("ground.opacity", self.ground.opacity),
            ("particles.opacity", self.particles.opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0.0 - 1.0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = VisualizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.orbit.radius, 15.0);
        assert_eq!(config.orbit.phase_step, 0.005);
        assert_eq!(config.bars.ring_radius, 8.0);
        assert_eq!(config.particles.base_radius, 5.0);
        assert_eq!(config.clear_color, [0.0; 4]);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config =
            VisualizerConfig::from_json_str(r#"{ "orbit": { "radius": 20.0 } }"#).unwrap();
        assert_eq!(config.orbit.radius, 20.0);
        assert_eq!(config.orbit.height, 5.0);
        assert_eq!(config.ground, GroundConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = VisualizerConfig::from_json_str(r#"{ "camera": { "near": 0.0 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));

        let err = VisualizerConfig::from_json_str(r#"{ "particles": { "opacity": 1.5 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));

        let err = VisualizerConfig::from_json_str(r#"{ "frame": { "tick_interval_ms": 0 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = VisualizerConfig::from_json_str("{ not json");
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = VisualizerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(VisualizerConfig::from_json_str(&json).unwrap(), config);
    }
}
