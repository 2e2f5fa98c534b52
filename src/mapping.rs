//! Amplitude-to-geometry mapping.
//!
//! Pure functions that turn one amplitude sample into the transform of the
//! element it drives. Nothing here depends on the scene or the GPU.

use std::f32::consts::TAU;

/// Sample value that maps to unit scale.
const SAMPLE_UNITY: f32 = 128.0;
/// Bar height multiplier at unit scale.
const BAR_GAIN: f32 = 3.0;
/// Radial and vertical displacement of a particle at unit scale.
const PARTICLE_GAIN: f32 = 2.0;

/// Vertical transform of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BarTransform {
    pub scale_y: f32,
    pub offset_y: f32,
}

/// Position of one particle in cloud space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleTransform {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub radius: f32,
}

impl ParticleTransform {
    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Map a sample onto a bar.
///
/// The bar grows upward while its base stays anchored at y = -0.5.
/// Derived values are not clamped.
#[inline]
pub fn map_bar(sample: u8) -> BarTransform {
    let scale_y = (sample as f32 / SAMPLE_UNITY) * BAR_GAIN;
    BarTransform {
        scale_y,
        offset_y: scale_y * 0.5 - 0.5,
    }
}

/// Map a sample onto a particle at `angle` on a ring of `base_radius`.
#[inline]
pub fn map_circular(sample: u8, angle: f32, base_radius: f32) -> ParticleTransform {
    let level = (sample as f32 / SAMPLE_UNITY) * PARTICLE_GAIN;
    let radius = base_radius + level;
    ParticleTransform {
        x: angle.cos() * radius,
        y: level,
        z: angle.sin() * radius,
        radius,
    }
}

/// Angular position of element `index` out of `count`, in radians.
#[inline]
pub fn base_angle(index: usize, count: usize) -> f32 {
    (index as f32 / count as f32) * TAU
}

/// Hue in degrees of element `index` out of `count`.
#[inline]
pub fn element_hue(index: usize, count: usize) -> f32 {
    (index as f32 / count as f32) * 360.0
}

/// Convert HSL (hue in degrees, saturation and lightness in 0.0 - 1.0) to RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_channel(p, q, h + 1.0 / 3.0),
        hue_channel(p, q, h),
        hue_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}
