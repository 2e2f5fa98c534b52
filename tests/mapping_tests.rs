//! Integration tests for amplitude mapping and scene construction.

use phobz_live::mapping::{base_angle, element_hue};
use phobz_live::{map_bar, map_circular, SceneGraph, VisualizerConfig};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

// ==================== Bar Mapping ====================

#[test]
fn test_bar_reference_points() {
    let silent = map_bar(0);
    assert_eq!((silent.scale_y, silent.offset_y), (0.0, -0.5));

    let unity = map_bar(128);
    assert_eq!((unity.scale_y, unity.offset_y), (3.0, 1.0));

    let peak = map_bar(255);
    assert!((peak.scale_y - 5.98).abs() < 0.01);
}

#[test]
fn test_bar_base_stays_anchored() {
    for sample in [1u8, 17, 64, 128, 200, 255] {
        let t = map_bar(sample);
        let base = t.offset_y - t.scale_y * 0.5;
        assert!((base + 0.5).abs() < 1e-5, "base moved for sample {}", sample);
    }
}

#[test]
fn test_bar_monotonic() {
    let mut previous = map_bar(0).scale_y;
    for sample in 1..=255u8 {
        let scale = map_bar(sample).scale_y;
        assert!(scale > previous);
        previous = scale;
    }
}

// ==================== Circular Mapping ====================

#[test]
fn test_circular_reference_points() {
    for angle in [0.0, FRAC_PI_2, PI, 4.0] {
        let quiet = map_circular(0, angle, 5.0);
        assert!((quiet.radius - 5.0).abs() < 1e-6);
        assert_eq!(quiet.y, 0.0);

        let loud = map_circular(128, angle, 5.0);
        assert!((loud.radius - 7.0).abs() < 1e-6);
        assert!((loud.y - 2.0).abs() < 1e-6);

        let planar = (loud.x * loud.x + loud.z * loud.z).sqrt();
        assert!((planar - 7.0).abs() < 1e-4);
    }
}

#[test]
fn test_circular_direction_follows_angle() {
    let t = map_circular(64, FRAC_PI_2, 5.0);
    assert!(t.x.abs() < 1e-5);
    assert!(t.z > 0.0);
}

// ==================== Scene Layout ====================

#[test]
fn test_angles_span_full_circle() {
    assert_eq!(base_angle(0, 32), 0.0);
    assert!((base_angle(16, 32) - PI).abs() < 1e-6);
    assert!(base_angle(31, 32) < TAU);
    assert_eq!(element_hue(64, 128), 180.0);
}

#[test]
fn test_bar_ring_layout() {
    let scene = SceneGraph::with_bars(32, &VisualizerConfig::default());
    let bars = scene.bars().unwrap();
    assert_eq!(bars.len(), 32);

    for bar in bars {
        let p = bar.world_position();
        let ring = (p.x * p.x + p.z * p.z).sqrt();
        assert!((ring - 8.0).abs() < 1e-4);
        assert!((p.x - bar.angle().cos() * 8.0).abs() < 1e-4);
        assert!((p.z - bar.angle().sin() * 8.0).abs() < 1e-4);
    }
}

#[test]
fn test_config_overrides_ring_radius() {
    let config = VisualizerConfig::from_json_str(r#"{ "bars": { "ring_radius": 4.0 } }"#).unwrap();
    let scene = SceneGraph::with_bars(8, &config);
    let p = scene.bars().unwrap()[0].world_position();
    assert!((p.x - 4.0).abs() < 1e-5);
    // Untouched sections keep their defaults
    assert_eq!(config.camera.fov_degrees, 75.0);
}
