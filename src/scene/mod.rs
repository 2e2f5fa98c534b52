//! Scene graph owned by one visualizer instance.
//!
//! Holds the N visual elements (bar meshes or a point cloud) together with
//! the ground plane, lights and fog. Everything is created once at
//! construction and torn down together; only element transforms (and the
//! point cloud spin) change afterwards.

mod elements;
mod environment;

pub use elements::{BarElement, PointCloud};
pub use environment::{AmbientLight, Fog, GroundPlane, Lights, PhongMaterial, SpotLight};

use crate::config::VisualizerConfig;
use crate::mapping::{BarTransform, ParticleTransform};

/// Renderable elements of a scene, indexed by amplitude sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Elements {
    Bars(Vec<BarElement>),
    Points(PointCloud),
}

/// New transform for a single element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementTransform {
    Bar(BarTransform),
    Particle(ParticleTransform),
}

/// Scene resources and indexed element storage.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    elements: Elements,
    bar_box: [f32; 3],
    ground: GroundPlane,
    lights: Lights,
    fog: Fog,
    clear_color: [f32; 4],
    torn_down: bool,
}

impl SceneGraph {
    /// Build a ring of `count` bars.
    pub fn with_bars(count: usize, config: &VisualizerConfig) -> Self {
        Self::new(
            Elements::Bars(elements::build_bars(count, &config.bars)),
            config,
        )
    }

    /// Build a cloud of `count` particles.
    pub fn with_points(count: usize, config: &VisualizerConfig) -> Self {
        Self::new(
            Elements::Points(PointCloud::new(count, &config.particles)),
            config,
        )
    }

    fn new(elements: Elements, config: &VisualizerConfig) -> Self {
        Self {
            elements,
            bar_box: config.bars.box_size,
            ground: GroundPlane::from_config(&config.ground),
            lights: Lights::from_config(&config.lighting),
            fog: Fog::from_config(&config.fog),
            clear_color: config.clear_color,
            torn_down: false,
        }
    }

    /// Number of addressable elements.
    pub fn len(&self) -> usize {
        match &self.elements {
            Elements::Bars(bars) => bars.len(),
            Elements::Points(cloud) => cloud.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn elements(&self) -> &Elements {
        &self.elements
    }

    pub fn bars(&self) -> Option<&[BarElement]> {
        match &self.elements {
            Elements::Bars(bars) => Some(bars),
            Elements::Points(_) => None,
        }
    }

    pub fn point_cloud(&self) -> Option<&PointCloud> {
        match &self.elements {
            Elements::Points(cloud) => Some(cloud),
            Elements::Bars(_) => None,
        }
    }

    pub fn point_cloud_mut(&mut self) -> Option<&mut PointCloud> {
        match &mut self.elements {
            Elements::Points(cloud) => Some(cloud),
            Elements::Bars(_) => None,
        }
    }

    /// Base angular position of element `index`.
    pub fn element_angle(&self, index: usize) -> Option<f32> {
        match &self.elements {
            Elements::Bars(bars) => bars.get(index).map(BarElement::angle),
            Elements::Points(cloud) => cloud.angle(index),
        }
    }

    /// Diffuse colour assigned to element `index` at construction.
    pub fn element_color(&self, index: usize) -> Option<[f32; 3]> {
        match &self.elements {
            Elements::Bars(bars) => bars.get(index).map(|b| b.material().color),
            Elements::Points(cloud) => cloud.colors().get(index).copied(),
        }
    }

    /// Current transform of element `index`.
    pub fn element_transform(&self, index: usize) -> Option<ElementTransform> {
        match &self.elements {
            Elements::Bars(bars) => bars.get(index).map(|b| ElementTransform::Bar(b.transform)),
            Elements::Points(cloud) => cloud.positions().get(index).map(|p| {
                ElementTransform::Particle(ParticleTransform {
                    x: p[0],
                    y: p[1],
                    z: p[2],
                    radius: (p[0] * p[0] + p[2] * p[2]).sqrt(),
                })
            }),
        }
    }

    /// Overwrite the transform of exactly one element.
    ///
    /// Returns `false` when the index is out of range, the transform kind
    /// does not match the element kind, or the scene has been torn down.
    /// Point updates mark the shared position buffer dirty.
    pub fn apply_update(&mut self, index: usize, transform: ElementTransform) -> bool {
        match (&mut self.elements, transform) {
            (Elements::Bars(bars), ElementTransform::Bar(t)) => match bars.get_mut(index) {
                Some(bar) => {
                    bar.transform = t;
                    true
                }
                None => false,
            },
            (Elements::Points(cloud), ElementTransform::Particle(t)) => {
                cloud.set_position(index, &t)
            }
            _ => false,
        }
    }

    /// Rotate the point cloud about the vertical axis. No-op for bars.
    pub fn spin_points(&mut self, delta: f32) {
        if let Elements::Points(cloud) = &mut self.elements {
            cloud.spin(delta);
        }
    }

    /// Unscaled extents of one bar box.
    pub fn bar_box(&self) -> [f32; 3] {
        self.bar_box
    }

    pub fn ground(&self) -> &GroundPlane {
        &self.ground
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    pub fn fog(&self) -> &Fog {
        &self.fog
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Drop every element. Later updates are rejected.
    pub fn teardown(&mut self) {
        self.elements = match &self.elements {
            Elements::Bars(_) => Elements::Bars(Vec::new()),
            Elements::Points(_) => Elements::Points(PointCloud::new(0, &Default::default())),
        };
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{map_bar, map_circular};

    #[test]
    fn test_apply_update_touches_one_bar() {
        let mut scene = SceneGraph::with_bars(32, &VisualizerConfig::default());
        let before: Vec<_> = (0..32).map(|i| scene.element_transform(i)).collect();

        assert!(scene.apply_update(7, ElementTransform::Bar(map_bar(200))));

        for i in 0..32 {
            if i == 7 {
                assert_eq!(
                    scene.element_transform(i),
                    Some(ElementTransform::Bar(map_bar(200)))
                );
            } else {
                assert_eq!(scene.element_transform(i), before[i]);
            }
        }
    }

    #[test]
    fn test_apply_update_rejects_mismatch_and_out_of_range() {
        let mut bars = SceneGraph::with_bars(4, &VisualizerConfig::default());
        assert!(!bars.apply_update(4, ElementTransform::Bar(map_bar(10))));
        assert!(!bars.apply_update(0, ElementTransform::Particle(map_circular(10, 0.0, 5.0))));

        let mut points = SceneGraph::with_points(4, &VisualizerConfig::default());
        assert!(!points.apply_update(0, ElementTransform::Bar(map_bar(10))));
        assert!(points.apply_update(3, ElementTransform::Particle(map_circular(10, 0.0, 5.0))));
    }

    #[test]
    fn test_point_update_marks_buffer_dirty() {
        let mut scene = SceneGraph::with_points(128, &VisualizerConfig::default());
        scene.point_cloud_mut().unwrap().mark_uploaded();

        scene.apply_update(10, ElementTransform::Particle(map_circular(64, 0.5, 5.0)));
        assert!(scene.point_cloud().unwrap().is_dirty());
    }

    #[test]
    fn test_colors_follow_hue_wheel() {
        let scene = SceneGraph::with_points(128, &VisualizerConfig::default());
        let first = scene.element_color(0).unwrap();
        // hsl(0, 100%, 70%)
        assert!((first[0] - 1.0).abs() < 1e-4);
        assert!((first[1] - 0.4).abs() < 1e-4);
        assert_ne!(scene.element_color(0), scene.element_color(64));
    }

    #[test]
    fn test_teardown_empties_scene() {
        let mut scene = SceneGraph::with_bars(32, &VisualizerConfig::default());
        scene.teardown();
        assert!(scene.is_torn_down());
        assert!(scene.is_empty());
        assert!(!scene.apply_update(0, ElementTransform::Bar(map_bar(100))));
    }

    #[test]
    fn test_spin_only_affects_points() {
        let mut bars = SceneGraph::with_bars(4, &VisualizerConfig::default());
        bars.spin_points(1.0);
        assert!(bars.point_cloud().is_none());

        let mut points = SceneGraph::with_points(4, &VisualizerConfig::default());
        points.spin_points(0.25);
        points.spin_points(0.25);
        assert!((points.point_cloud().unwrap().rotation_y() - 0.5).abs() < 1e-6);
    }
}
