use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::PI;

use crate::node::SceneNode;

/// User orbit controls, disabled while a flight owns the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enabled: true,
            min_distance: 4.0,
            max_distance: 400.0,
        }
    }
}

/// Camera pose plus the controls bound to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub look_at: Vec3,
    pub controls: OrbitControls,
}

impl CameraRig {
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            look_at: target,
            controls: OrbitControls {
                target,
                ..OrbitControls::default()
            },
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }

    /// Rotate around the controls target. Ignored while controls are off.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        if !self.controls.enabled {
            return;
        }
        let target = self.controls.target;
        let offset = self.position - target;
        let radius = offset.length().max(1e-3);
        let azimuth = offset.x.atan2(offset.z) + yaw;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() + pitch)
            .clamp(0.05, PI - 0.05);

        self.position = target
            + Vec3::new(
                radius * polar.sin() * azimuth.sin(),
                radius * polar.cos(),
                radius * polar.sin() * azimuth.cos(),
            );
        self.look_at = target;
    }

    /// Scale the distance to the target by `factor`, within limits.
    pub fn zoom(&mut self, factor: f32) {
        if !self.controls.enabled || factor <= 0.0 {
            return;
        }
        let target = self.controls.target;
        let offset = self.position - target;
        let distance = (offset.length() * factor).clamp(
            self.controls.min_distance,
            self.controls.max_distance,
        );
        self.position = target + offset.try_normalize().unwrap_or(Vec3::Z) * distance;
        self.look_at = target;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }
}

/// A point projected to the viewport, in pixels from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Distance along the view direction.
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 55f32.to_radians(),
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl Projection {
    pub fn view_projection(&self, rig: &CameraRig, viewport: Viewport) -> Mat4 {
        let proj = Mat4::perspective_rh(
            self.fov_y,
            viewport.aspect(),
            self.near,
            self.far,
        );
        proj * rig.view_matrix()
    }

    /// `None` when the point is behind the camera.
    pub fn project(
        &self,
        rig: &CameraRig,
        viewport: Viewport,
        point: Vec3,
    ) -> Option<ScreenPoint> {
        let clip = self.view_projection(rig, viewport)
            * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * viewport.width,
            y: (1.0 - ndc.y) * 0.5 * viewport.height,
            depth: clip.w,
        })
    }

    /// Pixel size of one world unit at `depth`.
    pub fn pixels_per_unit(&self, viewport: Viewport, depth: f32) -> f32 {
        viewport.height * 0.5 / ((self.fov_y * 0.5).tan() * depth.max(1e-3))
    }

    /// World-space ray through a viewport pixel.
    pub fn ray(&self, rig: &CameraRig, viewport: Viewport, x: f32, y: f32) -> Ray {
        let ndc_x = 2.0 * x / viewport.width.max(1.0) - 1.0;
        let ndc_y = 1.0 - 2.0 * y / viewport.height.max(1.0);
        let inverse = self.view_projection(rig, viewport).inverse();
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray {
            origin: near,
            direction: (far - near).try_normalize().unwrap_or(Vec3::NEG_Z),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Distance along the ray to the first hit on the sphere, if any.
    pub fn sphere_hit(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        [-b - root, -b + root].into_iter().find(|t| *t >= 0.0)
    }
}

/// The mouse position for one frame's hover test.
///
/// Screen positions are turned into a ray only once the camera has been
/// advanced for that frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pointer {
    Ray(Ray),
    /// Pixels from the viewport's top-left corner.
    Screen {
        x: f32,
        y: f32,
        viewport: Viewport,
        projection: Projection,
    },
}

impl Pointer {
    pub fn resolve(&self, rig: Option<&CameraRig>) -> Option<Ray> {
        match *self {
            Pointer::Ray(ray) => Some(ray),
            Pointer::Screen {
                x,
                y,
                viewport,
                projection,
            } => rig.map(|rig| projection.ray(rig, viewport, x, y)),
        }
    }
}

impl From<Ray> for Pointer {
    fn from(ray: Ray) -> Self {
        Pointer::Ray(ray)
    }
}

/// Nearest node whose pick sphere the ray passes through.
pub fn pick<'a>(
    ray: &Ray,
    nodes: impl IntoIterator<Item = &'a SceneNode>,
) -> Option<&'a SceneNode> {
    nodes
        .into_iter()
        .filter_map(|node| {
            ray.sphere_hit(node.position, node.pick_radius())
                .map(|t| (t, node))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, node)| node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::graph_store::NodeGraphStore;
    use crate::node::{Level, NewNode, NodePayload};

    fn viewport() -> Viewport {
        Viewport {
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn focus_projects_to_viewport_center() {
        let rig = CameraRig::looking_at(Vec3::new(0.0, 10.0, 50.0), Vec3::ZERO);
        let p = Projection::default()
            .project(&rig, viewport(), Vec3::ZERO)
            .unwrap();
        assert!((p.x - 400.0).abs() < 1e-2);
        assert!((p.y - 300.0).abs() < 1e-2);
        assert!(p.depth > 0.0);

        let behind = Projection::default().project(&rig, viewport(), Vec3::new(0.0, 10.0, 80.0));
        assert!(behind.is_none());
    }

    #[test]
    fn center_ray_hits_the_focused_sphere() {
        let rig = CameraRig::looking_at(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO);
        let ray = Projection::default().ray(&rig, viewport(), 400.0, 300.0);
        let t = ray.sphere_hit(Vec3::ZERO, 2.0).unwrap();
        assert!((t - (30.0 - 2.0 - Projection::default().near)).abs() < 0.05);
        assert!(ray.sphere_hit(Vec3::new(10.0, 0.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn pick_prefers_the_nearest_hit() {
        let mut store = NodeGraphStore::new();
        for (id, z) in [("far", -10.0), ("near", 10.0)] {
            store
                .add_node(NewNode {
                    id: id.into(),
                    parent: None,
                    level: Level::Pillar,
                    position: Vec3::new(0.0, 0.0, z),
                    color: Rgb::WHITE,
                    payload: NodePayload::Center {
                        label: id.into(),
                        media: vec![],
                    },
                })
                .unwrap();
        }
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 50.0),
            direction: Vec3::NEG_Z,
        };
        assert_eq!(pick(&ray, store.iter()).map(|n| n.id.as_str()), Some("near"));
        let miss = Ray {
            origin: Vec3::new(20.0, 0.0, 50.0),
            direction: Vec3::NEG_Z,
        };
        assert!(pick(&miss, store.iter()).is_none());
    }

    #[test]
    fn orbit_keeps_distance_and_respects_disabled_controls() {
        let mut rig = CameraRig::looking_at(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO);
        rig.orbit(0.7, -0.3);
        assert!((rig.position.length() - 20.0).abs() < 1e-3);

        rig.zoom(0.5);
        assert!((rig.position.length() - 10.0).abs() < 1e-3);

        rig.controls.enabled = false;
        let frozen = rig.position;
        rig.orbit(1.0, 0.0);
        rig.zoom(3.0);
        assert_eq!(rig.position, frozen);
    }
}
