//! # Camera Implementation
//!
//! An orbit-less editor camera that looks at a fixed target, with either an
//! orthographic or a perspective projection.
//!
//! ## Key Components
//! - `CameraConfig`: Serializable camera settings
//! - `Camera`: View/projection matrices, zoom, and ray unprojection
//! - `Ray`: A world-space ray produced from a normalized device coordinate

use cgmath::*;
use serde::{Deserialize, Serialize};

/// How the scene is projected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProjectionConfig {
    /// Perspective projection; `zoom` is the distance from the camera to its target
    Perspective {
        /// Vertical field of view in degrees
        fov: f32,
        /// Initial zoom
        zoom: f32,
    },
    /// Orthographic projection; `zoom` is the height of the view volume
    Orthographic {
        /// Initial zoom
        zoom: f32,
    },
}

impl ProjectionConfig {
    fn zoom(&self) -> f32 {
        match *self {
            ProjectionConfig::Perspective { zoom, .. } | ProjectionConfig::Orthographic { zoom } => zoom,
        }
    }
}

/// Camera settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Projection kind and its initial zoom
    pub projection: ProjectionConfig,
    /// Width over height of the canvas
    pub aspect_ratio: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Initial camera position; the camera always looks at the origin
    pub position: [f32; 3],
    /// Smallest allowed zoom
    pub min_zoom: f32,
    /// Largest allowed zoom
    pub max_zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::Orthographic { zoom: 10.0 },
            aspect_ratio: 16.0 / 9.0,
            near: 0.001,
            far: 2000.0,
            position: [5.0, 7.0, 5.0],
            min_zoom: 1.0,
            max_zoom: 100.0,
        }
    }
}

/// A world-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Starting point, on the near plane
    pub origin: Point3<f32>,
    /// Normalized direction
    pub direction: Vector3<f32>,
}

impl Ray {
    /// The point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Projection {
    Perspective { fovy: Deg<f32> },
    Orthographic,
}

/// The editor camera.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Point3<f32>,
    /// Point the camera looks at
    pub target: Point3<f32>,
    /// Width over height of the view
    pub aspect: f32,
    projection: Projection,
    near: f32,
    far: f32,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Camera {
    /// Creates a camera from its settings, looking at the origin.
    pub fn new(config: &CameraConfig) -> Self {
        let projection = match config.projection {
            ProjectionConfig::Perspective { fov, .. } => Projection::Perspective { fovy: Deg(fov) },
            ProjectionConfig::Orthographic { .. } => Projection::Orthographic,
        };

        let mut camera = Self {
            position: Point3::from(config.position),
            target: Point3::origin(),
            aspect: config.aspect_ratio,
            projection,
            near: config.near,
            far: config.far,
            zoom: config.projection.zoom(),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        };
        camera.set_zoom(camera.zoom);
        camera
    }

    /// Current zoom.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Sets the zoom, clamped to the configured bounds.
    ///
    /// A perspective camera moves along its view line so that its distance to the
    /// target equals the zoom; an orthographic camera resizes its view volume.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);

        if let Projection::Perspective { .. } = self.projection {
            let offset = self.position - self.target;
            if offset.magnitude2() > 0.0 {
                self.position = self.target + offset.normalize() * self.zoom;
            }
        }
    }

    /// Adds `delta` to the zoom, clamped to the configured bounds.
    pub fn add_zoom(&mut self, delta: f32) {
        self.set_zoom(self.zoom + delta);
    }

    /// World to view space.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }

    /// View to clip space, in OpenGL depth convention.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.projection {
            Projection::Perspective { fovy } => perspective(fovy, self.aspect, self.near, self.far),
            Projection::Orthographic => {
                let height = self.zoom;
                let width = self.aspect * height;
                ortho(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// World to clip space.
    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Casts a ray through a point in normalized device coordinates.
    ///
    /// Returns `None` when the view-projection matrix cannot be inverted, which only
    /// happens for degenerate settings such as a zero aspect ratio.
    pub fn ray_from_ndc(&self, ndc: Vector2<f32>) -> Option<Ray> {
        let inverse = self.view_projection_matrix().invert()?;

        let unproject = |depth: f32| {
            let clip = inverse * Vector4::new(ndc.x, ndc.y, depth, 1.0);
            Point3::from_homogeneous(clip)
        };

        let near = unproject(-1.0);
        let far = unproject(1.0);
        let direction = far - near;
        if direction.magnitude2() <= f32::EPSILON {
            return None;
        }

        Some(Ray {
            origin: near,
            direction: direction.normalize(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::new(&CameraConfig::default());

        camera.add_zoom(-50.0);
        assert_eq!(camera.zoom(), 1.0);

        camera.add_zoom(500.0);
        assert_eq!(camera.zoom(), 100.0);
    }

    #[test]
    fn perspective_zoom_moves_the_camera_along_its_view_line() {
        let mut camera = Camera::new(&CameraConfig {
            projection: ProjectionConfig::Perspective { fov: 75.0, zoom: 5.0 },
            ..CameraConfig::default()
        });

        camera.set_zoom(20.0);

        assert!(close(camera.position.to_vec().magnitude(), 20.0));
        let direction = camera.position.to_vec().normalize();
        let expected = Vector3::new(5.0f32, 7.0, 5.0).normalize();
        assert!(close(direction.dot(expected), 1.0));
    }

    #[test]
    fn orthographic_center_ray_points_along_the_view_direction() {
        let camera = Camera::new(&CameraConfig::default());

        let ray = camera.ray_from_ndc(Vector2::new(0.0, 0.0)).unwrap();

        let expected = (Point3::origin() - Point3::new(5.0f32, 7.0, 5.0)).normalize();
        assert!(close(ray.direction.dot(expected), 1.0));
        assert!((ray.origin - Point3::new(5.0, 7.0, 5.0)).magnitude() < 0.01);
    }

    #[test]
    fn orthographic_rays_are_parallel() {
        let camera = Camera::new(&CameraConfig::default());

        let center = camera.ray_from_ndc(Vector2::new(0.0, 0.0)).unwrap();
        let corner = camera.ray_from_ndc(Vector2::new(0.8, -0.6)).unwrap();

        assert!(close(center.direction.dot(corner.direction), 1.0));
        assert!((center.origin - corner.origin).magnitude() > 1.0);
    }
}
