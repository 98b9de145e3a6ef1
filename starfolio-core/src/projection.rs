/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::config::CameraConfig;
use crate::transform::{RotationState, Transform};

/// Perspective camera posed by a position and an Euler rotation
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub rotation: RotationState,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

/// A vertex after projection to the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Distance along the view axis, used for depth testing
    pub depth: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::perspective(&CameraConfig::default(), width, height)
    }

    /// Camera at the configured initial offset, looking down -Z
    pub fn perspective(config: &CameraConfig, width: u32, height: u32) -> Self {
        let [x, y, z] = config.initial_position;
        Self {
            position: Point3::new(x, y, z),
            rotation: RotationState::zero(),
            fov: config.fov_degrees.to_radians(),
            aspect: aspect_ratio(width as f32, height as f32).unwrap_or(1.0),
            near: config.near,
            far: config.far,
        }
    }

    /// Degenerate sizes (a collapsed viewport) keep the previous aspect
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if let Some(aspect) = aspect_ratio(width, height) {
            self.aspect = aspect;
        }
    }

    /// World-to-camera matrix, the inverse of the camera's own transform
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let inverse_rotation = Transform::rotation_matrix(&self.rotation).transpose();
        inverse_rotation * Transform::translation_matrix(&-self.position.coords)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Direction the camera looks along, in world space
    pub fn forward(&self) -> Vector3<f32> {
        Transform::rotation_matrix(&self.rotation).transform_vector(&-Vector3::z())
    }

    /// Project a model-space point to screen space through `mvp`.
    ///
    /// Points behind the near plane or past the far plane yield `None`.
    /// Points outside the viewport are still returned so triangles that
    /// straddle the edge can be clipped by the rasterizer.
    pub fn project_with(
        &self,
        mvp: &Matrix4<f32>,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<ScreenPoint> {
        let clip = mvp * Vector4::new(point.x, point.y, point.z, 1.0);

        // w is the view-space distance in front of the camera
        if clip.w < self.near || clip.w > self.far {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;

        Some(ScreenPoint {
            x: (ndc_x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc_y) * 0.5 * height as f32,
            depth: clip.w,
        })
    }
}

/// Width over height, or `None` when either side is zero, negative or not finite
fn aspect_ratio(width: f32, height: f32) -> Option<f32> {
    let aspect = width / height;
    (width > 0.0 && height > 0.0 && aspect.is_finite()).then_some(aspect)
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(camera: &Camera, point: &Point3<f32>) -> Option<ScreenPoint> {
        let mvp = Transform::mvp_matrix(
            &Matrix4::identity(),
            &camera.view_matrix(),
            &camera.projection_matrix(),
        );
        camera.project_with(&mvp, point, 100, 100)
    }

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new(800, 600);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.fov - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.position, Point3::new(-10.0, 0.0, 50.0));
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_view_matrix_moves_camera_to_origin() {
        let camera = Camera::new(800, 600);
        let view = camera.view_matrix();
        let p = view.transform_point(&camera.position);
        assert!(p.coords.norm() < 1e-5);
    }

    #[test]
    fn test_point_ahead_projects_to_centre() {
        let mut camera = Camera::new(100, 100);
        camera.position = Point3::new(0.0, 0.0, 10.0);
        let projected = project(&camera, &Point3::origin()).unwrap();
        assert!((projected.x - 50.0).abs() < 1e-4);
        assert!((projected.y - 50.0).abs() < 1e-4);
        assert!((projected.depth - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_point_behind_camera_is_rejected() {
        let mut camera = Camera::new(100, 100);
        camera.position = Point3::new(0.0, 0.0, -10.0);
        assert!(project(&camera, &Point3::origin()).is_none());
    }

    #[test]
    fn test_yaw_turns_forward_vector() {
        let mut camera = Camera::default();
        camera.rotation.y = std::f32::consts::FRAC_PI_2;
        let forward = camera.forward();
        assert!((forward - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn test_zero_width_viewport_keeps_usable_aspect() {
        let camera = Camera::new(0, 600);
        assert_eq!(camera.aspect, 1.0);
        // Would panic inside nalgebra with a zero aspect
        let _ = camera.projection_matrix();

        let mut camera = Camera::new(800, 600);
        camera.set_aspect(80.0 * 0.0, 23.0);
        camera.set_aspect(f32::INFINITY, 23.0);
        camera.set_aspect(f32::NAN, 23.0);
        camera.set_aspect(80.0, 0.0);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        let _ = camera.projection_matrix();
    }
}
