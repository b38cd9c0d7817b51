//! Orthographic camera fitted to the canvas.

use glam::{Mat4, Vec3};

use crate::config::CanvasSize;

const NEAR: f32 = -1000.0;
const FAR: f32 = 1000.0;
const EYE_Z: f32 = 2.0;

/// Orthographic camera whose frustum height equals the canvas height, so one
/// scene unit maps to one canvas pixel.
#[derive(Debug, Clone, Copy)]
pub struct OrthoCamera {
    half_width: f32,
    half_height: f32,
}

impl OrthoCamera {
    pub fn new(canvas: CanvasSize) -> Self {
        let mut camera = Self {
            half_width: 0.0,
            half_height: 0.0,
        };
        camera.set_canvas(canvas);
        camera
    }

    /// Refit the frustum to a new canvas size.
    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        let frustum_height = canvas.height as f32;
        self.half_width = frustum_height * canvas.aspect() / 2.0;
        self.half_height = frustum_height / 2.0;
    }

    pub fn half_extents(&self) -> (f32, f32) {
        (self.half_width, self.half_height)
    }

    /// Combined view-projection matrix for the sprite shader.
    pub fn view_proj(&self) -> Mat4 {
        let projection = Mat4::orthographic_rh(
            -self.half_width,
            self.half_width,
            -self.half_height,
            self.half_height,
            NEAR,
            FAR,
        );
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, EYE_Z), Vec3::ZERO, Vec3::Y);
        projection * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_extents_follow_aspect() {
        let camera = OrthoCamera::new(CanvasSize::new(1200, 600));
        let (hw, hh) = camera.half_extents();
        assert_eq!(hw, 600.0);
        assert_eq!(hh, 300.0);
    }

    #[test]
    fn test_corner_maps_to_ndc_one() {
        let camera = OrthoCamera::new(CanvasSize::new(1200, 600));
        let ndc = camera
            .view_proj()
            .project_point3(Vec3::new(600.0, 300.0, 0.0));

        assert!((ndc.x - 1.0).abs() < 1e-5);
        assert!((ndc.y - 1.0).abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_center_maps_to_origin() {
        let camera = OrthoCamera::new(CanvasSize::new(800, 800));
        let ndc = camera.view_proj().project_point3(Vec3::ZERO);

        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
    }

    #[test]
    fn test_set_canvas_refits() {
        let mut camera = OrthoCamera::new(CanvasSize::new(1200, 600));
        camera.set_canvas(CanvasSize::new(800, 800));

        let (hw, hh) = camera.half_extents();
        assert_eq!(hw, 400.0);
        assert_eq!(hh, 400.0);

        let ndc = camera
            .view_proj()
            .project_point3(Vec3::new(400.0, -400.0, 0.0));
        assert!((ndc.x - 1.0).abs() < 1e-5);
        assert!((ndc.y + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_refit_is_idempotent() {
        let mut camera = OrthoCamera::new(CanvasSize::new(1280, 720));
        let before = camera.view_proj();
        camera.set_canvas(CanvasSize::new(1280, 720));
        assert_eq!(camera.view_proj(), before);
    }
}
