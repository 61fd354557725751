// src/camera.rs
// Maps CSS-pixel scene coordinates onto the density-scaled surface.
use glam::{Mat4, Vec2, Vec4, Vec4Swizzles};
use bytemuck::{Pod, Zeroable};

// Camera uniform shared by both shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub needs_srgb_output_conversion: u32, // 0 for false, 1 for true
    pub _padding: [u32; 3], // pad to 80 bytes
}

/// Fixed orthographic view over the surface: origin top-left, y down,
/// one unit per CSS pixel. `scale_factor` is the backing density, never
/// below 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub logical_size: Vec2,
    pub scale_factor: f32,
}

impl Camera {
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        let mut camera = Self { logical_size: Vec2::ZERO, scale_factor: 1.0 };
        camera.update_viewport(physical_width, physical_height, scale_factor);
        camera
    }

    /// Called with the size the windowing layer reports, at the device's
    /// own density. Zoomed-out pages (density < 1) still get a backing
    /// store of at least one texel per CSS pixel.
    pub fn update_viewport(&mut self, physical_width: u32, physical_height: u32, scale_factor: f64) {
        let device_scale = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor as f32 } else { 1.0 };
        self.logical_size = Vec2::new(physical_width as f32, physical_height as f32) / device_scale;
        self.scale_factor = device_scale.max(1.0);
    }

    /// Backing resolution, `round(logical × density)`.
    pub fn physical_size(&self) -> Vec2 {
        (self.logical_size * self.scale_factor).round()
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let size = self.logical_size.max(Vec2::ONE);
        // left, right, bottom, top: flipping bottom/top gives a y-down space.
        Mat4::orthographic_rh(0.0, size.x, size.y, 0.0, -1.0, 1.0)
    }

    /// Clip-space position of a CSS-pixel point.
    pub fn to_clip(&self, point: Vec2) -> Vec2 {
        let clip = self.build_view_projection_matrix() * Vec4::new(point.x, point.y, 0.0, 1.0);
        clip.xy() / clip.w
    }

    pub fn uniform(&self, needs_srgb_output_conversion: bool) -> CameraUniform {
        CameraUniform {
            view_proj: self.build_view_projection_matrix().to_cols_array_2d(),
            needs_srgb_output_conversion: needs_srgb_output_conversion as u32,
            _padding: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 1e-5, "{a} vs {b}");
    }

    #[test]
    fn logical_size_divides_out_density() {
        let camera = Camera::new(2400, 1600, 2.0);
        assert_eq!(camera.logical_size, Vec2::new(1200.0, 800.0));
        assert_eq!(camera.physical_size(), Vec2::new(2400.0, 1600.0));
    }

    #[test]
    fn css_corners_map_to_clip_corners_at_any_density() {
        for scale in [1.0, 1.5, 2.0, 3.0] {
            let camera = Camera::new((1200.0 * scale) as u32, (800.0 * scale) as u32, scale);
            assert_close(camera.to_clip(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0));
            assert_close(camera.to_clip(Vec2::new(1200.0, 800.0)), Vec2::new(1.0, -1.0));
            assert_close(camera.to_clip(Vec2::new(600.0, 400.0)), Vec2::ZERO);
        }
    }

    #[test]
    fn bogus_scale_factor_falls_back_to_one() {
        let camera = Camera::new(640, 480, 0.0);
        assert_eq!(camera.scale_factor, 1.0);
        assert_eq!(camera.logical_size, Vec2::new(640.0, 480.0));
    }

    #[test]
    fn density_below_one_is_clamped_to_one() {
        // 800x600 CSS px on a page zoomed out to 50%.
        let camera = Camera::new(400, 300, 0.5);
        assert_eq!(camera.scale_factor, 1.0);
        assert_eq!(camera.logical_size, Vec2::new(800.0, 600.0));
        assert_eq!(camera.physical_size(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn fractional_density_rounds_backing_size() {
        let camera = Camera::new(1001, 751, 1.25);
        assert_eq!(camera.physical_size(), Vec2::new(1001.0, 751.0));
        assert_eq!(camera.scale_factor, 1.25);
    }

    #[test]
    fn uniform_is_80_bytes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        let uniform = Camera::new(100, 100, 1.0).uniform(true);
        assert_eq!(uniform.needs_srgb_output_conversion, 1);
    }
}
