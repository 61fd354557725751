// src/color.rs
use bevy_color::{Alpha, ColorToComponents, LinearRgba, Srgba};

/// An sRGB color as authored, converted to linear space on upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(Srgba);

impl Color {
    pub const TRANSPARENT: Color = Color(Srgba::NONE);

    pub fn with_alpha(self, alpha: f32) -> Self {
        Color(self.0.with_alpha(alpha))
    }

    /// Linear RGBA, straight (not premultiplied) alpha.
    pub fn into_linear_rgba(self) -> [f32; 4] {
        LinearRgba::from(self.0).to_f32_array()
    }

    pub fn into_linear_wgpu_color(self) -> wgpu::Color {
        let [r, g, b, a] = self.into_linear_rgba();
        wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: a as f64 }
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Color(Srgba::rgb_u8(r, g, b))
    }
}
