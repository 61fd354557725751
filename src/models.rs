// src/models.rs
use bytemuck::{Pod, Zeroable};

// --- Unit quad shared by every circle instance ---
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex2D {
    pub position: [f32; 2],
}

impl Vertex2D {
    // Corners at ±1 so the shader can scale by the instance's outer extent.
    pub const QUAD_VERTICES: [Self; 4] = [
        Vertex2D { position: [-1.0, -1.0] },
        Vertex2D { position: [ 1.0, -1.0] },
        Vertex2D { position: [ 1.0,  1.0] },
        Vertex2D { position: [-1.0,  1.0] },
    ];

    pub const QUAD_INDICES: [u16; 6] = [
        0, 1, 2,
        0, 2, 3,
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

// --- Per-node instance data ---
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CircleInstance {
    pub position: [f32; 2], // centre, CSS px
    pub radius: f32,        // disc radius, CSS px
    pub glow: f32,          // halo blur size, 0 for none
    pub color: [f32; 4],    // linear RGBA, straight alpha
}

/// Fragments fainter than this are discarded by `circles.wgsl`.
pub const DISCARD_ALPHA: f32 = 0.002;

// Halo reach past the rim, in multiples of the glow size (3σ at σ = glow/2).
const HALO_REACH: f32 = 1.5;

impl CircleInstance {
    /// Half-size of the quad drawn for this instance. Mirrors `vs_main` in
    /// `circles.wgsl`.
    pub fn extent(&self) -> f32 {
        self.radius + HALO_REACH * self.glow + 1.0
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: (mem::size_of::<[f32; 2]>() + mem::size_of::<f32>())
                        as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: (mem::size_of::<[f32; 2]>() + 2 * mem::size_of::<f32>())
                        as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Halo strength at distance `d` from the centre: a Gaussian with
/// σ = glow/2, rescaled so it reaches exactly 0 at the quad edge.
/// Mirrors `fs_main` in `circles.wgsl`.
pub fn halo_alpha(d: f32, radius: f32, glow: f32) -> f32 {
    if glow <= 0.0 {
        return 0.0;
    }
    let sigma = glow * 0.5;
    let gaussian = |t: f32| (-(t * t) / (2.0 * sigma * sigma)).exp();
    let edge = gaussian(HALO_REACH * glow + 1.0);
    let t = (d - radius).max(0.0);
    ((gaussian(t) - edge) / (1.0 - edge)).max(0.0)
}

// --- Link segments, expanded to quads in `lines.wgsl` ---
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineInstance {
    pub start: [f32; 2], // CSS px
    pub end: [f32; 2],   // CSS px
    pub width: f32,      // stroke width, CSS px
    pub color: [f32; 4], // linear RGBA, straight alpha
}

impl LineInstance {
    /// Where a unit-quad corner lands: `corner[0]` runs start (-1) to
    /// end (+1), `corner[1]` steps half the width along the normal.
    /// Mirrors `vs_main` in `lines.wgsl`.
    pub fn corner_position(&self, corner: [f32; 2]) -> [f32; 2] {
        let [sx, sy] = self.start;
        let [ex, ey] = self.end;
        let (dx, dy) = (ex - sx, ey - sy);
        let len = (dx * dx + dy * dy).sqrt();
        let (nx, ny) = if len > 1e-4 { (-dy / len, dx / len) } else { (0.0, 1.0) };
        let t = corner[0] * 0.5 + 0.5;
        let offset = corner[1] * self.width * 0.5;
        [sx + dx * t + nx * offset, sy + dy * t + ny * offset]
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: (2 * mem::size_of::<[f32; 2]>()) as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: (2 * mem::size_of::<[f32; 2]>() + mem::size_of::<f32>())
                        as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}
