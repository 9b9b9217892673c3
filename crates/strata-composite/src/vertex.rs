//! GPU-ready layouts for merged buffers.

/// One vertex of the merged point buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    /// Position in the shared scene space.
    pub position: [f32; 3],
    /// Marker size.
    pub size: f32,
    /// RGBA color with layer alpha folded in.
    pub color: [f32; 4],
}

/// One texel of a baked transfer function.
pub type RampTexel = [f32; 4];
