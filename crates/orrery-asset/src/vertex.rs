use bytemuck::{Pod, Zeroable};

/// Byte stride of one interleaved vertex record.
pub const VERTEX_STRIDE: usize = 60;

/// Interleaved vertex record as stored in a vertex section.
///
/// Layout (60 bytes, all `f32`):
///
///  offset  0  position   [f32; 3]
///  offset 12  normal     [f32; 3]
///  offset 24  uv         [f32; 3]  (third component is padding)
///  offset 36  tangent    [f32; 3]
///  offset 48  bitangent  [f32; 3]
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

const _: () = assert!(std::mem::size_of::<Vertex>() == VERTEX_STRIDE);

impl Vertex {
    #[inline]
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv: [uv[0], uv[1], 0.0],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        }
    }

    /// Sets the tangent frame.
    #[inline]
    pub const fn with_tangents(mut self, tangent: [f32; 3], bitangent: [f32; 3]) -> Self {
        self.tangent = tangent;
        self.bitangent = bitangent;
        self
    }
}
