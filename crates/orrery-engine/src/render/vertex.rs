use orrery_asset::VERTEX_STRIDE;

/// Vertex buffer layout a render pipeline is compiled against.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VertexLayout {
    /// Position, normal, uv, tangent, bitangent: five `Float32x3` at locations 0..4.
    Full,
    /// No vertex buffers; the shader derives positions from the vertex index.
    Empty,
}

const FULL_ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Float32x3, // normal
    2 => Float32x3, // uv (z unused)
    3 => Float32x3, // tangent
    4 => Float32x3  // bitangent
];

const FULL: [wgpu::VertexBufferLayout<'static>; 1] = [wgpu::VertexBufferLayout {
    array_stride: VERTEX_STRIDE as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &FULL_ATTRS,
}];

impl VertexLayout {
    pub fn buffers(self) -> &'static [wgpu::VertexBufferLayout<'static>] {
        match self {
            Self::Full => &FULL,
            Self::Empty => &[],
        }
    }
}
