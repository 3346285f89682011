use crate::section::{padded, SectionKind};
use crate::vertex::Vertex;

/// Builds a model container section by section.
///
/// Sections are written in call order; payloads are zero-padded so that
/// every section starts on a 4-byte boundary.
#[derive(Debug, Clone, Default)]
pub struct ContainerWriter {
    bytes: Vec<u8>,
}

impl ContainerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an index section.
    pub fn indices(mut self, indices: &[u32]) -> Self {
        self.header(SectionKind::Index, indices.len());
        for i in indices {
            self.bytes.extend_from_slice(&i.to_le_bytes());
        }
        self
    }

    /// Appends a vertex section.
    pub fn vertices(mut self, vertices: &[Vertex]) -> Self {
        self.header(SectionKind::Vertex, vertices.len());
        self.bytes.extend_from_slice(bytemuck::cast_slice(vertices));
        self
    }

    /// Appends an image section holding already-encoded image bytes (PNG/JPEG).
    pub fn image(mut self, encoded: &[u8]) -> Self {
        self.header(SectionKind::Image, encoded.len());
        self.bytes.extend_from_slice(encoded);
        self.bytes.resize(self.bytes.len() - encoded.len() + padded(encoded.len()), 0);
        self
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    fn header(&mut self, kind: SectionKind, count: usize) {
        debug_assert!(count <= u32::MAX as usize, "section length overflows u32");
        self.bytes.extend_from_slice(&kind.code().to_le_bytes());
        self.bytes.extend_from_slice(&(count as u32).to_le_bytes());
    }
}
