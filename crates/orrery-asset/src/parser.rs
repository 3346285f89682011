use image::RgbaImage;

use crate::error::FormatError;
use crate::section::{Section, SectionKind, SectionReader};
use crate::vertex::VERTEX_STRIDE;

/// Decoded contents of a model container.
///
/// Each field holds the last section of its kind; a kind with no section is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    pub indices: Option<Vec<u32>>,
    /// Interleaved vertex records, `VERTEX_STRIDE` bytes each.
    pub vertices: Option<Vec<u8>>,
    pub diffuse: Option<RgbaImage>,
}

impl ModelData {
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn index_bytes(&self) -> usize {
        self.index_count() * 4
    }

    #[inline]
    pub fn vertex_bytes(&self) -> usize {
        self.vertices.as_ref().map_or(0, Vec::len)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_bytes() / VERTEX_STRIDE
    }
}

/// Parses a whole container.
///
/// Index and vertex payloads are sliced out of `bytes` and copied once into
/// their owned buffers. Image payloads are decoded to RGBA8; this is the
/// expensive step, so callers on a frame loop should parse off-thread.
pub fn parse(bytes: &[u8]) -> Result<ModelData, FormatError> {
    let mut model = ModelData::default();

    for section in SectionReader::new(bytes) {
        let section = section?;
        match section.kind {
            SectionKind::Index => model.indices = Some(decode_indices(&section)),
            SectionKind::Vertex => model.vertices = Some(section.payload.to_vec()),
            SectionKind::Image => model.diffuse = Some(decode_image(&section)?),
        }
    }

    Ok(model)
}

fn decode_indices(section: &Section<'_>) -> Vec<u32> {
    section
        .payload
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}

fn decode_image(section: &Section<'_>) -> Result<RgbaImage, FormatError> {
    image::load_from_memory(section.payload)
        .map(|img| img.into_rgba8())
        .map_err(|source| FormatError::Image { offset: section.offset, source })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;
    use crate::section::padded;
    use crate::{ContainerWriter, Vertex, SECTION_HEADER_SIZE};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([x as u8 * 40, y as u8 * 40, 200, 255])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_embedded_png() {
        let bytes = ContainerWriter::new()
            .indices(&[0, 1, 2])
            .image(&png(3, 2))
            .finish();

        let model = parse(&bytes).unwrap();
        let diffuse = model.diffuse.unwrap();
        assert_eq!(diffuse.dimensions(), (3, 2));
        assert_eq!(diffuse.get_pixel(2, 1).0, [80, 40, 200, 255]);
        assert!(model.vertices.is_none());
    }

    #[test]
    fn last_section_of_each_kind_wins() {
        let bytes = ContainerWriter::new()
            .indices(&[9, 9, 9])
            .vertices(&[Vertex::default(); 1])
            .indices(&[0, 1, 2, 3])
            .vertices(&[Vertex::default(); 2])
            .finish();

        let model = parse(&bytes).unwrap();
        assert_eq!(model.indices, Some(vec![0, 1, 2, 3]));
        assert_eq!(model.vertex_count(), 2);
    }

    #[test]
    fn garbage_image_is_format_error() {
        let bytes = ContainerWriter::new()
            .indices(&[0])
            .image(b"not an image")
            .finish();

        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, FormatError::Image { offset: 12, .. }));
        assert_eq!(err.offset(), 12);
    }

    #[test]
    fn vertex_bytes_are_kept_verbatim() {
        let v = Vertex::new([1.0, 2.0, 3.0], [0.0, 0.0, 1.0], [0.5, 0.25]);
        let bytes = ContainerWriter::new().vertices(&[v]).finish();
        let model = parse(&bytes).unwrap();
        let raw = model.vertices.unwrap();
        assert_eq!(raw.as_slice(), bytemuck::bytes_of(&v));
    }

    #[derive(Debug, Clone)]
    enum Planned {
        Index(Vec<u32>),
        Vertex(usize),
        Image(Vec<u8>),
    }

    fn section_strategy() -> impl Strategy<Value = Planned> {
        prop_oneof![
            prop::collection::vec(any::<u32>(), 0..32).prop_map(Planned::Index),
            (0usize..6).prop_map(Planned::Vertex),
            prop::collection::vec(any::<u8>(), 0..23).prop_map(Planned::Image),
        ]
    }

    fn build(planned: &[Planned]) -> Vec<u8> {
        planned
            .iter()
            .fold(ContainerWriter::new(), |w, s| match s {
                Planned::Index(ix) => w.indices(ix),
                Planned::Vertex(n) => w.vertices(&vec![Vertex::default(); *n]),
                Planned::Image(bytes) => w.image(bytes),
            })
            .finish()
    }

    /// Offsets at which a valid section sequence may end.
    fn boundaries(planned: &[Planned]) -> Vec<usize> {
        let mut at = 0;
        let mut out = vec![0];
        for s in planned {
            at += SECTION_HEADER_SIZE
                + match s {
                    Planned::Index(ix) => ix.len() * 4,
                    Planned::Vertex(n) => n * VERTEX_STRIDE,
                    Planned::Image(bytes) => padded(bytes.len()),
                };
            out.push(at);
        }
        out
    }

    proptest! {
        #[test]
        fn section_lengths_round_trip(planned in prop::collection::vec(section_strategy(), 0..8)) {
            let bytes = build(&planned);
            let sections: Vec<_> = SectionReader::new(&bytes)
                .collect::<Result<_, _>>()
                .unwrap();

            prop_assert_eq!(sections.len(), planned.len());
            for (section, expected) in sections.iter().zip(&planned) {
                match expected {
                    Planned::Index(ix) => {
                        prop_assert_eq!(section.kind, SectionKind::Index);
                        prop_assert_eq!(section.count as usize, ix.len());
                    }
                    Planned::Vertex(n) => {
                        prop_assert_eq!(section.kind, SectionKind::Vertex);
                        prop_assert_eq!(section.payload.len(), n * VERTEX_STRIDE);
                    }
                    Planned::Image(img) => {
                        prop_assert_eq!(section.kind, SectionKind::Image);
                        prop_assert_eq!(section.count as usize, img.len());
                    }
                }
            }
        }

        #[test]
        fn every_section_starts_aligned(planned in prop::collection::vec(section_strategy(), 0..8)) {
            let bytes = build(&planned);
            prop_assert_eq!(bytes.len() % 4, 0);
            for section in SectionReader::new(&bytes) {
                prop_assert_eq!(section.unwrap().offset % 4, 0);
            }
        }

        #[test]
        fn unreachable_lengths_fail(
            planned in prop::collection::vec(section_strategy(), 1..6),
            cut in any::<prop::sample::Index>(),
        ) {
            let bytes = build(&planned);
            let cut = cut.index(bytes.len() + 1);
            let prefix = &bytes[..cut];

            let result: Result<Vec<_>, _> = SectionReader::new(prefix).collect();
            if boundaries(&planned).contains(&cut) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert!(result.is_err());
            }
        }

        #[test]
        fn parse_without_images_keeps_last_index_section(
            first in prop::collection::vec(any::<u32>(), 0..16),
            last in prop::collection::vec(any::<u32>(), 0..16),
            verts in 0usize..4,
        ) {
            let bytes = ContainerWriter::new()
                .indices(&first)
                .vertices(&vec![Vertex::default(); verts])
                .indices(&last)
                .finish();
            let model = parse(&bytes).unwrap();
            prop_assert_eq!(model.index_bytes(), last.len() * 4);
            prop_assert_eq!(model.vertex_count(), verts);
            prop_assert_eq!(model.indices.as_deref(), Some(&last[..]));
        }
    }
}
