//! Reader and writer for the **orrery model container** (`.bin`).
//!
//! A container is a flat little-endian byte buffer holding a sequence of
//! 4-byte-aligned, type-tagged sections. Each section starts with an 8-byte
//! header `{ type: u32, length: u32 }` followed by its payload:
//!
//! | type | kind   | `length` counts        | payload size              |
//! |------|--------|------------------------|---------------------------|
//! | 1    | index  | u32 indices            | `length * 4`              |
//! | 2    | vertex | 60-byte vertex records | `length * 60`             |
//! | 3    | image  | encoded image bytes    | `length`, padded to 4     |
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`error`] | `FormatError` |
//! | [`section`] | `SectionKind`, `Section`, `SectionReader` |
//! | [`parser`] | `parse` entry point, `ModelData` |
//! | [`vertex`] | `Vertex` record layout |
//! | [`writer`] | `ContainerWriter` |
//!
//! # Quick start
//!
//! ```rust
//! use orrery_asset::{parse, ContainerWriter, Vertex};
//!
//! let bytes = ContainerWriter::new()
//!     .indices(&[0, 1, 2])
//!     .vertices(&[Vertex::default(); 3])
//!     .finish();
//!
//! let model = parse(&bytes).unwrap();
//! assert_eq!(model.indices.as_deref(), Some(&[0, 1, 2][..]));
//! assert_eq!(model.vertex_bytes(), 180);
//! ```

pub mod error;
pub mod parser;
pub mod section;
pub mod vertex;
pub mod writer;

pub use error::FormatError;
pub use image::RgbaImage;
pub use parser::{parse, ModelData};
pub use section::{Section, SectionKind, SectionReader};
pub use vertex::{Vertex, VERTEX_STRIDE};
pub use writer::ContainerWriter;

/// Size of a section header (`type` + `length`) in bytes.
pub const SECTION_HEADER_SIZE: usize = 8;

/// Alignment every section start offset must satisfy.
pub const SECTION_ALIGN: usize = 4;
