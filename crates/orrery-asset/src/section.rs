use crate::error::FormatError;
use crate::vertex::VERTEX_STRIDE;
use crate::{SECTION_ALIGN, SECTION_HEADER_SIZE};

// ── SectionKind ───────────────────────────────────────────────────────────

/// Section type tag.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SectionKind {
    Index,
    Vertex,
    Image,
}

impl SectionKind {
    /// Reserved on-disk type code.
    #[inline]
    pub const fn code(self) -> u32 {
        match self {
            Self::Index => 1,
            Self::Vertex => 2,
            Self::Image => 3,
        }
    }

    #[inline]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Index),
            2 => Some(Self::Vertex),
            3 => Some(Self::Image),
            _ => None,
        }
    }

    /// Payload bytes described by a `length` field of `count`.
    ///
    /// Returns `None` if the size does not fit in `usize`.
    #[inline]
    pub fn payload_len(self, count: u32) -> Option<usize> {
        let count = count as usize;
        match self {
            Self::Index => count.checked_mul(4),
            Self::Vertex => count.checked_mul(VERTEX_STRIDE),
            Self::Image => Some(count),
        }
    }
}

// ── Section ───────────────────────────────────────────────────────────────

/// A borrowed view of one section inside a container buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Section<'a> {
    pub kind: SectionKind,
    /// Byte offset of the section header.
    pub offset: usize,
    /// Raw `length` field: index count, vertex count or image byte length.
    pub count: u32,
    /// Payload bytes, excluding header and alignment padding.
    pub payload: &'a [u8],
}

impl Section<'_> {
    /// Bytes the cursor advances past this section, padding included.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        SECTION_HEADER_SIZE + padded(self.payload.len())
    }
}

/// Rounds `len` up to the container alignment.
#[inline]
pub(crate) fn padded(len: usize) -> usize {
    len.div_ceil(SECTION_ALIGN) * SECTION_ALIGN
}

// ── SectionReader ─────────────────────────────────────────────────────────

/// Sequential, zero-copy walk over the sections of a container.
///
/// Yields `Err` once and then stops: a malformed section leaves the cursor in
/// an unknown state, so nothing after it is trusted.
pub struct SectionReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> SectionReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_offset(bytes, 0)
    }

    /// Starts reading at `offset` instead of the beginning of the buffer.
    pub fn with_offset(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, pos: offset, failed: false }
    }

    /// Current cursor position in bytes.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_u32(&self, at: usize) -> Option<u32> {
        let word = self.bytes.get(at..at.checked_add(4)?)?;
        <[u8; 4]>::try_from(word).ok().map(u32::from_le_bytes)
    }

    fn truncated(&self, needed: usize) -> FormatError {
        FormatError::Truncated {
            offset: self.pos,
            needed,
            available: self.bytes.len().saturating_sub(self.pos),
        }
    }

    fn next_section(&mut self) -> Result<Section<'a>, FormatError> {
        let offset = self.pos;
        if offset % SECTION_ALIGN != 0 {
            return Err(FormatError::Misaligned { offset });
        }

        let (Some(tag), Some(count)) = (self.read_u32(offset), self.read_u32(offset + 4)) else {
            return Err(self.truncated(SECTION_HEADER_SIZE));
        };

        let kind = SectionKind::from_code(tag)
            .ok_or(FormatError::UnknownSection { tag, offset })?;

        let payload_len = kind.payload_len(count).ok_or_else(|| self.truncated(usize::MAX))?;
        let encoded = SECTION_HEADER_SIZE
            .checked_add(padded(payload_len))
            .ok_or_else(|| self.truncated(usize::MAX))?;

        // The whole padded section must be present, even though padding is never read.
        let available = self.bytes.len() - offset;
        if encoded > available {
            return Err(self.truncated(encoded));
        }

        let start = offset + SECTION_HEADER_SIZE;
        let payload = &self.bytes[start..start + payload_len];
        self.pos = offset + encoded;

        Ok(Section { kind, offset, count, payload })
    }
}

impl<'a> Iterator for SectionReader<'a> {
    type Item = Result<Section<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        let res = self.next_section();
        self.failed = res.is_err();
        Some(res)
    }
}
