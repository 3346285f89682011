use std::collections::HashMap;

use super::registry::PipelineId;
use super::uniforms::SLOT_COUNT;

/// Cache key for the camera bind group of `slot` built against `pipeline`'s layout.
///
/// Auto-derived layouts make bind groups pipeline-specific, so the pipeline is
/// part of the key.
#[inline]
pub fn camera_key(pipeline: PipelineId, slot: u32) -> u32 {
    debug_assert!(slot < SLOT_COUNT);
    pipeline.index() * SLOT_COUNT + slot
}

/// Append-only table of bind groups keyed by a stable integer id.
///
/// Entries are built on first request and never invalidated: the layouts they
/// were built against live as long as the process.
pub struct BindGroupCache<T = wgpu::BindGroup> {
    entries: HashMap<u32, T>,
}

impl<T> Default for BindGroupCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> BindGroupCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `key`, building it with `build` on first use.
    pub fn get_or_insert_with(&mut self, key: u32, build: impl FnOnce() -> T) -> &T {
        self.entries.entry(key).or_insert_with(|| {
            log::trace!("bind group cache miss: key {key}");
            build()
        })
    }

    #[inline]
    pub fn get(&self, key: u32) -> Option<&T> {
        self.entries.get(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
