use super::pipeline::{ComputeOptions, ComputePipeline, RenderOptions, RenderPipeline};
use super::vertex::VertexLayout;

/// Stable handle to a render pipeline in a [`PipelineRegistry`].
///
/// Ids are dense indices assigned in compile order and never reused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PipelineId(u32);

impl PipelineId {
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[cfg(test)]
    pub(crate) const fn for_test(index: u32) -> Self {
        Self(index)
    }
}

/// Stable handle to a compute pipeline in a [`PipelineRegistry`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ComputeId(u32);

impl ComputeId {
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[cfg(test)]
    pub(crate) const fn for_test(index: u32) -> Self {
        Self(index)
    }
}

/// Owns every compiled pipeline for the process lifetime.
///
/// Render and compute pipelines live in separate tables so a handle can only
/// ever name the kind it was created for.
#[derive(Default)]
pub struct PipelineRegistry {
    render: Vec<RenderPipeline>,
    compute: Vec<ComputePipeline>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a render pipeline (`vertex_main` / `fragment_main`).
    pub fn compile_render(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
        vertex_layout: VertexLayout,
        color_targets: &[Option<wgpu::ColorTargetState>],
        options: &RenderOptions,
    ) -> PipelineId {
        let id = PipelineId(self.render.len() as u32);
        self.render.push(RenderPipeline::new(
            device,
            label,
            source,
            vertex_layout,
            color_targets,
            options,
        ));
        id
    }

    /// Compiles a compute pipeline at `options.entry_point`.
    pub fn compile_compute(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
        options: &ComputeOptions,
    ) -> ComputeId {
        let id = ComputeId(self.compute.len() as u32);
        self.compute
            .push(ComputePipeline::new(device, label, source, options));
        id
    }

    /// Ids minted by this registry are always in range.
    #[inline]
    pub fn render(&self, id: PipelineId) -> &RenderPipeline {
        debug_assert!(
            (id.0 as usize) < self.render.len(),
            "{id:?} was not minted by this registry"
        );
        &self.render[id.0 as usize]
    }

    #[inline]
    pub fn compute(&self, id: ComputeId) -> &ComputePipeline {
        debug_assert!(
            (id.0 as usize) < self.compute.len(),
            "{id:?} was not minted by this registry"
        );
        &self.compute[id.0 as usize]
    }

    /// Memoized layout of bind group `index` of a render pipeline.
    pub fn bind_group_layout(&self, id: PipelineId, index: u32) -> &wgpu::BindGroupLayout {
        self.render(id).bind_group_layout(index)
    }

    /// Memoized layout of bind group `index` of a compute pipeline.
    pub fn compute_bind_group_layout(&self, id: ComputeId, index: u32) -> &wgpu::BindGroupLayout {
        self.compute(id).bind_group_layout(index)
    }

    pub fn render_count(&self) -> usize {
        self.render.len()
    }
}
