use std::cell::OnceCell;

use super::vertex::VertexLayout;

/// Depth format shared by every depth attachment the renderer creates.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Off-screen color format for the primary pass, cube faces and blur targets.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Bind group slots a pipeline can expose (wgpu's default `max_bind_groups`).
pub const MAX_BIND_GROUPS: usize = 4;

/// Fixed-function state for a render pipeline.
///
/// Every field has a usable default; the composite pipeline is the only one
/// that turns the depth attachment off.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
    /// Whether the pass this pipeline draws in has a depth attachment at all.
    pub depth_attachment: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
    /// Values for `override` declarations used by the fragment stage.
    pub fragment_constants: Vec<(&'static str, f64)>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            depth_attachment: true,
            depth_test: true,
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
            fragment_constants: Vec::new(),
        }
    }
}

impl RenderOptions {
    /// Options for a pass that draws without a depth attachment.
    pub fn without_depth() -> Self {
        Self {
            depth_attachment: false,
            ..Self::default()
        }
    }

    pub fn with_cull_mode(mut self, face: wgpu::Face) -> Self {
        self.cull_mode = Some(face);
        self
    }

    pub fn depth_stencil(&self) -> Option<wgpu::DepthStencilState> {
        if !self.depth_attachment {
            return None;
        }
        Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: self.depth_write,
            depth_compare: if self.depth_test {
                self.depth_compare
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        })
    }

    pub fn primitive(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: self.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: self.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }
}

/// Options for a compute pipeline.
#[derive(Debug, Clone)]
pub struct ComputeOptions {
    pub entry_point: &'static str,
    /// Values for `override` declarations.
    pub constants: Vec<(&'static str, f64)>,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            entry_point: "main",
            constants: Vec::new(),
        }
    }
}

impl ComputeOptions {
    pub fn entry(entry_point: &'static str) -> Self {
        Self {
            entry_point,
            ..Self::default()
        }
    }

    pub fn with_constant(mut self, name: &'static str, value: f64) -> Self {
        self.constants.push((name, value));
        self
    }
}

/// Bind group layouts of an auto-layout pipeline, queried lazily.
///
/// The first access for a group index asks the compiled pipeline; later
/// accesses return the same layout. Layouts are never invalidated.
struct LayoutCache {
    slots: [OnceCell<wgpu::BindGroupLayout>; MAX_BIND_GROUPS],
}

impl LayoutCache {
    fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    fn get(
        &self,
        index: u32,
        query: impl FnOnce(u32) -> wgpu::BindGroupLayout,
    ) -> &wgpu::BindGroupLayout {
        self.slots[index as usize].get_or_init(|| query(index))
    }
}

/// A compiled render pipeline with entry points `vertex_main`/`fragment_main`.
pub struct RenderPipeline {
    label: String,
    pipeline: wgpu::RenderPipeline,
    layouts: LayoutCache,
}

impl RenderPipeline {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        source: &str,
        vertex_layout: VertexLayout,
        targets: &[Option<wgpu::ColorTargetState>],
        options: &RenderOptions,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} shader")),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        // Layout is derived from the shader's bindings.
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{label} pipeline")),
            layout: None,

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vertex_main"),
                compilation_options: Default::default(),
                buffers: vertex_layout.buffers(),
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fragment_main"),
                compilation_options: wgpu::PipelineCompilationOptions {
                    constants: &options.fragment_constants,
                    ..Default::default()
                },
                targets,
            }),

            primitive: options.primitive(),
            depth_stencil: options.depth_stencil(),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("compiled render pipeline '{label}'");

        Self {
            label: label.to_string(),
            pipeline,
            layouts: LayoutCache::new(),
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn raw(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Layout of bind group `index`, memoized. Panics if `index >= MAX_BIND_GROUPS`.
    pub fn bind_group_layout(&self, index: u32) -> &wgpu::BindGroupLayout {
        self.layouts
            .get(index, |i| self.pipeline.get_bind_group_layout(i))
    }
}

/// A compiled compute pipeline.
pub struct ComputePipeline {
    label: String,
    pipeline: wgpu::ComputePipeline,
    layouts: LayoutCache,
}

impl ComputePipeline {
    pub fn new(device: &wgpu::Device, label: &str, source: &str, options: &ComputeOptions) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} shader")),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(&format!("{label} pipeline")),
            layout: None,
            module: &shader,
            entry_point: Some(options.entry_point),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &options.constants,
                ..Default::default()
            },
            cache: None,
        });

        log::debug!("compiled compute pipeline '{label}' ({})", options.entry_point);

        Self {
            label: label.to_string(),
            pipeline,
            layouts: LayoutCache::new(),
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn raw(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    /// Layout of bind group `index`, memoized. Panics if `index >= MAX_BIND_GROUPS`.
    pub fn bind_group_layout(&self, index: u32) -> &wgpu::BindGroupLayout {
        self.layouts
            .get(index, |i| self.pipeline.get_bind_group_layout(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_render_options() {
        let opts = RenderOptions::default();
        assert_eq!(opts.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(opts.primitive().cull_mode, None);

        let depth = opts.depth_stencil().unwrap();
        assert_eq!(depth.format, wgpu::TextureFormat::Depth32Float);
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);
        assert!(depth.depth_write_enabled);
    }

    #[test]
    fn no_depth_attachment_means_no_depth_state() {
        assert!(RenderOptions::without_depth().depth_stencil().is_none());
    }

    #[test]
    fn disabled_depth_test_always_passes() {
        let opts = RenderOptions {
            depth_test: false,
            depth_write: false,
            ..RenderOptions::default()
        };
        let depth = opts.depth_stencil().unwrap();
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Always);
        assert!(!depth.depth_write_enabled);
    }

    #[test]
    fn back_face_culling() {
        let opts = RenderOptions::default().with_cull_mode(wgpu::Face::Back);
        assert_eq!(opts.primitive().cull_mode, Some(wgpu::Face::Back));
    }

    #[test]
    fn compute_entry_defaults_to_main() {
        assert_eq!(ComputeOptions::default().entry_point, "main");
        let opts = ComputeOptions::entry("blur_x").with_constant("radius", 6.0);
        assert_eq!(opts.entry_point, "blur_x");
        assert_eq!(opts.constants, [("radius", 6.0)]);
    }
}
