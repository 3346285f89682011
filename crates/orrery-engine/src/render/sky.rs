use super::pipeline::HDR_FORMAT;
use super::registry::{ComputeId, PipelineRegistry};

/// Workgroup edge of the optical-depth program.
const TILE: u32 = 8;

/// Atmospheric optical-depth table sampled by the skybox.
///
/// Columns run over altitude, rows over the zenith cosine. Baked once at
/// startup and never rewritten.
pub struct OpticalDepthLookup {
    width: u32,
    height: u32,
    view: wgpu::TextureView,
}

impl OpticalDepthLookup {
    /// Allocates the table and fills it with one compute dispatch on its own
    /// submission.
    pub fn bake(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        registry: &PipelineRegistry,
        pipeline: ComputeId,
        width: u32,
        height: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("orrery optical depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery optical depth bind group"),
            layout: registry.compute_bind_group_layout(pipeline, 0),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("orrery optical depth bake"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("orrery optical depth pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(registry.compute(pipeline).raw());
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(width.div_ceil(TILE), height.div_ceil(TILE), 1);
        }
        queue.submit(std::iter::once(encoder.finish()));

        log::debug!("baked optical depth lookup {width}x{height}");

        Self { width, height, view }
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
