use crate::coords::Viewport;

use super::pipeline::{DEPTH_FORMAT, HDR_FORMAT};

/// Layouts the screen-sized bind groups are built against.
pub struct PostLayouts<'a> {
    pub composite: &'a wgpu::BindGroupLayout,
    pub blur_x: &'a wgpu::BindGroupLayout,
    pub blur_y: &'a wgpu::BindGroupLayout,
}

/// Every texture sized to the drawable, plus the bind groups that read them.
///
/// Dropped and rebuilt wholesale on resize.
pub struct ScreenTargets {
    size: Viewport,
    depth_view: wgpu::TextureView,
    hdr_view: wgpu::TextureView,
    /// HDR → blur A.
    blur_x_group: wgpu::BindGroup,
    /// Blur A → blur B.
    blur_y_group: wgpu::BindGroup,
    /// HDR + blur B + sampler.
    composite_group: wgpu::BindGroup,
}

impl ScreenTargets {
    pub fn new(
        device: &wgpu::Device,
        size: Viewport,
        layouts: &PostLayouts<'_>,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = |label: &str, format: wgpu::TextureFormat, usage: wgpu::TextureUsages| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: extent,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        let depth_view = texture(
            "orrery screen depth",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let hdr_view = texture(
            "orrery hdr target",
            HDR_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let blur_usage = wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING;
        let blur_a = texture("orrery blur a", HDR_FORMAT, blur_usage);
        let blur_b = texture("orrery blur b", HDR_FORMAT, blur_usage);

        let blur_group = |label: &str,
                          layout: &wgpu::BindGroupLayout,
                          src: &wgpu::TextureView,
                          dst: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(src),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(dst),
                    },
                ],
            })
        };
        let blur_x_group = blur_group("orrery blur x bind group", layouts.blur_x, &hdr_view, &blur_a);
        let blur_y_group = blur_group("orrery blur y bind group", layouts.blur_y, &blur_a, &blur_b);

        let composite_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery composite bind group"),
            layout: layouts.composite,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&hdr_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&blur_b),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        log::debug!(
            "screen targets {}x{} (depth, hdr, blur a/b)",
            extent.width,
            extent.height
        );

        Self {
            size,
            depth_view,
            hdr_view,
            blur_x_group,
            blur_y_group,
            composite_group,
        }
    }

    #[inline]
    pub fn size(&self) -> Viewport {
        self.size
    }

    #[inline]
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    #[inline]
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.hdr_view
    }

    #[inline]
    pub fn blur_x_group(&self) -> &wgpu::BindGroup {
        &self.blur_x_group
    }

    #[inline]
    pub fn blur_y_group(&self) -> &wgpu::BindGroup {
        &self.blur_y_group
    }

    #[inline]
    pub fn composite_group(&self) -> &wgpu::BindGroup {
        &self.composite_group
    }
}
