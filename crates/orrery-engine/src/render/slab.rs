use orrery_asset::{ModelData, RgbaImage};

use super::error::RenderError;

/// Bytes reserved for a model's uniform block.
pub const MODEL_UNIFORM_SIZE: u64 = 256;

/// Alignment of the uniform region; wgpu's default uniform offset alignment.
pub const UNIFORM_ALIGN: u64 = 256;

/// Diffuse texture format for model textures.
pub const DIFFUSE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const PLACEHOLDER_SIZE: u32 = 2;
const PLACEHOLDER_TEXEL: [u8; 4] = [128, 128, 128, 255];

/// Byte layout of one model slab: `[vertices | indices | pad | uniform]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SlabLayout {
    pub vertex_bytes: u64,
    pub index_bytes: u64,
    /// First 256-byte boundary at or after the end of the index data.
    pub uniform_offset: u64,
}

impl SlabLayout {
    pub fn for_model(vertex_bytes: u64, index_bytes: u64) -> Self {
        let uniform_offset = (vertex_bytes + index_bytes).div_ceil(UNIFORM_ALIGN) * UNIFORM_ALIGN;
        Self {
            vertex_bytes,
            index_bytes,
            uniform_offset,
        }
    }

    #[inline]
    pub fn vertex_offset(&self) -> u64 {
        0
    }

    #[inline]
    pub fn index_offset(&self) -> u64 {
        self.vertex_bytes
    }

    /// Total buffer size, uniform region included.
    #[inline]
    pub fn total_size(&self) -> u64 {
        self.uniform_offset + MODEL_UNIFORM_SIZE
    }
}

/// A non-owning window into a shared buffer.
///
/// Cloning shares the underlying buffer; the views of one model alias it.
#[derive(Debug, Clone)]
pub struct BufferView {
    pub buffer: wgpu::Buffer,
    pub offset: u64,
    pub size: u64,
}

impl BufferView {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Slice for vertex/index binding. Must not be called on an empty view.
    #[inline]
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(self.offset..self.offset + self.size)
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: self.offset,
            size: wgpu::BufferSize::new(self.size),
        })
    }
}

/// One model's GPU allocation: a single buffer packing vertex, index and
/// uniform data, plus its diffuse texture.
pub struct ModelSlab {
    pub layout: SlabLayout,
    pub vertex_view: BufferView,
    pub index_view: BufferView,
    pub uniform_view: BufferView,
    pub texture: wgpu::Texture,
    pub texture_view: wgpu::TextureView,
}

impl ModelSlab {
    /// Allocates and fills a fresh slab for `model`. Allocations are never reused.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model: &ModelData,
    ) -> Result<Self, RenderError> {
        let layout = SlabLayout::for_model(model.vertex_bytes() as u64, model.index_bytes() as u64);
        check_limits(&layout, diffuse_size(model), &device.limits())?;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("orrery model slab"),
            size: layout.total_size(),
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::INDEX
                | wgpu::BufferUsages::UNIFORM
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Queue writes are ordered before any later submission; no fence needed.
        if let Some(vertices) = model.vertices.as_deref().filter(|v| !v.is_empty()) {
            queue.write_buffer(&buffer, layout.vertex_offset(), vertices);
        }
        if let Some(indices) = model.indices.as_deref().filter(|i| !i.is_empty()) {
            queue.write_buffer(&buffer, layout.index_offset(), bytemuck::cast_slice(indices));
        }

        let texture = match (&model.diffuse, diffuse_size(model)) {
            (Some(image), Some(_)) => upload_diffuse(device, queue, image),
            _ => placeholder_texture(device, queue),
        };
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!(
            "uploaded model slab: {} vertex bytes, {} index bytes, uniform at {}, texture {}x{}",
            layout.vertex_bytes,
            layout.index_bytes,
            layout.uniform_offset,
            texture.width(),
            texture.height()
        );

        Ok(Self {
            layout,
            vertex_view: BufferView {
                buffer: buffer.clone(),
                offset: layout.vertex_offset(),
                size: layout.vertex_bytes,
            },
            index_view: BufferView {
                buffer: buffer.clone(),
                offset: layout.index_offset(),
                size: layout.index_bytes,
            },
            uniform_view: BufferView {
                buffer,
                offset: layout.uniform_offset,
                size: MODEL_UNIFORM_SIZE,
            },
            texture,
            texture_view,
        })
    }

    /// Number of indices to draw.
    #[inline]
    pub fn index_count(&self) -> u32 {
        (self.layout.index_bytes / 4) as u32
    }

    /// Whether the slab holds anything drawable.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        !self.index_view.is_empty() && !self.vertex_view.is_empty()
    }
}

/// Size of the model's own texture; `None` means the placeholder is used.
fn diffuse_size(model: &ModelData) -> Option<(u32, u32)> {
    model
        .diffuse
        .as_ref()
        .map(RgbaImage::dimensions)
        .filter(|&(w, h)| w > 0 && h > 0)
}

/// Rejects a model the device can't hold, before anything is allocated.
pub fn check_limits(
    layout: &SlabLayout,
    diffuse: Option<(u32, u32)>,
    limits: &wgpu::Limits,
) -> Result<(), RenderError> {
    if layout.total_size() > limits.max_buffer_size {
        return Err(RenderError::ExceedsLimits(format!(
            "slab of {} bytes exceeds max_buffer_size {}",
            layout.total_size(),
            limits.max_buffer_size
        )));
    }
    if let Some((width, height)) = diffuse {
        let max = limits.max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RenderError::ExceedsLimits(format!(
                "diffuse texture {width}x{height} exceeds max_texture_dimension_2d {max}"
            )));
        }
    }
    Ok(())
}

fn upload_diffuse(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage) -> wgpu::Texture {
    let (width, height) = image.dimensions();
    let texture = create_diffuse(device, "orrery model texture", width, height);
    write_rgba(queue, &texture, image.as_raw(), width, height);
    texture
}

/// Fixed 2×2 grey stand-in for models without an image section.
fn placeholder_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::Texture {
    let texture = create_diffuse(device, "orrery placeholder texture", PLACEHOLDER_SIZE, PLACEHOLDER_SIZE);
    let texels = PLACEHOLDER_TEXEL.repeat((PLACEHOLDER_SIZE * PLACEHOLDER_SIZE) as usize);
    write_rgba(queue, &texture, &texels, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE);
    texture
}

fn create_diffuse(device: &wgpu::Device, label: &str, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DIFFUSE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_rgba(queue: &wgpu::Queue, texture: &wgpu::Texture, texels: &[u8], width: u32, height: u32) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        texels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn triangle_slab_is_512_bytes() {
        // 3 vertices of 60 bytes, indices [0, 1, 2].
        let layout = SlabLayout::for_model(180, 12);
        assert_eq!(layout.index_offset(), 180);
        assert_eq!(layout.uniform_offset, 256);
        assert_eq!(layout.total_size(), 512);
    }

    #[test]
    fn empty_mesh_still_gets_a_uniform_region() {
        let layout = SlabLayout::for_model(0, 0);
        assert_eq!(layout.uniform_offset, 0);
        assert_eq!(layout.total_size(), MODEL_UNIFORM_SIZE);
    }

    #[test]
    fn exact_multiple_is_not_padded() {
        let layout = SlabLayout::for_model(240, 16);
        assert_eq!(layout.uniform_offset, 256);
        let layout = SlabLayout::for_model(240, 20);
        assert_eq!(layout.uniform_offset, 512);
    }

    #[test]
    fn oversized_models_fail_only_their_own_load() {
        let limits = wgpu::Limits {
            max_texture_dimension_2d: 1024,
            max_buffer_size: 4096,
            ..wgpu::Limits::default()
        };
        let small = SlabLayout::for_model(180, 12);
        assert!(check_limits(&small, Some((1024, 1024)), &limits).is_ok());
        assert!(check_limits(&small, None, &limits).is_ok());

        let err = check_limits(&small, Some((1025, 1)), &limits).unwrap_err();
        assert!(matches!(err, RenderError::ExceedsLimits(_)));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("1025x1"));

        let big = SlabLayout::for_model(4096, 0);
        let err = check_limits(&big, None, &limits).unwrap_err();
        assert!(matches!(err, RenderError::ExceedsLimits(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn empty_images_use_the_placeholder() {
        let mut model = ModelData::default();
        assert_eq!(diffuse_size(&model), None);
        model.diffuse = Some(RgbaImage::new(0, 4));
        assert_eq!(diffuse_size(&model), None);
        model.diffuse = Some(RgbaImage::new(3, 2));
        assert_eq!(diffuse_size(&model), Some((3, 2)));
    }

    proptest! {
        #[test]
        fn uniform_region_follows_geometry(vertices in 0u64..100_000, indices in 0u64..300_000) {
            let vertex_bytes = vertices * 60;
            let index_bytes = indices * 4;
            let layout = SlabLayout::for_model(vertex_bytes, index_bytes);

            prop_assert_eq!(layout.uniform_offset % UNIFORM_ALIGN, 0);
            prop_assert_eq!(layout.uniform_offset, (vertex_bytes + index_bytes).div_ceil(256) * 256);
            prop_assert!(layout.uniform_offset >= layout.index_offset() + index_bytes);
            prop_assert!(layout.uniform_offset - (vertex_bytes + index_bytes) < UNIFORM_ALIGN);
            // Index data must start on a 4-byte boundary to bind as Uint32.
            prop_assert_eq!(layout.index_offset() % 4, 0);
        }
    }
}
