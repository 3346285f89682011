use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Size of one uniform slot; matches wgpu's default `min_uniform_buffer_offset_alignment`.
pub const SLOT_SIZE: u64 = 256;

/// Slots in the frame uniform buffer.
pub const SLOT_COUNT: u32 = 1024;

/// Slot holding the primary camera.
pub const PRIMARY_SLOT: u32 = 0;

/// Shading quality flag forwarded to the shaders.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Quality {
    Low,
    #[default]
    High,
}

impl Quality {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

/// Camera block at the start of every slot.
///
/// Layout matches the WGSL `Camera` struct: vec3 fields are 16-byte aligned,
/// so `quality` and `elapsed` fill their tails.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub quality: u32,
    pub sun_direction: [f32; 3],
    pub elapsed: f32,
}

const _: () = assert!(std::mem::size_of::<CameraUniform>() == 96);
const _: () = assert!(std::mem::size_of::<CameraUniform>() as u64 <= SLOT_SIZE);

impl CameraUniform {
    pub fn new(view_proj: Mat4, position: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            position: position.to_array(),
            quality: Quality::default().as_u32(),
            sun_direction: Vec3::Z.to_array(),
            elapsed: 0.0,
        }
    }

    /// Same quality, sun and time as `self`, seen from another viewpoint.
    pub fn with_view(&self, view_proj: Mat4, position: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            position: position.to_array(),
            ..*self
        }
    }
}

/// Byte offset of `slot` in the frame uniform buffer.
#[inline]
pub const fn slot_offset(slot: u32) -> u64 {
    slot as u64 * SLOT_SIZE
}

/// One device buffer of [`SLOT_COUNT`] fixed 256-byte camera slots.
///
/// Slot 0 holds the primary camera; slots 1.. are rewritten every frame with
/// cube-face cameras.
pub struct FrameUniformBuffer {
    buffer: wgpu::Buffer,
}

impl FrameUniformBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("orrery frame uniforms"),
            size: slot_offset(SLOT_COUNT),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::debug!("frame uniform buffer: {SLOT_COUNT} slots x {SLOT_SIZE} bytes");
        Self { buffer }
    }

    pub fn write(&self, queue: &wgpu::Queue, slot: u32, camera: &CameraUniform) {
        debug_assert!(slot < SLOT_COUNT);
        queue.write_buffer(&self.buffer, slot_offset(slot), bytemuck::bytes_of(camera));
    }

    /// Binding covering exactly one slot.
    pub fn slot_binding(&self, slot: u32) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: slot_offset(slot),
            size: wgpu::BufferSize::new(SLOT_SIZE),
        })
    }
}
