//! Render core.
//!
//! Each frame is planned as a fixed pass list, then recorded into one encoder:
//! environment bakes (one pass per cube face) → primary (HDR) → blur x →
//! blur y → composite into the surface.
//!
//! Convention:
//! - World space is right-handed and Z-up.
//! - Matrices are column-major `glam` types, uploaded as-is.
//! - Group 0 is the camera slot + sampler; group 1 belongs to the model.

mod bind_cache;
mod camera;
mod ctx;
mod entity;
mod error;
mod loader;
mod pipeline;
mod plan;
mod registry;
mod renderer;
pub mod shaders;
mod sky;
mod slab;
mod targets;
mod uniforms;
mod vertex;

pub use bind_cache::{camera_key, BindGroupCache};
pub use camera::{
    euler_deg, face_view, face_view_proj, perspective, primary_view_proj, sun_direction,
    CameraView, CUBE_FACES, DAY_LENGTH_SECS, FACE_FLIPS, FACE_ROTATIONS_DEG, FOV_Y, Z_NEAR,
};
pub use ctx::{RenderCtx, RenderTarget};
pub use entity::{
    BindResource, Capabilities, EnvCube, Entity, EntityId, ModelVariant, Transform, UnknownVariant,
};
pub use error::RenderError;
pub use loader::{load_file, LoadedModel, ModelLoader, ModelRequest};
pub use pipeline::{
    ComputeOptions, ComputePipeline, RenderOptions, RenderPipeline, DEPTH_FORMAT, HDR_FORMAT,
    MAX_BIND_GROUPS,
};
pub use plan::{drawn_entities, FramePlan, PassKind, RenderStats};
pub use registry::{ComputeId, PipelineId, PipelineRegistry};
pub use renderer::{Renderer, RendererConfig};
pub use slab::{BufferView, ModelSlab, SlabLayout, MODEL_UNIFORM_SIZE};
pub use uniforms::{CameraUniform, Quality, PRIMARY_SLOT, SLOT_COUNT, SLOT_SIZE};
pub use vertex::VertexLayout;
