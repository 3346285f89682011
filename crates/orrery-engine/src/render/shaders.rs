//! Embedded WGSL programs.
//!
//! Binding contract shared by the model programs:
//! - group 0: binding 0 camera uniform, binding 1 sampler
//! - group 1: binding 2 model uniform, bindings 3.. variant resources
//!
//! Layouts are derived from the shaders, so every declared binding must be
//! used by some entry point.

use super::entity::ModelVariant;

pub const GENERAL: &str = include_str!("shaders/general.wgsl");
pub const ENV_MAPPED: &str = include_str!("shaders/env_mapped.wgsl");
pub const SKYBOX: &str = include_str!("shaders/skybox.wgsl");
pub const ENV_DEBUG: &str = include_str!("shaders/env_debug.wgsl");
pub const POST: &str = include_str!("shaders/post.wgsl");
pub const BLUR: &str = include_str!("shaders/blur.wgsl");
pub const OPTICAL_DEPTH: &str = include_str!("shaders/optical_depth.wgsl");

/// Override names consumed by the programs above.
pub const BLUR_RADIUS: &str = "radius";
pub const BLOOM_STRENGTH: &str = "bloom_strength";
pub const EXPOSURE: &str = "exposure";

pub fn for_variant(variant: ModelVariant) -> &'static str {
    match variant {
        ModelVariant::General => GENERAL,
        ModelVariant::EnvMapped => ENV_MAPPED,
        ModelVariant::Skybox => SKYBOX,
        ModelVariant::EnvDebug => ENV_DEBUG,
    }
}
