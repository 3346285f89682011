use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec3};
use thiserror::Error;

use super::camera::{euler_deg, CUBE_FACES};
use super::pipeline::{DEPTH_FORMAT, HDR_FORMAT};
use super::registry::PipelineId;
use super::slab::ModelSlab;

// ── variants ──────────────────────────────────────────────────────────────

/// Selects how a model is shaded and which resources it binds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ModelVariant {
    General,
    EnvMapped,
    Skybox,
    EnvDebug,
}

/// A texture bound after the model uniform in group 1.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindResource {
    Diffuse,
    EnvironmentCube,
    OpticalDepth,
}

/// What a variant needs beyond geometry and its model uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Capabilities {
    /// The entity owns a cube map that is re-baked every frame.
    pub has_environment_cube: bool,
    /// Bound at group 1, bindings 3.. in order.
    pub extra_resources: &'static [BindResource],
    pub cull_mode: Option<wgpu::Face>,
}

impl ModelVariant {
    pub const ALL: [Self; 4] = [Self::General, Self::EnvMapped, Self::Skybox, Self::EnvDebug];

    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::General => Capabilities {
                has_environment_cube: false,
                extra_resources: &[BindResource::Diffuse],
                cull_mode: None,
            },
            Self::EnvMapped => Capabilities {
                has_environment_cube: true,
                extra_resources: &[BindResource::Diffuse, BindResource::EnvironmentCube],
                cull_mode: Some(wgpu::Face::Back),
            },
            Self::Skybox => Capabilities {
                has_environment_cube: false,
                extra_resources: &[BindResource::OpticalDepth],
                cull_mode: None,
            },
            Self::EnvDebug => Capabilities {
                has_environment_cube: true,
                extra_resources: &[BindResource::EnvironmentCube],
                cull_mode: None,
            },
        }
    }

    /// Name used in scene files and logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::EnvMapped => "env_mapped",
            Self::Skybox => "skybox",
            Self::EnvDebug => "env_debug",
        }
    }

    /// Dense index, stable for the process lifetime.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("unknown model variant '{0}' (expected general, env_mapped, skybox or env_debug)")]
pub struct UnknownVariant(pub String);

impl FromStr for ModelVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

// ── transform ─────────────────────────────────────────────────────────────

/// Placement of a model in the world. All fields may change between frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in degrees, applied X, then Y, then Z.
    pub rotation_deg: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_deg: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// `T * R * S`.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, euler_deg(self.rotation_deg), self.translation)
    }
}

// ── environment cube ──────────────────────────────────────────────────────

/// Per-entity HDR cube map with its depth cube. Fixed size; never resized.
pub struct EnvCube {
    size: u32,
    cube_view: wgpu::TextureView,
    face_views: [wgpu::TextureView; CUBE_FACES],
    depth_views: [wgpu::TextureView; CUBE_FACES],
}

impl EnvCube {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let extent = wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: CUBE_FACES as u32,
        };

        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("orrery env cube"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("orrery env cube depth"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let cube_view = color.create_view(&wgpu::TextureViewDescriptor {
            label: Some("orrery env cube view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let layer = |texture: &wgpu::Texture, face: usize| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("orrery env cube face"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: face as u32,
                array_layer_count: Some(1),
                ..Default::default()
            })
        };

        log::debug!("created env cube {size}x{size}x{CUBE_FACES}");

        // Views keep their textures alive.
        Self {
            size,
            cube_view,
            face_views: std::array::from_fn(|face| layer(&color, face)),
            depth_views: std::array::from_fn(|face| layer(&depth, face)),
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Cube view for sampling.
    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.cube_view
    }

    /// Color and depth attachments for one face.
    #[inline]
    pub fn face(&self, face: usize) -> (&wgpu::TextureView, &wgpu::TextureView) {
        (&self.face_views[face], &self.depth_views[face])
    }
}

// ── entity ────────────────────────────────────────────────────────────────

/// Position of an entity in the render list. Entities are never removed, so
/// ids stay valid.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Renderer-wide resources a variant may bind.
pub struct SharedResources<'a> {
    pub optical_depth: &'a wgpu::TextureView,
    pub env_cube_size: u32,
}

/// One drawable model.
pub struct Entity {
    pub transform: Transform,
    variant: ModelVariant,
    pipeline: PipelineId,
    slab: ModelSlab,
    /// Bound at groups 1.. in order.
    bind_groups: Vec<wgpu::BindGroup>,
    env: Option<EnvCube>,
}

impl Entity {
    /// Builds the entity completely: cube textures first (if any), then its
    /// group-1 bind group against `model_layout`.
    pub fn new(
        device: &wgpu::Device,
        model_layout: &wgpu::BindGroupLayout,
        pipeline: PipelineId,
        variant: ModelVariant,
        slab: ModelSlab,
        shared: &SharedResources<'_>,
        transform: Transform,
    ) -> Self {
        let caps = variant.capabilities();
        let env = caps
            .has_environment_cube
            .then(|| EnvCube::new(device, shared.env_cube_size));

        let bind_group = {
            let mut entries = vec![wgpu::BindGroupEntry {
                binding: 2,
                resource: slab.uniform_view.binding(),
            }];
            for (i, resource) in caps.extra_resources.iter().enumerate() {
                let view = match resource {
                    BindResource::Diffuse => Some(&slab.texture_view),
                    BindResource::EnvironmentCube => env.as_ref().map(EnvCube::view),
                    BindResource::OpticalDepth => Some(shared.optical_depth),
                };
                if let Some(view) = view {
                    entries.push(wgpu::BindGroupEntry {
                        binding: 3 + i as u32,
                        resource: wgpu::BindingResource::TextureView(view),
                    });
                }
            }

            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("orrery {variant} model bind group")),
                layout: model_layout,
                entries: &entries,
            })
        };

        Self {
            transform,
            variant,
            pipeline,
            slab,
            bind_groups: vec![bind_group],
            env,
        }
    }

    #[inline]
    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    #[inline]
    pub fn pipeline(&self) -> PipelineId {
        self.pipeline
    }

    #[inline]
    pub fn bind_groups(&self) -> &[wgpu::BindGroup] {
        &self.bind_groups
    }

    #[inline]
    pub fn env_cube(&self) -> Option<&EnvCube> {
        self.env.as_ref()
    }

    #[inline]
    pub fn slab(&self) -> &ModelSlab {
        &self.slab
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.slab.index_count()
    }

    /// Entities without indices or vertices stay in the list but never draw.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.slab.is_drawable()
    }

    /// Writes the current model matrix into the slab's uniform region.
    pub fn update_uniform(&self, queue: &wgpu::Queue) {
        let matrix = self.transform.model_matrix().to_cols_array();
        let view = &self.slab.uniform_view;
        queue.write_buffer(&view.buffer, view.offset, bytemuck::cast_slice(&matrix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn model_matrix_scales_then_rotates_then_translates() {
        let t = Transform {
            translation: Vec3::new(0.0, 0.0, -100.0),
            rotation_deg: Vec3::new(90.0, 0.0, 0.0),
            scale: Vec3::new(1000.0, 1.0, 1000.0),
        };
        let m = t.model_matrix();
        // +Y scaled by 1, rotated 90° about X to +Z, then moved down.
        assert!(approx(m.transform_point3(Vec3::Y), Vec3::new(0.0, 0.0, -99.0)));
        // +Z scaled by 1000, rotated to −Y.
        assert!(approx(m.transform_point3(Vec3::Z), Vec3::new(0.0, -1000.0, -100.0)));
    }

    #[test]
    fn default_transform_is_identity() {
        assert_eq!(Transform::default().model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn cube_resources_match_cube_flag() {
        for variant in ModelVariant::ALL {
            let caps = variant.capabilities();
            let binds_cube = caps.extra_resources.contains(&BindResource::EnvironmentCube);
            assert_eq!(caps.has_environment_cube, binds_cube, "{variant}");
        }
    }

    #[test]
    fn variant_table() {
        let env = ModelVariant::EnvMapped.capabilities();
        assert_eq!(env.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(
            env.extra_resources,
            &[BindResource::Diffuse, BindResource::EnvironmentCube]
        );
        assert_eq!(
            ModelVariant::Skybox.capabilities().extra_resources,
            &[BindResource::OpticalDepth]
        );
        assert!(!ModelVariant::General.capabilities().has_environment_cube);
        assert!(ModelVariant::EnvDebug.capabilities().cull_mode.is_none());
    }

    #[test]
    fn variant_names_round_trip() {
        for variant in ModelVariant::ALL {
            assert_eq!(variant.name().parse::<ModelVariant>(), Ok(variant));
        }
        assert_eq!(
            "rocket".parse::<ModelVariant>(),
            Err(UnknownVariant("rocket".into()))
        );
        let indices: Vec<_> = ModelVariant::ALL.iter().map(|v| v.index()).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }
}
