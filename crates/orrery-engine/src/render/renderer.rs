use orrery_asset::ModelData;

use crate::coords::Viewport;

use super::bind_cache::{camera_key, BindGroupCache};
use super::camera::{face_view_proj, primary_view_proj, sun_direction, CameraView};
use super::ctx::{RenderCtx, RenderTarget};
use super::entity::{Entity, EntityId, ModelVariant, SharedResources, Transform};
use super::error::RenderError;
use super::loader::{LoadedModel, ModelLoader};
use super::pipeline::{ComputeOptions, RenderOptions, HDR_FORMAT};
use super::plan::{drawn_entities, FramePlan, PassKind, RenderStats};
use super::registry::{ComputeId, PipelineId, PipelineRegistry};
use super::shaders;
use super::sky::OpticalDepthLookup;
use super::slab::ModelSlab;
use super::targets::{PostLayouts, ScreenTargets};
use super::uniforms::{CameraUniform, FrameUniformBuffer, Quality, PRIMARY_SLOT};
use super::vertex::VertexLayout;

/// Workgroup edge of the blur programs.
const BLUR_TILE: u32 = 8;

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub quality: Quality,
    /// Clear color of the primary pass and every cube face.
    pub clear_color: wgpu::Color,
    /// Blur kernel half-width in texels.
    pub blur_radius: u32,
    pub bloom_strength: f32,
    pub exposure: f32,
    /// Edge length of each entity's environment cube.
    pub env_cube_size: u32,
    /// Width (altitude) and height (zenith cosine) of the optical-depth table.
    pub optical_depth_size: (u32, u32),
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            quality: Quality::High,
            clear_color: wgpu::Color {
                r: 0.2,
                g: 0.2,
                b: 0.2,
                a: 1.0,
            },
            blur_radius: 4,
            bloom_strength: 0.35,
            exposure: 1.0,
            env_cube_size: 512,
            optical_depth_size: (256, 1024),
        }
    }
}

impl RendererConfig {
    fn validate(&self, limits: &wgpu::Limits) -> Result<(), RenderError> {
        let max = limits.max_texture_dimension_2d;
        let (w, h) = self.optical_depth_size;
        if self.env_cube_size == 0 || self.env_cube_size > max {
            return Err(RenderError::Device(format!(
                "env cube size {} outside 1..={max}",
                self.env_cube_size
            )));
        }
        if w == 0 || h == 0 || w > max || h > max {
            return Err(RenderError::Device(format!(
                "optical depth lookup {w}x{h} outside 1..={max}"
            )));
        }
        Ok(())
    }
}

struct Pipelines {
    /// Indexed by [`ModelVariant::index`].
    models: [PipelineId; ModelVariant::ALL.len()],
    composite: PipelineId,
    blur_x: ComputeId,
    blur_y: ComputeId,
}

impl Pipelines {
    fn compile(
        registry: &mut PipelineRegistry,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        config: &RendererConfig,
    ) -> Self {
        let hdr_target = [Some(wgpu::ColorTargetState {
            format: HDR_FORMAT,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let models = ModelVariant::ALL.map(|variant| {
            let options = RenderOptions {
                cull_mode: variant.capabilities().cull_mode,
                ..RenderOptions::default()
            };
            registry.compile_render(
                device,
                variant.name(),
                shaders::for_variant(variant),
                VertexLayout::Full,
                &hdr_target,
                &options,
            )
        });

        let composite = registry.compile_render(
            device,
            "composite",
            shaders::POST,
            VertexLayout::Empty,
            &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            &RenderOptions {
                fragment_constants: vec![
                    (shaders::BLOOM_STRENGTH, f64::from(config.bloom_strength)),
                    (shaders::EXPOSURE, f64::from(config.exposure)),
                ],
                ..RenderOptions::without_depth()
            },
        );

        let radius = f64::from(config.blur_radius);
        let blur_x = registry.compile_compute(
            device,
            "blur_x",
            shaders::BLUR,
            &ComputeOptions::entry("blur_x").with_constant(shaders::BLUR_RADIUS, radius),
        );
        let blur_y = registry.compile_compute(
            device,
            "blur_y",
            shaders::BLUR,
            &ComputeOptions::entry("blur_y").with_constant(shaders::BLUR_RADIUS, radius),
        );

        Self {
            models,
            composite,
            blur_x,
            blur_y,
        }
    }

    fn post_layouts<'a>(&self, registry: &'a PipelineRegistry) -> PostLayouts<'a> {
        PostLayouts {
            composite: registry.bind_group_layout(self.composite, 0),
            blur_x: registry.compute_bind_group_layout(self.blur_x, 0),
            blur_y: registry.compute_bind_group_layout(self.blur_y, 0),
        }
    }
}

/// Frame uniforms plus the group-0 bind groups that expose one slot each.
struct CameraBindings {
    uniforms: FrameUniformBuffer,
    sampler: wgpu::Sampler,
    cache: BindGroupCache,
}

impl CameraBindings {
    /// Camera bind group for `slot`, built against `pipeline`'s group-0 layout.
    fn group(
        &mut self,
        device: &wgpu::Device,
        registry: &PipelineRegistry,
        pipeline: PipelineId,
        slot: u32,
    ) -> &wgpu::BindGroup {
        let Self {
            uniforms,
            sampler,
            cache,
        } = self;
        cache.get_or_insert_with(camera_key(pipeline, slot), || {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("orrery camera bind group"),
                layout: registry.bind_group_layout(pipeline, 0),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.slot_binding(slot),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            })
        })
    }
}

/// Borrowed state needed to issue entity draws inside one pass.
struct DrawScope<'a> {
    device: &'a wgpu::Device,
    registry: &'a PipelineRegistry,
    camera: &'a mut CameraBindings,
    entities: &'a [Entity],
    stats: &'a mut RenderStats,
}

impl DrawScope<'_> {
    /// Draws every drawable entity except `skip` with the camera in `slot`.
    fn draw_all(&mut self, pass: &mut wgpu::RenderPass<'_>, slot: u32, skip: Option<EntityId>) {
        let entities = self.entities;
        for id in drawn_entities(entities.iter().map(Entity::is_drawable), skip) {
            let entity = &entities[id.index()];
            let pipeline = entity.pipeline();
            pass.set_pipeline(self.registry.render(pipeline).raw());
            pass.set_bind_group(
                0,
                self.camera.group(self.device, self.registry, pipeline, slot),
                &[],
            );
            for (group, bind_group) in entity.bind_groups().iter().enumerate() {
                pass.set_bind_group(1 + group as u32, bind_group, &[]);
            }
            let slab = entity.slab();
            pass.set_vertex_buffer(0, slab.vertex_view.slice());
            pass.set_index_buffer(slab.index_view.slice(), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..entity.index_count(), 0, 0..1);
            self.stats.record_draw(entity.index_count());
        }
    }
}

/// The renderer: owns every pipeline, shared resource and entity, and records
/// one frame per [`Renderer::draw`].
pub struct Renderer {
    config: RendererConfig,
    registry: PipelineRegistry,
    pipelines: Pipelines,
    camera: CameraBindings,
    /// Last primary camera; face cameras copy its frame state.
    primary: CameraUniform,
    sky: OpticalDepthLookup,
    targets: ScreenTargets,
    entities: Vec<Entity>,
    warned_slot_exhaustion: bool,
}

impl Renderer {
    /// Compiles every pipeline, bakes the optical-depth lookup and allocates
    /// screen targets for `ctx.viewport`.
    pub fn new(ctx: &RenderCtx<'_>, config: RendererConfig) -> Result<Self, RenderError> {
        let device = ctx.device;
        config.validate(&device.limits())?;

        let mut registry = PipelineRegistry::new();
        let pipelines = Pipelines::compile(&mut registry, device, ctx.surface_format, &config);

        let optical_depth = registry.compile_compute(
            device,
            "optical_depth",
            shaders::OPTICAL_DEPTH,
            &ComputeOptions::default(),
        );
        let (width, height) = config.optical_depth_size;
        let sky = OpticalDepthLookup::bake(device, ctx.queue, &registry, optical_depth, width, height);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("orrery linear sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let targets = ScreenTargets::new(
            device,
            ctx.viewport,
            &pipelines.post_layouts(&registry),
            &sampler,
        );

        let primary = CameraUniform {
            quality: config.quality.as_u32(),
            ..CameraUniform::new(glam::Mat4::IDENTITY, glam::Vec3::ZERO)
        };

        let (sky_w, sky_h) = sky.size();
        log::info!(
            "renderer ready: {} render pipelines, surface {:?}, {}x{}, sky lookup {sky_w}x{sky_h}",
            registry.render_count(),
            ctx.surface_format,
            ctx.viewport.width,
            ctx.viewport.height
        );

        Ok(Self {
            config,
            registry,
            pipelines,
            camera: CameraBindings {
                uniforms: FrameUniformBuffer::new(device),
                sampler,
                cache: BindGroupCache::new(),
            },
            primary,
            sky,
            targets,
            entities: Vec::new(),
            warned_slot_exhaustion: false,
        })
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.index())
    }

    /// Writes the primary camera into slot 0.
    ///
    /// The sun is placed from `elapsed_secs`; the aspect comes from `ctx.viewport`.
    pub fn set_camera(&mut self, ctx: &RenderCtx<'_>, camera: &dyn CameraView, elapsed_secs: f32) {
        self.primary = CameraUniform {
            view_proj: primary_view_proj(camera, ctx.viewport.aspect()).to_cols_array_2d(),
            position: camera.position().to_array(),
            quality: self.config.quality.as_u32(),
            sun_direction: sun_direction(elapsed_secs).to_array(),
            elapsed: elapsed_secs,
        };
        self.camera.uniforms.write(ctx.queue, PRIMARY_SLOT, &self.primary);
    }

    /// Recreates screen-sized targets and the post-process bind groups.
    pub fn resize(&mut self, device: &wgpu::Device, size: Viewport) {
        if size == self.targets.size() {
            return;
        }
        self.targets = ScreenTargets::new(
            device,
            size,
            &self.pipelines.post_layouts(&self.registry),
            &self.camera.sampler,
        );
    }

    /// Uploads `model` and appends a fully built entity for it.
    pub fn add_model(
        &mut self,
        ctx: &RenderCtx<'_>,
        model: &ModelData,
        variant: ModelVariant,
        transform: Transform,
    ) -> Result<EntityId, RenderError> {
        let slab = ModelSlab::upload(ctx.device, ctx.queue, model)?;
        let pipeline = self.pipelines.models[variant.index()];
        let shared = SharedResources {
            optical_depth: self.sky.view(),
            env_cube_size: self.config.env_cube_size,
        };
        let entity = Entity::new(
            ctx.device,
            self.registry.bind_group_layout(pipeline, 1),
            pipeline,
            variant,
            slab,
            &shared,
            transform,
        );

        let id = EntityId(self.entities.len());
        self.entities.push(entity);
        log::debug!("added {variant} entity #{}", id.index());
        Ok(id)
    }

    /// Turns every finished load into an entity. Returns how many were added.
    pub fn poll_loads(
        &mut self,
        ctx: &RenderCtx<'_>,
        loader: &mut ModelLoader,
    ) -> Result<usize, RenderError> {
        self.admit(ctx, loader.drain())
    }

    /// Adds each loaded model in order. A model the device can't hold is
    /// logged and dropped; only fatal errors stop the batch.
    fn admit(&mut self, ctx: &RenderCtx<'_>, loaded: Vec<LoadedModel>) -> Result<usize, RenderError> {
        let mut added = 0;
        for model in loaded {
            let request = model.request;
            match self.add_model(ctx, &model.data, request.variant, request.transform) {
                Ok(_) => added += 1,
                Err(err) if !err.is_fatal() => {
                    log::warn!("dropping model {}: {err}", request.path.display());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(added)
    }

    /// Records the whole frame into `target.encoder`.
    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> RenderStats {
        self.resize(ctx.device, ctx.viewport);

        for entity in &self.entities {
            entity.update_uniform(ctx.queue);
        }

        let plan = FramePlan::build(
            self.entities
                .iter()
                .enumerate()
                .filter(|(_, e)| e.env_cube().is_some())
                .map(|(i, _)| EntityId(i)),
        );
        if !plan.skipped_bakes().is_empty() && !self.warned_slot_exhaustion {
            log::warn!(
                "uniform slots exhausted: {} environment cubes keep stale contents",
                plan.skipped_bakes().len()
            );
            self.warned_slot_exhaustion = true;
        }

        let mut stats = RenderStats::default();
        let mut scope = DrawScope {
            device: ctx.device,
            registry: &self.registry,
            camera: &mut self.camera,
            entities: &self.entities,
            stats: &mut stats,
        };
        let depth_clear = wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        };
        let color_clear = wgpu::Operations {
            load: wgpu::LoadOp::Clear(self.config.clear_color),
            store: wgpu::StoreOp::Store,
        };

        for pass_kind in plan.passes() {
            match *pass_kind {
                PassKind::Bake { entity, face, slot } => {
                    let owner = &self.entities[entity.index()];
                    let Some(cube) = owner.env_cube() else {
                        continue;
                    };
                    let origin = owner.transform.translation;
                    let camera = self.primary.with_view(face_view_proj(face, origin), origin);
                    scope.camera.uniforms.write(ctx.queue, slot, &camera);

                    let (color_view, depth_view) = cube.face(face);
                    let mut pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("orrery env bake pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: color_view,
                            resolve_target: None,
                            ops: color_clear,
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: depth_view,
                            depth_ops: Some(depth_clear),
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                    scope.draw_all(&mut pass, slot, pass_kind.excluded());
                    scope.stats.render_passes += 1;
                }

                PassKind::Primary { slot } => {
                    let mut pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("orrery primary pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: self.targets.hdr_view(),
                            resolve_target: None,
                            ops: color_clear,
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: self.targets.depth_view(),
                            depth_ops: Some(depth_clear),
                            stencil_ops: None,
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                    scope.draw_all(&mut pass, slot, pass_kind.excluded());
                    scope.stats.render_passes += 1;
                }

                PassKind::BlurX | PassKind::BlurY => {
                    let (pipeline, group, label) = if *pass_kind == PassKind::BlurX {
                        (self.pipelines.blur_x, self.targets.blur_x_group(), "orrery blur x pass")
                    } else {
                        (self.pipelines.blur_y, self.targets.blur_y_group(), "orrery blur y pass")
                    };
                    let mut pass = target.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some(label),
                        timestamp_writes: None,
                    });
                    pass.set_pipeline(self.registry.compute(pipeline).raw());
                    pass.set_bind_group(0, group, &[]);
                    let (x, y) = self.targets.size().workgroups(BLUR_TILE);
                    pass.dispatch_workgroups(x.max(1), y.max(1), 1);
                    scope.stats.compute_passes += 1;
                }

                PassKind::Composite => {
                    let mut pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("orrery composite pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: target.color_view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                    pass.set_pipeline(self.registry.render(self.pipelines.composite).raw());
                    pass.set_bind_group(0, self.targets.composite_group(), &[]);
                    pass.draw(0..3, 0..1);
                    scope.stats.render_passes += 1;
                }
            }
        }

        log::trace!("frame: {stats}");
        stats
    }
}

#[cfg(test)]
mod tests {
    use orrery_asset::{RgbaImage, Vertex};

    use super::*;
    use crate::render::loader::ModelRequest;

    #[test]
    fn default_config() {
        let config = RendererConfig::default();
        assert_eq!(config.quality, Quality::High);
        assert_eq!(config.env_cube_size, 512);
        assert_eq!(config.optical_depth_size, (256, 1024));
        assert_eq!(config.clear_color.r, 0.2);
        assert_eq!(config.clear_color.a, 1.0);
        assert!(config.validate(&wgpu::Limits::default()).is_ok());
    }

    #[test]
    fn oversized_tables_are_rejected() {
        let limits = wgpu::Limits::downlevel_webgl2_defaults();
        let config = RendererConfig {
            optical_depth_size: (256, limits.max_texture_dimension_2d + 1),
            ..RendererConfig::default()
        };
        assert!(matches!(
            config.validate(&limits),
            Err(RenderError::Device(_))
        ));

        let config = RendererConfig {
            env_cube_size: 0,
            ..RendererConfig::default()
        };
        assert!(config.validate(&limits).is_err());
    }

    /// Device on whatever adapter the machine offers; `None` on GPU-less hosts.
    fn headless() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                .ok()?;
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()
    }

    fn small_config() -> RendererConfig {
        RendererConfig {
            env_cube_size: 16,
            optical_depth_size: (16, 16),
            ..RendererConfig::default()
        }
    }

    fn triangle() -> ModelData {
        let vertices = [
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ];
        ModelData {
            indices: Some(vec![0, 1, 2]),
            vertices: Some(bytemuck::cast_slice::<Vertex, u8>(&vertices).to_vec()),
            diffuse: None,
        }
    }

    fn loaded(name: &str, variant: ModelVariant, data: ModelData) -> LoadedModel {
        LoadedModel {
            request: ModelRequest {
                path: name.into(),
                variant,
                transform: Transform::default(),
            },
            data,
        }
    }

    #[test]
    fn oversized_model_is_dropped_alone() {
        let Some((device, queue)) = headless() else {
            eprintln!("no graphics adapter, skipping");
            return;
        };
        let ctx = RenderCtx::new(&device, &queue, wgpu::TextureFormat::Rgba8Unorm, Viewport::new(32, 32));
        let mut renderer = Renderer::new(&ctx, small_config()).unwrap();

        let max = device.limits().max_texture_dimension_2d;
        let oversized = ModelData {
            diffuse: Some(RgbaImage::new(max + 1, 1)),
            ..triangle()
        };
        let batch = vec![
            loaded("big.bin", ModelVariant::General, oversized),
            loaded("good.bin", ModelVariant::General, triangle()),
        ];

        assert_eq!(renderer.admit(&ctx, batch).unwrap(), 1);
        assert_eq!(renderer.entities().len(), 1);
    }

    #[test]
    fn frame_counts_passes_and_draws() {
        let Some((device, queue)) = headless() else {
            eprintln!("no graphics adapter, skipping");
            return;
        };
        let viewport = Viewport::new(32, 32);
        let format = wgpu::TextureFormat::Rgba8Unorm;
        let ctx = RenderCtx::new(&device, &queue, format, viewport);
        let mut renderer = Renderer::new(&ctx, small_config()).unwrap();

        let surface = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test surface"),
            size: wgpu::Extent3d {
                width: viewport.width,
                height: viewport.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = surface.create_view(&wgpu::TextureViewDescriptor::default());

        let frame = |renderer: &mut Renderer| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
            let stats = renderer.draw(&ctx, &mut RenderTarget::new(&mut encoder, &view));
            queue.submit([encoder.finish()]);
            stats
        };

        let empty = frame(&mut renderer);
        assert_eq!((empty.render_passes, empty.compute_passes, empty.draw_calls), (2, 2, 0));

        // Two cube owners, a plain model and an empty sky mesh.
        let batch = vec![
            loaded("mirror.bin", ModelVariant::EnvMapped, triangle()),
            loaded("cube.bin", ModelVariant::EnvDebug, triangle()),
            loaded("ground.bin", ModelVariant::General, triangle()),
            loaded("sky.bin", ModelVariant::Skybox, ModelData::default()),
        ];
        assert_eq!(renderer.admit(&ctx, batch).unwrap(), 4);

        let full = frame(&mut renderer);
        assert_eq!(full.render_passes, 12 + 2);
        assert_eq!(full.compute_passes, 2);
        // Each face draws the two other models, the primary pass all three.
        assert_eq!(full.draw_calls, 12 * 2 + 3);
        assert_eq!(full.indices, 27 * 3);
    }
}
