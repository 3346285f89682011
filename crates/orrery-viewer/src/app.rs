use anyhow::Result;
use orrery_engine::core::{App, AppControl, FrameCtx};
use orrery_engine::render::{ModelLoader, ModelRequest, Renderer, RendererConfig};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use crate::camera::OrbitCamera;

/// Drives the renderer from the window runtime.
///
/// The renderer is created on the first frame, once a device and a drawable
/// size exist.
pub struct Viewer {
    title: String,
    config: RendererConfig,
    renderer: Option<Renderer>,
    loader: ModelLoader,
    camera: OrbitCamera,
    shown: usize,
}

impl Viewer {
    /// Starts loading every request in the background.
    pub fn new(title: String, config: RendererConfig, requests: Vec<ModelRequest>) -> Result<Self> {
        let mut loader = ModelLoader::new();
        for request in requests {
            loader.request(request)?;
        }
        Ok(Self {
            title,
            config,
            renderer: None,
            loader,
            camera: OrbitCamera::default(),
            shown: 0,
        })
    }
}

fn is_escape(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::KeyboardInput {
            event: KeyEvent {
                logical_key: Key::Named(NamedKey::Escape),
                state: ElementState::Pressed,
                ..
            },
            ..
        }
    )
}

impl App for Viewer {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if is_escape(event) {
            log::info!("escape pressed, closing");
            return AppControl::Exit;
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<AppControl> {
        let elapsed = ctx.time.elapsed;

        {
            let rctx = ctx.render_ctx();
            if !rctx.viewport.is_valid() {
                return Ok(AppControl::Continue);
            }
            if self.renderer.is_none() {
                self.renderer = Some(Renderer::new(&rctx, self.config.clone())?);
            }
            let Some(renderer) = self.renderer.as_mut() else {
                return Ok(AppControl::Continue);
            };

            renderer.poll_loads(&rctx, &mut self.loader)?;
            self.camera.update(elapsed);
            renderer.set_camera(&rctx, &self.camera, elapsed);
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(AppControl::Continue);
        };
        let count = renderer.entities().len();
        if count != self.shown {
            self.shown = count;
            ctx.window.set_title(&format!("{} ({count} models)", self.title));
        }

        ctx.render(|rctx, target| {
            renderer.draw(rctx, target);
            Ok(())
        })
    }
}
