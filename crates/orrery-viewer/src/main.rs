mod app;
mod camera;
mod cli;
mod demo;
mod manifest;

use clap::Parser;
use orrery_engine::device::GpuInit;
use orrery_engine::logging::init_logging;
use orrery_engine::window::Runtime;

use crate::app::Viewer;
use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logging_config());

    let requests = match cli.scene.as_deref() {
        Some(path) if !cli.demo => manifest::load(path)?,
        _ => demo::write_scene(&demo::default_dir())?,
    };
    log::info!("{} models requested", requests.len());

    let viewer = Viewer::new(cli.title.clone(), cli.renderer_config(), requests)?;
    Runtime::run(cli.runtime_config(), GpuInit::default(), viewer)
}
