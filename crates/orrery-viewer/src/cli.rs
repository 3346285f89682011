use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use orrery_engine::logging::LoggingConfig;
use orrery_engine::render::{Quality, RendererConfig};
use orrery_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

#[derive(Parser, Debug)]
#[command(name = "orrery", version, about = "Real-time viewer for orrery model scenes")]
pub struct Cli {
    /// Scene manifest (JSON list of models).
    #[arg(long, conflicts_with = "demo")]
    pub scene: Option<PathBuf>,

    /// Generate and show the built-in demo scene (default without --scene).
    #[arg(long, default_value_t = false)]
    pub demo: bool,

    /// Window title.
    #[arg(long, default_value = "orrery")]
    pub title: String,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Log filter, env_logger syntax. Overrides RUST_LOG.
    #[arg(long)]
    pub log: Option<String>,

    /// Shading quality.
    #[arg(long, value_enum, default_value_t = QualityArg::High)]
    pub quality: QualityArg,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum QualityArg {
    Low,
    High,
}

impl From<QualityArg> for Quality {
    fn from(q: QualityArg) -> Self {
        match q {
            QualityArg::Low => Quality::Low,
            QualityArg::High => Quality::High,
        }
    }
}

impl Cli {
    pub fn logging_config(&self) -> LoggingConfig {
        match &self.log {
            Some(filter) => LoggingConfig::with_filter(filter.as_str()),
            None => LoggingConfig::default(),
        }
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(f64::from(self.width), f64::from(self.height)),
        }
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            quality: self.quality.into(),
            ..RendererConfig::default()
        }
    }
}
