//! Scene manifest: a JSON list of models to load.
//!
//! ```json
//! [
//!   { "path": "sphere.bin", "variant": "env_mapped", "translation": [0, 0, 1] },
//!   { "path": "sky.bin", "variant": "skybox", "scale": [500, 500, 500] }
//! ]
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use glam::Vec3;
use orrery_engine::render::{ModelRequest, ModelVariant, Transform};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub path: PathBuf,
    #[serde(deserialize_with = "variant_by_name", default = "default_variant")]
    pub variant: ModelVariant,
    #[serde(default)]
    pub translation: [f32; 3],
    /// Euler degrees, X then Y then Z.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

fn default_variant() -> ModelVariant {
    ModelVariant::General
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

fn variant_by_name<'de, D>(deserializer: D) -> Result<ModelVariant, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl ModelEntry {
    pub fn transform(&self) -> Transform {
        Transform {
            translation: Vec3::from_array(self.translation),
            rotation_deg: Vec3::from_array(self.rotation),
            scale: Vec3::from_array(self.scale),
        }
    }

    pub fn to_request(&self, base: &Path) -> ModelRequest {
        ModelRequest {
            path: base.join(&self.path),
            variant: self.variant,
            transform: self.transform(),
        }
    }
}

pub fn parse(json: &str) -> serde_json::Result<Vec<ModelEntry>> {
    serde_json::from_str(json)
}

/// Reads a manifest file and turns it into load requests.
pub fn load(path: &Path) -> anyhow::Result<Vec<ModelRequest>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read scene manifest '{}'", path.display()))?;
    let entries =
        parse(&json).with_context(|| format!("parse scene manifest '{}'", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(entries.iter().map(|e| e.to_request(base)).collect())
}
