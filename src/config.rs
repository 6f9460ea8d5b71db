//! Rendering configuration, read from YAML.
//!
//! ```yaml
//! velocity: 80
//! ticks-per-quarter: 960
//! bpm: 72
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RenderConfig {
    /// Note-on velocity, clamped to 1..=127 when rendering.
    pub velocity: u8,
    /// Metrical resolution of the written MIDI file.
    pub ticks_per_quarter: u16,
    /// Quarter-note tempo overriding the score's own tempo.
    pub bpm: Option<f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            velocity: 50,
            ticks_per_quarter: 480,
            bpm: None,
        }
    }
}

impl RenderConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}
