//! Engine configuration.
//!
//! Every field is optional in the JSON file; missing fields take the values
//! of [`EngineConfig::default`]. Relative paths in a config file are resolved
//! against the directory holding that file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{Error, Result},
    numeral::{DecomposerOptions, DEFAULT_CEILING},
    render::{Voice, MAX_SPEED},
};

/// Deserialised engine `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the recorded clips.
    pub audio_dir: PathBuf,

    /// Optional catalog file (`{ "<key>": "<clip>" }`). The built-in Dãngme
    /// catalog is used when absent.
    pub catalog: Option<PathBuf>,

    /// Optional exception file (`[{ "value", "segments" }]`). The built-in
    /// table is used when absent.
    pub exceptions: Option<PathBuf>,

    /// Exclusive upper bound on numbers the decomposer accepts.
    pub max_magnitude: u64,

    /// Insert the linking vowel `E` between `KƐ` and `NYÃ`.
    pub linking_vowel: bool,

    /// Lowercase input lines before tokenizing.
    pub lowercase: bool,

    pub default_speed: f32,

    /// `"male"` plays the clips as recorded, `"female"` pitches them up.
    pub voice: Voice,

    /// Fraction of each clip dropped from the start.
    pub trim_head: f32,

    /// Fraction of each clip dropped from the end.
    pub trim_tail: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audio_dir: PathBuf::from("audio"),
            catalog: None,
            exceptions: None,
            max_magnitude: DEFAULT_CEILING,
            linking_vowel: false,
            lowercase: true,
            default_speed: 1.0,
            voice: Voice::Male,
            trim_head: 0.06,
            trim_tail: 0.25,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` and anchor its relative paths to the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&json)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        info!(path = %path.display(), audio_dir = %config.audio_dir.display(), "loaded engine config");
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        anchor(&mut self.audio_dir);
        if let Some(p) = self.catalog.as_mut() {
            anchor(p);
        }
        if let Some(p) = self.exceptions.as_mut() {
            anchor(p);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_magnitude == 0 {
            return Err(Error::Config("max_magnitude must be positive".into()));
        }
        let fraction = 0.0f32..1.0;
        if !fraction.contains(&self.trim_head) || !fraction.contains(&self.trim_tail) {
            return Err(Error::Config(format!(
                "trim fractions must be in [0, 1), got head {} tail {}",
                self.trim_head, self.trim_tail
            )));
        }
        if self.trim_head + self.trim_tail >= 1.0 {
            return Err(Error::Config("trim_head + trim_tail would drop every sample".into()));
        }
        if !(self.default_speed.is_finite() && self.default_speed > 0.0 && self.default_speed <= MAX_SPEED) {
            return Err(Error::InvalidSpeed(self.default_speed));
        }
        Ok(())
    }

    pub fn decomposer_options(&self) -> DecomposerOptions {
        DecomposerOptions { ceiling: self.max_magnitude, linking_vowel: self.linking_vowel }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
