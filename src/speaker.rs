//! [`Speaker`] — the catalog, exception table and renderer bundled behind one
//! handle.
//!
//! Everything inside is immutable after construction, so a `Speaker` can be
//! shared across threads behind an `Arc` and used for any number of
//! concurrent requests.

use std::borrow::Cow;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    catalog::SegmentCatalog,
    config::EngineConfig,
    error::Result,
    exceptions::ExceptionTable,
    numeral::NumeralDecomposer,
    render::{check_speed, PlaybackDriver, Rendered, Voice, WavRenderer},
    segment::{AudioHandle, SegmentKey},
    tokenize::{self, Tokenized, UnmatchedSpan},
};

/// A fully resolved line: what will be said, which clips say it, and which
/// parts of the input were skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechPlan {
    pub segments: Vec<SegmentKey>,
    pub clips: Vec<AudioHandle>,
    pub unmatched: Vec<UnmatchedSpan>,
}

pub struct Speaker {
    catalog: SegmentCatalog,
    exceptions: ExceptionTable,
    config: EngineConfig,
    renderer: WavRenderer,
}

impl Speaker {
    pub fn new(catalog: SegmentCatalog, exceptions: ExceptionTable, config: EngineConfig) -> Self {
        let missing = catalog.missing_reserved();
        if !missing.is_empty() {
            warn!(?missing, "catalog lacks numeral keys; some numbers will fail to resolve");
        }
        let renderer = WavRenderer::new(&config.audio_dir)
            .with_trim(config.trim_head, config.trim_tail)
            .with_voice(config.voice);
        Self { catalog, exceptions, config, renderer }
    }

    /// Build from a config, loading the catalog and exception files it names
    /// and falling back to the built-in Dãngme data otherwise.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let catalog = match &config.catalog {
            Some(path) => SegmentCatalog::from_json_file(path)?,
            None => SegmentCatalog::dangme(),
        };
        let exceptions = match &config.exceptions {
            Some(path) => ExceptionTable::from_json_file(path)?,
            None => ExceptionTable::dangme(config.linking_vowel),
        };
        info!(segments = catalog.len(), exceptions = exceptions.len(), "speaker ready");
        Ok(Self::new(catalog, exceptions, config.clone()))
    }

    pub fn catalog(&self) -> &SegmentCatalog {
        &self.catalog
    }

    pub fn exceptions(&self) -> &ExceptionTable {
        &self.exceptions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn numerals(&self) -> NumeralDecomposer<'_> {
        NumeralDecomposer::new(&self.exceptions, self.config.decomposer_options())
    }

    // ── Text → segment keys ───────────────────────────────────────────────────

    pub fn decompose(&self, n: u64) -> Result<Vec<SegmentKey>> {
        self.numerals().decompose(n)
    }

    pub fn decompose_signed(&self, n: i64) -> Result<Vec<SegmentKey>> {
        self.numerals().decompose_signed(n)
    }

    /// Tokenize one word. Lowercased first when `lowercase` is on, like
    /// [`process`](Self::process).
    pub fn tokenize(&self, word: &str) -> Tokenized {
        tokenize::tokenize_word(&self.normalize(word), &self.catalog)
    }

    /// Tokenize a mixed line. With `lowercase` on, unmatched span offsets
    /// refer to the lowercased line.
    pub fn process(&self, line: &str) -> Result<Tokenized> {
        let line = self.normalize(line);
        tokenize::process(&line, &self.catalog, &self.numerals())
    }

    fn normalize<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if self.config.lowercase {
            Cow::Owned(line.to_lowercase())
        } else {
            Cow::Borrowed(line)
        }
    }

    // ── Segment keys → clips → audio ──────────────────────────────────────────

    pub fn resolve(&self, keys: &[SegmentKey]) -> Result<Vec<AudioHandle>> {
        self.catalog.resolve(keys)
    }

    /// [`process`](Self::process) then [`resolve`](Self::resolve).
    pub fn plan(&self, line: &str) -> Result<SpeechPlan> {
        let Tokenized { keys, unmatched } = self.process(line)?;
        let clips = self.resolve(&keys)?;
        Ok(SpeechPlan { segments: keys, clips, unmatched })
    }

    /// Render a plan in the configured voice; `speed` defaults to the
    /// configured speed.
    pub fn render(&self, plan: &SpeechPlan, speed: Option<f32>) -> anyhow::Result<Rendered> {
        self.render_voice(plan, speed, None)
    }

    /// Like [`render`](Self::render), with the voice chosen per call.
    pub fn render_voice(&self, plan: &SpeechPlan, speed: Option<f32>, voice: Option<Voice>) -> anyhow::Result<Rendered> {
        let speed = check_speed(speed.unwrap_or(self.config.default_speed))?;
        match voice {
            Some(voice) if voice != self.config.voice => {
                self.render_with(&self.renderer.clone().with_voice(voice), plan, speed)
            }
            _ => self.render_with(&self.renderer, plan, speed),
        }
    }

    pub fn render_with(&self, driver: &dyn PlaybackDriver, plan: &SpeechPlan, speed: f32) -> anyhow::Result<Rendered> {
        driver.render(&plan.clips, speed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
