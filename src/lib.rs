//! # dangme-tts
//!
//! Concatenative text-to-speech for Dãngme: numbers and words are broken into
//! pre-recorded segments, and the segments are joined into one waveform.
//!
//! ## Quick start
//!
//! ```no_run
//! use dangme_tts::{EngineConfig, Speaker};
//!
//! let speaker = Speaker::from_config(&EngineConfig::default()).unwrap();
//!
//! // Segment keys for a mixed line ("ba" then twenty-three)
//! let plan = speaker.plan("ba23").unwrap();
//! println!("{:?}", plan.segments);
//!
//! // Join the recorded clips into a WAV file
//! let audio = speaker.render(&plan, None).unwrap();
//! audio.write_wav(std::path::Path::new("output.wav")).unwrap();
//! ```
//!
//! Numbers alone go through [`decompose`]:
//!
//! ```
//! let keys = dangme_tts::decompose(14).unwrap();
//! let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
//! assert_eq!(keys, ["10", "KƐ", "4"]);
//! ```
//!
//! ## Pipeline
//! 1. **Run splitting** — the line is cut into maximal digit / non-digit runs.
//! 2. **Numerals** — digit runs become segment keys via the exception table
//!    and the Dãngme counting grammar.
//! 3. **Words** — other runs are segmented by greedy longest match against
//!    the catalog; unknown characters are skipped and reported.
//! 4. **Resolution** — every key is mapped to its clip, or the call fails.
//! 5. **Rendering** — clips are trimmed, concatenated, optionally pitched up
//!    for the female voice, and written as 16-bit PCM at `source_rate × speed`.

pub mod catalog;
pub mod config;
pub mod error;
pub mod exceptions;
pub mod numeral;
pub mod render;
pub mod segment;
pub mod speaker;
pub mod tokenize;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use catalog::SegmentCatalog;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use exceptions::{ExceptionEntry, ExceptionTable};
pub use numeral::{decompose, DecomposerOptions, NumeralDecomposer};
pub use render::{PlaybackDriver, Rendered, Voice, WavRenderer};
pub use segment::{AudioHandle, SegmentKey};
pub use speaker::{Speaker, SpeechPlan};
pub use tokenize::{Tokenized, UnmatchedSpan};
