//! Clip concatenation and WAV output.
//!
//! [`WavRenderer`] is the reference [`PlaybackDriver`]: it reads each clip
//! from the audio directory, trims a fixed fraction off both ends, and joins
//! the results into one mono buffer.
//!
//! | Step   | Detail                                                     |
//! |--------|------------------------------------------------------------|
//! | decode | any `hound` format, downmixed to mono `f32` in `[-1, 1]`   |
//! | trim   | `trim_head` of samples from the start, `trim_tail` from the end |
//! | pitch  | resampled by `2^(-semitones/12)` and played at the source rate |
//! | speed  | output sample rate is `source_rate × speed` (pitch shifts too) |
//! | encode | 16-bit PCM                                                 |
//!
//! The pitch step is a plain resample: raising the pitch also shortens the
//! line by the same ratio.

use std::{
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, ensure, Context, Result};
use rubato::{FftFixedIn, Resampler};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{error::Error, segment::AudioHandle};

/// Fastest accepted playback speed.
pub const MAX_SPEED: f32 = 4.0;

pub fn check_speed(speed: f32) -> crate::error::Result<f32> {
    if speed.is_finite() && speed > 0.0 && speed <= MAX_SPEED {
        Ok(speed)
    } else {
        Err(Error::InvalidSpeed(speed))
    }
}

/// Which speaker the recordings are presented as. The clips are recorded by
/// a male speaker; `Female` raises them by four semitones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Male,
    Female,
}

impl Voice {
    pub fn semitones(self) -> f32 {
        match self {
            Voice::Male => 0.0,
            Voice::Female => 4.0,
        }
    }
}

impl FromStr for Voice {
    type Err = Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Voice::Male),
            "female" => Ok(Voice::Female),
            other => Err(Error::InvalidArgument(format!("unknown voice {other:?}, expected male or female"))),
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Voice::Male => "male",
            Voice::Female => "female",
        })
    }
}

/// Anything that can turn a resolved clip list into audio.
pub trait PlaybackDriver {
    fn render(&self, clips: &[AudioHandle], speed: f32) -> Result<Rendered>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendered
// ─────────────────────────────────────────────────────────────────────────────

/// Concatenated mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Rendered {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    fn spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    fn write_samples<W: std::io::Write + std::io::Seek>(&self, writer: &mut hound::WavWriter<W>) -> Result<()> {
        for &s in &self.samples {
            // f32 [-1.0, 1.0] → i16
            let s16 = (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            writer.write_sample(s16).context("WAV write error")?;
        }
        Ok(())
    }

    /// Write a 16-bit PCM WAV file.
    pub fn write_wav(&self, output_path: &Path) -> Result<()> {
        let mut writer = hound::WavWriter::create(output_path, self.spec())
            .with_context(|| format!("Cannot create WAV: {}", output_path.display()))?;
        self.write_samples(&mut writer)?;
        writer.finalize().context("WAV finalise error")?;
        info!(
            samples = self.samples.len(),
            secs = self.duration_secs(),
            path = %output_path.display(),
            "saved WAV"
        );
        Ok(())
    }

    /// The same bytes [`write_wav`](Self::write_wav) would put on disk.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, self.spec()).context("WAV header error")?;
            self.write_samples(&mut writer)?;
            writer.finalize().context("WAV finalise error")?;
        }
        Ok(cursor.into_inner())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WavRenderer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WavRenderer {
    audio_dir: PathBuf,
    trim_head: f32,
    trim_tail: f32,
    pitch_semitones: f32,
}

impl WavRenderer {
    pub fn new(audio_dir: impl Into<PathBuf>) -> Self {
        Self { audio_dir: audio_dir.into(), trim_head: 0.06, trim_tail: 0.25, pitch_semitones: 0.0 }
    }

    pub fn with_trim(mut self, head: f32, tail: f32) -> Self {
        self.trim_head = head;
        self.trim_tail = tail;
        self
    }

    pub fn with_pitch(mut self, semitones: f32) -> Self {
        self.pitch_semitones = semitones;
        self
    }

    pub fn with_voice(self, voice: Voice) -> Self {
        self.with_pitch(voice.semitones())
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Decode one clip to mono samples plus its sample rate.
    fn load_clip(&self, clip: &AudioHandle) -> Result<(Vec<f32>, u32)> {
        let path = self.audio_dir.join(clip.file_name());
        let reader = hound::WavReader::open(&path)
            .with_context(|| format!("Cannot open clip: {}", path.display()))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("Corrupt clip: {}", path.display()))?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .with_context(|| format!("Corrupt clip: {}", path.display()))?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let mono = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };
        Ok((mono, spec.sample_rate))
    }

    /// Keep the middle of `samples`, dropping the configured fractions.
    fn trim<'a>(&self, samples: &'a [f32]) -> &'a [f32] {
        let len = samples.len();
        let head = (len as f32 * self.trim_head) as usize;
        let tail = (len as f32 * self.trim_tail) as usize;
        if head + tail >= len {
            return &[];
        }
        &samples[head..len - tail]
    }
}

impl PlaybackDriver for WavRenderer {
    fn render(&self, clips: &[AudioHandle], speed: f32) -> Result<Rendered> {
        let speed = check_speed(speed)?;
        if clips.is_empty() {
            bail!("Nothing to render: the clip list is empty");
        }

        let mut samples = Vec::new();
        let mut source_rate = None;
        for clip in clips {
            let (audio, rate) = self.load_clip(clip)?;
            match source_rate {
                None => source_rate = Some(rate),
                Some(first) => ensure!(
                    first == rate,
                    "Clip {} is {} Hz but earlier clips are {} Hz",
                    clip,
                    rate,
                    first
                ),
            }
            let kept = self.trim(&audio);
            debug!(%clip, total = audio.len(), kept = kept.len(), "appending clip");
            samples.extend_from_slice(kept);
        }

        let source_rate = source_rate.unwrap_or_default();
        let samples = shift_pitch(samples, source_rate, self.pitch_semitones)?;
        let sample_rate = (source_rate as f32 * speed).round() as u32;
        Ok(Rendered { samples, sample_rate })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pitch
// ─────────────────────────────────────────────────────────────────────────────

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resample `samples` so that, played back at `sample_rate`, they sound
/// `semitones` higher. The output is `2^(semitones/12)` times shorter.
fn shift_pitch(samples: Vec<f32>, sample_rate: u32, semitones: f32) -> Result<Vec<f32>> {
    if semitones == 0.0 || samples.is_empty() {
        return Ok(samples);
    }
    ensure!(semitones.is_finite(), "Pitch shift must be finite, got {semitones}");

    let ratio = 2f64.powf(f64::from(semitones) / 12.0);
    let target_rate = ((f64::from(sample_rate) / ratio).round() as usize).max(1);
    let mut resampler = FftFixedIn::<f32>::new(sample_rate as usize, target_rate, CHUNK, SUB_CHUNKS, 1)
        .with_context(|| format!("Cannot resample {sample_rate} Hz to {target_rate} Hz"))?;

    let expected = (samples.len() as f64 * target_rate as f64 / f64::from(sample_rate)).ceil() as usize;
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(expected + delay + CHUNK);

    // Zero chunks past the end flush the resampler's delay line.
    let mut chunk = vec![0.0f32; CHUNK];
    let mut pos = 0;
    while out.len() < expected + delay {
        let end = (pos + CHUNK).min(samples.len());
        chunk.fill(0.0);
        chunk[..end - pos].copy_from_slice(&samples[pos..end]);
        pos = end;

        let frames = resampler.process(&[&chunk], None).context("Pitch resampling failed")?;
        out.extend_from_slice(&frames[0]);
    }

    out.drain(..delay);
    out.truncate(expected);
    debug!(semitones, from = samples.len(), to = out.len(), "pitch shifted");
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
