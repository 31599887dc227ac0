//! Basic example — prints segment plans and, when clips are available,
//! renders one line to a WAV file.
//!
//! Usage:
//!   cargo run --example basic
//!   cargo run --example basic -- --audio-dir ./audio --text "ba 1001" --output output.wav
//!
//! Without `--audio-dir` only the plans are printed.

use std::path::{Path, PathBuf};

use dangme_tts::{decompose, EngineConfig, Speaker};

fn main() -> anyhow::Result<()> {
    // ── Parse simple CLI arguments ───────────────────────────────────────────
    let mut args = std::env::args().skip(1);

    let mut audio_dir: Option<PathBuf> = None;
    let mut text   = "dãngme 23".to_string();
    let mut output = "output.wav".to_string();
    let mut speed  = 1.0f32;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--audio-dir" => { if let Some(v) = args.next() { audio_dir = Some(v.into()); } }
            "--text"      => { if let Some(v) = args.next() { text      = v; } }
            "--output"    => { if let Some(v) = args.next() { output    = v; } }
            "--speed"     => { if let Some(v) = args.next() { speed     = v.parse().unwrap_or(1.0); } }
            "--help"      => {
                println!("Usage: basic [--audio-dir DIR] [--text TEXT] [--output FILE] [--speed FLOAT]");
                return Ok(());
            }
            _ => {}
        }
    }

    // ── Numbers on their own ─────────────────────────────────────────────────
    for n in [14, 23, 100, 1001, 4_000_000, 1_000_000_000_000] {
        let keys: Vec<String> = decompose(n)?.iter().map(ToString::to_string).collect();
        println!("{n:>16} → {}", keys.join(" "));
    }
    println!();

    // ── Mixed text ───────────────────────────────────────────────────────────
    let config = EngineConfig {
        audio_dir: audio_dir.clone().unwrap_or_else(|| PathBuf::from("audio")),
        ..EngineConfig::default()
    };
    let speaker = Speaker::from_config(&config)?;
    let plan = speaker.plan(&text)?;

    println!("Text     : {:?}", text);
    println!("Segments : {:?}", plan.segments);
    println!("Clips    : {:?}", plan.clips);
    if !plan.unmatched.is_empty() {
        println!("Skipped  : {:?}", plan.unmatched);
    }

    // ── Render ───────────────────────────────────────────────────────────────
    if audio_dir.is_some() {
        let audio = speaker.render(&plan, Some(speed))?;
        audio.write_wav(Path::new(&output))?;
        println!("Saved {:.2} s to {}", audio.duration_secs(), output);
    }
    Ok(())
}
