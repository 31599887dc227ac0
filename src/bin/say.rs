//! Interactive console front end.
//!
//! Reads one line at a time from stdin, prints the segment plan, and writes
//! the rendered audio to `--output`. Type `q` to quit.
//!
//! Usage:
//!   cargo run --features cli --bin dangme-say
//!   cargo run --features cli --bin dangme-say -- --config dangme.json --speed 1.2 --voice female --output line.wav

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use dangme_tts::{EngineConfig, Speaker, Voice};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dangme-say", about = "Speak Dãngme numbers and words from recorded segments")]
struct Args {
    /// Engine config file (JSON). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Playback speed in (0, 4]; overrides the config's default_speed.
    #[arg(long)]
    speed: Option<f32>,

    /// `male` or `female`; overrides the config's voice.
    #[arg(long)]
    voice: Option<Voice>,

    /// Where each rendered line is written.
    #[arg(long, default_value = "output.wav")]
    output: PathBuf,

    /// Print segment plans without rendering audio.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("Cannot load config: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let speaker = Speaker::from_config(&config).context("Failed to build speaker")?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("Enter text or a number (q to quit): ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        // Bad input is reported and the loop goes on.
        let plan = match speaker.plan(line) {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("error: {e}");
                continue;
            }
        };

        let keys: Vec<&str> = plan.segments.iter().map(|k| k.as_str()).collect();
        println!("Segments : {}", keys.join(" "));
        for span in &plan.unmatched {
            println!("Skipped  : {:?} at {}..{}", span.text, span.start, span.end);
        }
        if args.dry_run || plan.clips.is_empty() {
            continue;
        }

        match speaker.render_voice(&plan, args.speed, args.voice).and_then(|audio| audio.write_wav(&args.output)) {
            Ok(()) => println!("Saved    : {}", args.output.display()),
            Err(e) => eprintln!("error: {e:#}"),
        }
    }
    Ok(())
}
