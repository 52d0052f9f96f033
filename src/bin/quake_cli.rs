use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quake_detector::fixtures::{self, EventSpec};
use quake_detector::model::{default_registry, ArtifactManifest, PredictorHandle};
use quake_detector::preprocess::REFERENCE_SAMPLE_RATE;
use quake_detector::{decode_wav, preprocess, ErrorCode, InferenceContext};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "quake_cli",
    about = "Offline harness for the earthquake inference pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline on a WAV file and print the verdict as JSON
    Predict {
        #[arg(long)]
        model_dir: PathBuf,
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the spectrogram shape and per-channel statistics
    Spectrogram {
        #[arg(long)]
        input: PathBuf,
    },
    /// Write a seeded synthetic recording at the reference rate
    Synth {
        #[arg(long)]
        output: PathBuf,
        /// Add P and S arrivals at 12 s and 21 s
        #[arg(long)]
        event: bool,
        #[arg(long, default_value_t = 60)]
        seconds: u32,
        #[arg(long, default_value_t = 3)]
        channels: usize,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
    /// Validate an artifact directory and report whether it loads
    Inspect {
        #[arg(long)]
        model_dir: PathBuf,
    },
}

#[derive(Serialize)]
struct ChannelStats {
    channel: usize,
    min: f32,
    max: f32,
    mean: f32,
}

#[derive(Serialize)]
struct SpectrogramReport {
    shape: [usize; 4],
    source_width: usize,
    padded_columns: usize,
    channels: Vec<ChannelStats>,
}

fn main() -> ExitCode {
    quake_detector::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Predict { model_dir, input } => run_predict(&model_dir, &input),
        Commands::Spectrogram { input } => run_spectrogram(&input),
        Commands::Synth {
            output,
            event,
            seconds,
            channels,
            seed,
        } => run_synth(&output, event, seconds, channels, seed),
        Commands::Inspect { model_dir } => run_inspect(&model_dir),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn run_predict(model_dir: &Path, input: &Path) -> Result<ExitCode> {
    let context = InferenceContext::new(PredictorHandle::load(model_dir, default_registry()));
    let bytes = read_input(input)?;

    match context.predict_bytes(&bytes) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!(
                "{}",
                serde_json::json!({ "error": err.message(), "code": err.code() })
            );
            Ok(ExitCode::from(1))
        }
    }
}

fn run_spectrogram(input: &Path) -> Result<ExitCode> {
    let waveform = decode_wav(&read_input(input)?)?;
    if waveform.sample_rate() != REFERENCE_SAMPLE_RATE {
        eprintln!(
            "warning: {} Hz recording, the service only accepts {} Hz",
            waveform.sample_rate(),
            REFERENCE_SAMPLE_RATE
        );
    }
    let spectrogram = preprocess(&waveform)?;

    let channels = (0..spectrogram.shape()[3])
        .map(|index| {
            let view = spectrogram.channel(index);
            let min = view.iter().copied().fold(f32::INFINITY, f32::min);
            let max = view.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mean = view.iter().sum::<f32>() / view.len() as f32;
            ChannelStats {
                channel: index,
                min,
                max,
                mean,
            }
        })
        .collect();

    let report = SpectrogramReport {
        shape: spectrogram.shape(),
        source_width: spectrogram.source_width(),
        padded_columns: spectrogram.padded_columns(),
        channels,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn run_synth(
    output: &Path,
    event: bool,
    seconds: u32,
    channels: usize,
    seed: u64,
) -> Result<ExitCode> {
    let frames = seconds as usize * REFERENCE_SAMPLE_RATE as usize;
    let event = event.then(EventSpec::default);
    let waveform = fixtures::synthetic_recording(frames, channels, seed, event);
    let bytes = fixtures::encode_wav(&waveform).context("encoding synthetic recording")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    println!(
        "wrote {} ({} frames x {} channels)",
        output.display(),
        waveform.frames(),
        waveform.channels()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_inspect(model_dir: &Path) -> Result<ExitCode> {
    let manifest = ArtifactManifest::read(model_dir)?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);

    let handle = PredictorHandle::load(model_dir, default_registry());
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({ "status": handle.status() }))?
    );
    Ok(if handle.is_ready() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
