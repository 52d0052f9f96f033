use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use quake_detector::config::{AppConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(
    name = "quake_server",
    about = "HTTP service returning earthquake verdicts for uploaded waveforms"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Listen address, overriding the config file
    #[arg(long)]
    addr: Option<SocketAddr>,
    /// Model artifact directory, overriding the config file
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    quake_detector::init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("quake_server failed: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from_file(&cli.config).with_overrides(cli.addr, cli.model_dir);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(quake_detector::http::serve(config))
}
