use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use anaglyph_converter::{AnaglyphConverter, ColorBlindnessMode, Config};

#[derive(Parser)]
#[command(
    name = "anaglyph-converter",
    version,
    about = "Convert 2D videos into anaglyph 3D videos",
    long_about = "Anaglyph-Converter synthesizes left and right viewpoints from every frame of a 2D video, recombines them into a red/cyan anaglyph (optionally tuned for color blindness), and re-attaches the original audio."
)]
struct Cli {
    /// Input video file
    #[arg(required_unless_present = "list_modes")]
    input: Option<PathBuf>,

    /// Color blindness mode (standard, protanopia, deuteranopia, tritanopia)
    #[arg(short, long, default_value = "standard")]
    mode: String,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the stereo shift in pixels
    #[arg(long)]
    shift: Option<u32>,

    /// Override the number of worker threads
    #[arg(short, long)]
    threads: Option<usize>,

    /// List the available modes and exit
    #[arg(long)]
    list_modes: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if cli.list_modes {
        for mode in ColorBlindnessMode::ALL {
            println!("{:<14} {}", mode.name(), mode.description());
        }
        return Ok(());
    }

    // Reject bad modes before anything touches the input
    let mode: ColorBlindnessMode = cli.mode.parse()?;

    let input = cli.input.context("an input video is required")?;

    info!("Starting Anaglyph-Converter v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {:?}", input);
    info!("Mode: {}", mode);

    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => Config::default(),
    };

    if let Some(shift) = cli.shift {
        config.stereo.shift = shift;
    }
    if let Some(threads) = cli.threads {
        config.processing.threads = threads;
    }

    let converter = AnaglyphConverter::new(config)?;
    if !converter.check_ffmpeg_available() {
        warn!("ffmpeg/ffprobe could not be run; install FFmpeg and make sure it is on your PATH");
    }

    match converter.convert(&input, mode).await {
        Ok(report) => {
            info!(
                "Done: {} frames at {}x{} -> {:?}",
                report.frames_written, report.metadata.width, report.metadata.height, report.output_path
            );
            Ok(())
        }
        Err(e) => {
            error!("{}", e.user_message());
            Err(e.into())
        }
    }
}
