//! lapse-filelist: write an ffmpeg concat manifest for a folder of frames.
//!
//! Usage:
//!   lapse-filelist <DIRECTORY> [--start N] [--end N] [--skip N ...] [--output PATH]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use lapse_common::config::AppConfig;
use lapse_frame_model::{scan_directory, ConcatManifest, FrameFilter, FramePatterns, DEFAULT_PREFIX};

#[derive(Parser, Debug)]
#[command(
    name = "lapse-filelist",
    about = "Create an ffmpeg concat file list from numbered JPG frames",
    version,
    author
)]
struct Cli {
    /// Folder containing JPG images
    directory: PathBuf,

    /// First frame number to include
    #[arg(long)]
    start: Option<u32>,

    /// Last frame number to include
    #[arg(long)]
    end: Option<u32>,

    /// Output manifest path
    #[arg(long, default_value = "file_list.txt")]
    output: PathBuf,

    /// Frame numbers to leave out
    #[arg(long, num_args = 0..)]
    skip: Vec<u32>,

    /// File name prefix of the frames
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_err) = match AppConfig::try_load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    lapse_common::logging::init_cli_logging(&config.logging, cli.verbose);
    if let Some(e) = config_err {
        tracing::warn!("{e}; using defaults");
    }

    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let patterns = FramePatterns::new(&cli.prefix)
        .with_context(|| format!("Invalid frame prefix '{}'", cli.prefix))?;
    let filter = FrameFilter {
        start: cli.start,
        end: cli.end,
        skip: cli.skip,
    };

    tracing::debug!(
        directory = %cli.directory.display(),
        prefix = patterns.prefix(),
        "Scanning frames"
    );
    let scan = scan_directory(&cli.directory, &patterns, &filter)?;

    println!("Detected filename mode: {}", scan.convention);
    println!("Skipping following file numbers: {:?}", filter.skip);

    let manifest = ConcatManifest::from_frames(&scan.frames);
    manifest.write(&cli.output)?;

    println!(
        "Created {} with {} frames",
        cli.output.display(),
        manifest.len()
    );
    Ok(())
}
