//! lapse-render: render a timelapse video from a concat manifest.
//!
//! Usage:
//!   lapse-render <FILELIST> [--resolution 4k] [--look aurora] [--slowdown 1.5] ...
//!   lapse-render <FILELIST> --dry-run     Print the ffmpeg command only

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use lapse_common::config::AppConfig;
use lapse_render_engine::{
    AspectMode, ColorOverrides, CropBias, EncodeProgress, FfmpegBackend, LookPreset, Orientation,
    ProgressCallback, RenderJob, RenderOptions, RenderPlan, Resolution, WatermarkAlpha,
    WatermarkOptions, WatermarkPosition, WatermarkSize,
};

#[derive(Parser, Debug)]
#[command(
    name = "lapse-render",
    about = "Render a timelapse video from an ffmpeg concat file list",
    version,
    author
)]
struct Cli {
    /// FFmpeg concat file list (.txt)
    filelist: PathBuf,

    /// Base output name (default: file list name)
    #[arg(long)]
    name: Option<String>,

    /// Output directory [config default: Timelapses]
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Output orientation: landscape (16:9) or vertical (9:16)
    #[arg(long, default_value = "landscape")]
    orientation: Orientation,

    /// Output resolution: 1080p, 2160p, HD or 4k
    #[arg(long, default_value = "1080p")]
    resolution: Resolution,

    /// How to fit the source into the frame: auto, scale, crop or pad
    #[arg(long, default_value = "auto")]
    aspect_mode: AspectMode,

    /// Vertical anchor when cropping: upper, center or lower
    #[arg(long, default_value = "center")]
    crop_bias: CropBias,

    /// Burn frame number and file name into the video
    #[arg(long)]
    debug_overlay: bool,

    /// Output frame rate [config default: 24]
    #[arg(long)]
    fps: Option<u32>,

    /// Playback slowdown factor (1.5 plays 50% slower)
    #[arg(long, default_value = "1.0")]
    slowdown: f64,

    /// Path to watermark PNG
    #[arg(long)]
    watermark: Option<PathBuf>,

    /// Watermark position: top-left, top-right, bottom-left, bottom-right, center, center-bottom
    #[arg(long, default_value = "bottom-left")]
    wm_position: WatermarkPosition,

    /// Watermark size: small, default, large, or a fraction of the short side
    #[arg(long, default_value = "default")]
    wm_size: WatermarkSize,

    /// Watermark opacity: weak, default, strong, or a number in [0, 1]
    #[arg(long, default_value = "default")]
    wm_alpha: WatermarkAlpha,

    /// Color look preset: milkyway, aurora or aurora-boosted
    #[arg(long)]
    look: Option<LookPreset>,

    /// Gamma (overrides the look)
    #[arg(long)]
    gamma: Option<f64>,

    /// Contrast (overrides the look)
    #[arg(long)]
    contrast: Option<f64>,

    /// Saturation (overrides the look)
    #[arg(long)]
    saturation: Option<f64>,

    /// Unsharp amount for micro-contrast, 0 disables (overrides the look)
    #[arg(long)]
    clarity: Option<f64>,

    /// Play forward then backward
    #[arg(long)]
    boomerang: bool,

    /// Prefix the output name with the first frame's EXIF capture date
    #[arg(long)]
    use_exif_date: bool,

    /// x264 constant rate factor [config default: 20]
    #[arg(long)]
    crf: Option<u32>,

    /// x264 preset [config default: slow]
    #[arg(long)]
    preset: Option<String>,

    /// Print the ffmpeg command without executing it
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_job(self, config: &AppConfig) -> (RenderJob, bool) {
        let defaults = &config.render;

        let watermark = self.watermark.map(|path| WatermarkOptions {
            position: self.wm_position,
            size: self.wm_size,
            alpha: self.wm_alpha,
            ..WatermarkOptions::new(path)
        });

        let options = RenderOptions {
            resolution: self.resolution,
            orientation: self.orientation,
            aspect_mode: self.aspect_mode,
            crop_bias: self.crop_bias,
            fps: self.fps.unwrap_or(defaults.fps),
            slowdown: self.slowdown,
            look: self.look,
            colors: ColorOverrides {
                gamma: self.gamma,
                contrast: self.contrast,
                saturation: self.saturation,
                clarity: self.clarity,
            },
            watermark,
            boomerang: self.boomerang,
            debug_overlay: self.debug_overlay,
            crf: self.crf.unwrap_or(defaults.crf),
            preset: self.preset.unwrap_or_else(|| defaults.preset.clone()),
        };

        let job = RenderJob {
            manifest_path: self.filelist,
            options,
            name: self.name,
            outdir: self.outdir.unwrap_or_else(|| defaults.outdir.clone()),
            use_exif_date: self.use_exif_date,
            encoder: defaults.encoder.clone(),
        };
        (job, self.dry_run)
    }
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
    tracing::debug!(defaults = ?config.render, "Render defaults");

    let (job, dry_run) = cli.into_job(&config);
    let plan = RenderPlan::prepare(&job)?;

    println!("\nFFmpeg command:\n");
    println!("{}\n", plan.command());

    if dry_run {
        println!("Dry run: would write {}", plan.output_path().display());
        return Ok(());
    }

    let mut backend = FfmpegBackend::new(job.encoder.clone());
    let progress_cb: ProgressCallback = Box::new(print_progress);
    let output = plan.execute(&mut backend, Some(progress_cb))?;

    println!("\nDone: {}", output.display());
    Ok(())
}

fn print_progress(p: EncodeProgress) {
    match p.fraction() {
        Some(fraction) => print!(
            "\r  Progress: {:.1}% ({}/{} frames, {:.1}s)  ",
            fraction * 100.0,
            p.frames_encoded,
            p.expected_frames,
            p.out_time_secs,
        ),
        None => print!(
            "\r  Progress: {} frames, {:.1}s  ",
            p.frames_encoded, p.out_time_secs
        ),
    }
    std::io::stdout().flush().ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lapse-render").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_come_from_config() {
        let mut config = AppConfig::default();
        config.render.fps = 30;
        config.render.crf = 18;
        config.render.outdir = PathBuf::from("/videos");
        config.render.encoder = "/usr/local/bin/ffmpeg".to_string();

        let (job, dry_run) = parse(&["night1.txt"]).into_job(&config);
        assert!(!dry_run);
        assert_eq!(job.options.fps, 30);
        assert_eq!(job.options.crf, 18);
        assert_eq!(job.options.preset, "slow");
        assert_eq!(job.outdir, PathBuf::from("/videos"));
        assert_eq!(job.encoder, "/usr/local/bin/ffmpeg");
        assert!(job.options.watermark.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let (job, dry_run) = parse(&[
            "night1.txt",
            "--fps",
            "25",
            "--crf",
            "16",
            "--preset",
            "medium",
            "--outdir",
            "out",
            "--dry-run",
        ])
        .into_job(&AppConfig::default());
        assert!(dry_run);
        assert_eq!(job.options.fps, 25);
        assert_eq!(job.options.crf, 16);
        assert_eq!(job.options.preset, "medium");
        assert_eq!(job.outdir, PathBuf::from("out"));
    }

    #[test]
    fn test_watermark_options_only_with_file() {
        let (job, _) = parse(&[
            "night1.txt",
            "--watermark",
            "logo.png",
            "--wm-position",
            "top-right",
            "--wm-size",
            "large",
            "--wm-alpha",
            "0.5",
        ])
        .into_job(&AppConfig::default());
        let wm = job.options.watermark.unwrap();
        assert_eq!(wm.path, PathBuf::from("logo.png"));
        assert_eq!(wm.position, WatermarkPosition::TopRight);
        assert_eq!(wm.size.factor(), 0.15);
        assert_eq!(wm.alpha.value(), 0.5);

        let (plain, _) = parse(&["night1.txt", "--wm-position", "center"])
            .into_job(&AppConfig::default());
        assert!(plain.options.watermark.is_none());
    }

    #[test]
    fn test_look_and_explicit_colors() {
        let (job, _) = parse(&["night1.txt", "--look", "milkyway", "--gamma", "1.0"])
            .into_job(&AppConfig::default());
        assert_eq!(job.options.look, Some(LookPreset::Milkyway));
        assert_eq!(job.options.colors.gamma, Some(1.0));
        assert_eq!(job.options.colors.contrast, None);
    }

    #[test]
    fn test_invalid_choices_are_rejected() {
        for args in [
            ["lapse-render", "x.txt", "--resolution", "720p"],
            ["lapse-render", "x.txt", "--look", "sunset"],
            ["lapse-render", "x.txt", "--wm-position", "middle"],
            ["lapse-render", "x.txt", "--wm-alpha", "1.5"],
            ["lapse-render", "x.txt", "--aspect-mode", "stretch"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?} should fail");
        }
    }
}
