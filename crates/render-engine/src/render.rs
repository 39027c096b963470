//! Render planning and execution.
//!
//! [`RenderPlan::prepare`] does everything short of running the encoder:
//! reads the manifest, inspects the first frame, resolves options, names the
//! output and builds the command. A dry run stops there.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use lapse_common::error::{LapseError, LapseResult};
use lapse_frame_model::ConcatManifest;

use crate::encoder::{expected_output_frames, EncodeCommand, EncoderBackend, ProgressCallback};
use crate::options::{RenderOptions, ResolvedRender};
use crate::output::{default_base_name, output_file_name};
use crate::probe::{read_capture_date, read_oriented_dimensions};

/// A render request: manifest, options and where the result goes.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub manifest_path: PathBuf,
    pub options: RenderOptions,
    /// Base name override; defaults to the manifest's file stem.
    pub name: Option<String>,
    pub outdir: PathBuf,
    /// Prefix the output name with the first frame's capture date.
    pub use_exif_date: bool,
    /// Encoder program, e.g. `ffmpeg`.
    pub encoder: String,
}

impl RenderJob {
    pub fn new(manifest_path: impl Into<PathBuf>, options: RenderOptions) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            options,
            name: None,
            outdir: PathBuf::from("Timelapses"),
            use_exif_date: false,
            encoder: "ffmpeg".to_string(),
        }
    }
}

/// A prepared render. Holds the boomerang manifest (if any) until dropped.
#[derive(Debug)]
pub struct RenderPlan {
    render: ResolvedRender,
    command: EncodeCommand,
    output_path: PathBuf,
    input_frames: usize,
    boomerang_manifest: Option<NamedTempFile>,
}

impl RenderPlan {
    pub fn prepare(job: &RenderJob) -> LapseResult<Self> {
        if !job.manifest_path.is_file() {
            return Err(LapseError::FileNotFound {
                path: job.manifest_path.clone(),
            });
        }

        // Relative entries are relative to the manifest's directory.
        let manifest_dir = job
            .manifest_path
            .canonicalize()?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let manifest = ConcatManifest::read(&job.manifest_path)
            .map_err(|e| LapseError::manifest(e.to_string()))?
            .resolve_against(&manifest_dir);
        if manifest.is_empty() {
            return Err(LapseError::manifest(format!(
                "No file entries in {}",
                job.manifest_path.display()
            )));
        }
        tracing::debug!(
            manifest = %job.manifest_path.display(),
            frames = manifest.len(),
            "Manifest loaded"
        );

        let render = job.options.resolve()?;
        if let Ok(json) = serde_json::to_string(&render) {
            tracing::debug!(render = %json, "Resolved render options");
        }

        let first = manifest.first();
        if let Some(first) = first {
            check_orientation(first, &render);
        }

        let date = match first {
            Some(first) if job.use_exif_date => match read_capture_date(first) {
                Ok(date) => {
                    if date.is_none() {
                        tracing::debug!(frame = %first.display(), "No EXIF capture date");
                    }
                    date
                }
                Err(e) => {
                    tracing::debug!(error = %e, "EXIF date unavailable");
                    None
                }
            },
            _ => None,
        };

        let base = job
            .name
            .clone()
            .unwrap_or_else(|| default_base_name(&job.manifest_path));
        let output_path = job.outdir.join(output_file_name(&base, date, &render));

        let (boomerang_manifest, input_frames) = if render.boomerang {
            let looped = manifest.boomerang();
            let temp = write_temp_manifest(&looped)?;
            tracing::debug!(
                path = %temp.path().display(),
                frames = looped.len(),
                "Boomerang manifest written"
            );
            (Some(temp), looped.len())
        } else {
            (None, manifest.len())
        };

        let input_path = boomerang_manifest
            .as_ref()
            .map(|t| t.path())
            .unwrap_or(job.manifest_path.as_path());
        let command = EncodeCommand::build(&job.encoder, input_path, &render, &output_path);

        Ok(Self {
            render,
            command,
            output_path,
            input_frames,
            boomerang_manifest,
        })
    }

    pub fn command(&self) -> &EncodeCommand {
        &self.command
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn render(&self) -> &ResolvedRender {
        &self.render
    }

    /// Frames the encoder reads, after boomerang expansion.
    pub fn input_frames(&self) -> usize {
        self.input_frames
    }

    /// Path of the temporary boomerang manifest, while the plan is alive.
    pub fn boomerang_manifest(&self) -> Option<&Path> {
        self.boomerang_manifest.as_ref().map(|t| t.path())
    }

    pub fn expected_frames(&self) -> u64 {
        expected_output_frames(self.input_frames, self.render.slowdown, self.render.fps)
    }

    /// Run the encoder and return the output path.
    pub fn execute(
        &self,
        backend: &mut dyn EncoderBackend,
        progress: Option<ProgressCallback>,
    ) -> LapseResult<PathBuf> {
        if let Some(wm) = &self.render.watermark {
            if !wm.path.is_file() {
                return Err(LapseError::FileNotFound {
                    path: wm.path.clone(),
                });
            }
        }

        if !backend.is_available() {
            return Err(LapseError::unsupported(format!(
                "{} is not installed or not on PATH",
                self.command.program
            )));
        }

        if let Some(dir) = self.output_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        tracing::info!(
            backend = backend.name(),
            output = %self.output_path.display(),
            frames = self.input_frames,
            "Starting render"
        );
        backend.encode(&self.command, self.expected_frames(), progress)?;

        Ok(self.output_path.clone())
    }
}

fn check_orientation(first: &Path, render: &ResolvedRender) {
    match read_oriented_dimensions(first) {
        Ok(dims) => {
            if let Some(warning) = dims.orientation_mismatch(render.orientation) {
                tracing::warn!(
                    source_width = dims.width,
                    source_height = dims.height,
                    "{warning}"
                );
            }
        }
        Err(e) => tracing::debug!(error = %e, "Could not read first frame dimensions"),
    }
}

fn write_temp_manifest(manifest: &ConcatManifest) -> LapseResult<NamedTempFile> {
    use std::io::Write;

    let mut temp = tempfile::Builder::new()
        .prefix("lapse-boomerang-")
        .suffix(".txt")
        .tempfile()?;
    temp.write_all(manifest.render().as_bytes())?;
    temp.flush()?;
    Ok(temp)
}
