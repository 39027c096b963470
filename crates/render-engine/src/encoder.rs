//! Encoder command construction and execution.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use lapse_common::error::{LapseError, LapseResult};

use crate::filters::{video_filter, watermark_graph};
use crate::options::ResolvedRender;

/// Frame rate ffmpeg's concat demuxer assigns to still images.
pub const CONCAT_IMAGE_RATE: f64 = 25.0;

/// A fully built encoder invocation. Arguments are passed as a list and
/// never go through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EncodeCommand {
    /// Build the ffmpeg command for `manifest` rendered with `render`.
    pub fn build(program: &str, manifest: &Path, render: &ResolvedRender, output: &Path) -> Self {
        let mut args: Vec<String> = ["-y", "-f", "concat", "-safe", "0", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(manifest.display().to_string());

        let chain = video_filter(render);
        match &render.watermark {
            Some(wm) => {
                args.push("-i".to_string());
                args.push(wm.path.display().to_string());
                args.push("-filter_complex".to_string());
                args.push(watermark_graph(&chain, wm));
            }
            None => {
                args.push("-vf".to_string());
                args.push(chain);
            }
        }

        args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-crf".to_string(),
            render.crf.to_string(),
            "-preset".to_string(),
            render.preset.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]);
        args.push(output.display().to_string());

        Self {
            program: program.to_string(),
            args,
        }
    }

    /// Value following `flag`, if present.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for EncodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Estimated number of output frames for `input_frames` stills.
pub fn expected_output_frames(input_frames: usize, slowdown: f64, fps: u32) -> u64 {
    let secs = input_frames as f64 / CONCAT_IMAGE_RATE * slowdown;
    (secs * fps as f64).ceil() as u64
}

/// Progress callback for encoding.
pub type ProgressCallback = Box<dyn Fn(EncodeProgress)>;

/// Encoder progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeProgress {
    /// Frames written so far.
    pub frames_encoded: u64,

    /// Estimated total output frames (0 when unknown).
    pub expected_frames: u64,

    /// Output timestamp reached, in seconds.
    pub out_time_secs: f64,

    /// Whether ffmpeg reported the end of encoding.
    pub done: bool,
}

impl EncodeProgress {
    /// Fraction complete in `[0, 1]`, when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        if self.done {
            return Some(1.0);
        }
        (self.expected_frames > 0)
            .then(|| (self.frames_encoded as f64 / self.expected_frames as f64).clamp(0.0, 1.0))
    }
}

/// Trait for encoder backends.
pub trait EncoderBackend {
    /// Run the command to completion.
    fn encode(
        &mut self,
        command: &EncodeCommand,
        expected_frames: u64,
        progress: Option<ProgressCallback>,
    ) -> LapseResult<()>;

    /// Check if the backend's binary can be run.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Runs the command as an ffmpeg subprocess.
pub struct FfmpegBackend {
    program: String,
}

impl FfmpegBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl EncoderBackend for FfmpegBackend {
    fn encode(
        &mut self,
        command: &EncodeCommand,
        expected_frames: u64,
        progress: Option<ProgressCallback>,
    ) -> LapseResult<()> {
        tracing::debug!(args = ?command.args, "Running ffmpeg");
        let mut cmd = Command::new(&command.program);
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostats",
            "-progress",
            "pipe:1",
        ])
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let start = std::time::Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            LapseError::render(format!("Failed to start {}: {e}", command.program))
        })?;

        tracing::info!(pid = child.id(), expected_frames, "ffmpeg process started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LapseError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| LapseError::render("Failed to capture ffmpeg stderr"))?;

        // Drain stderr so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut state = ProgressState::default();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| LapseError::render(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            if let Some((key, value)) = line.trim().split_once('=') {
                state.update(key, value);
                if key == "progress" {
                    if let Some(cb) = &progress {
                        cb(state.report(expected_frames));
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| LapseError::render(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(LapseError::render(format!(
                "ffmpeg failed ({status}): {}",
                stderr_output.trim()
            )));
        }

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            frames = state.frame,
            "ffmpeg finished"
        );
        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists(&self.program)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Whether `program -version` can be executed successfully.
pub fn command_exists(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct ProgressState {
    frame: u64,
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            "frame" => {
                if let Ok(frame) = value.trim().parse::<u64>() {
                    self.frame = frame;
                }
            }
            // Both keys carry microseconds despite the `_ms` name.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.trim().parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value.trim() == "end";
            }
            _ => {}
        }
    }

    fn report(&self, expected_frames: u64) -> EncodeProgress {
        EncodeProgress {
            frames_encoded: self.frame,
            expected_frames,
            out_time_secs: self.out_time_secs,
            done: self.complete,
        }
    }
}
