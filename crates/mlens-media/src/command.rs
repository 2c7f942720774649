//! External process runner and FFmpeg command builder.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Captured result of one process run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Trimmed, lossily decoded stdout
    pub stdout: String,
    /// Trimmed, lossily decoded stderr
    pub stderr: String,
    /// Exit code; `-1` when terminated by a signal
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs an external program and captures its output.
///
/// The exit code is reported, never interpreted. Spawn failures are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> MediaResult<CommandOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
///
/// The child is killed if the returned future is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> MediaResult<CommandOutput> {
        debug!(program, args = %args.join(" "), "Running external command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::spawn_failed(program, e))?;

        let result = CommandOutput {
            stdout: decode_output(&output.stdout),
            stderr: decode_output(&output.stderr),
            exit_code: output.status.code().unwrap_or(-1),
        };

        debug!(program, exit_code = result.exit_code, "External command finished");
        Ok(result)
    }
}

fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Builder for FFmpeg argument vectors.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    output_args: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Build the argument vector. Output is always overwritten and only
    /// errors are logged.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.output_args.len() + 6);

        args.push("-y".to_string());
        args.push("-v".to_string());
        args.push("error".to_string());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Check that the configured FFmpeg binary is available.
pub fn check_ffmpeg(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::FfmpegNotFound)
}

/// Check that the configured FFprobe binary is available.
pub fn check_ffprobe(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::FfprobeNotFound)
}
