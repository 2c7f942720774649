//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use mlens_models::CropTooLarge;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Failed to start {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("FFmpeg crop failed: {stderr}")]
    FfmpegFailed { stderr: String, exit_code: i32 },

    #[error(transparent)]
    CropTooLarge(#[from] CropTooLarge),

    #[error("Could not read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid file name: {0}")]
    InvalidFileName(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl MediaError {
    /// Create an FFmpeg failure error from captured diagnostics.
    pub fn ffmpeg_failed(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self::FfmpegFailed {
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Create a spawn failure error.
    pub fn spawn_failed(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            program: program.into(),
            source,
        }
    }

    /// Whether the error was caused by the request itself rather than the system.
    pub fn is_user_input(&self) -> bool {
        matches!(self, MediaError::CropTooLarge(_))
    }
}
