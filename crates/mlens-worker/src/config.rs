//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use mlens_media::{DEFAULT_FFMPEG, DEFAULT_FFPROBE};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base directory for per-request workspaces
    pub work_dir: PathBuf,
    /// How long validation and failure messages stay visible
    pub error_visible_duration: Duration,
    /// Command prefix shown in usage text
    pub command_prefix: String,
    /// FFmpeg binary
    pub ffmpeg_bin: String,
    /// FFprobe binary
    pub ffprobe_bin: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            error_visible_duration: Duration::from_secs(8),
            command_prefix: ".".to_string(),
            ffmpeg_bin: DEFAULT_FFMPEG.to_string(),
            ffprobe_bin: DEFAULT_FFPROBE.to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("MLENS_WORK_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            error_visible_duration: Duration::from_secs(
                std::env::var("MLENS_ERROR_VISIBLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8),
            ),
            command_prefix: std::env::var("MLENS_COMMAND_PREFIX")
                .unwrap_or(defaults.command_prefix),
            ffmpeg_bin: std::env::var("MLENS_FFMPEG_BIN")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: std::env::var("MLENS_FFPROBE_BIN")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.ffprobe_bin),
        }
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_error_visible_duration(mut self, duration: Duration) -> Self {
        self.error_visible_duration = duration;
        self
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("mlens")
}
