//! FFprobe media information.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use mlens_models::{ProbeOutcome, ProbeResult};

use crate::command::ProcessRunner;

/// Default FFprobe binary.
pub const DEFAULT_FFPROBE: &str = "ffprobe";

/// Runs FFprobe and parses its JSON output.
#[derive(Clone)]
pub struct Prober {
    runner: Arc<dyn ProcessRunner>,
    program: String,
}

impl Prober {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            program: DEFAULT_FFPROBE.to_string(),
        }
    }

    /// Use a different FFprobe binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to FFprobe for `path`.
    pub fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Probe a file. Any failure yields [`ProbeOutcome::Unavailable`].
    pub async fn probe(&self, path: impl AsRef<Path>) -> ProbeOutcome {
        let path = path.as_ref();
        let args = Self::probe_args(path);

        let output = match self.runner.run(&self.program, &args).await {
            Ok(output) => output,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "FFprobe could not be run");
                return ProbeOutcome::Unavailable;
            }
        };

        if !output.success() || output.stdout.is_empty() {
            debug!(
                path = %path.display(),
                exit_code = output.exit_code,
                "FFprobe produced no usable output"
            );
            return ProbeOutcome::Unavailable;
        }

        match parse_probe_output(&output.stdout) {
            Some(result) => ProbeOutcome::Found(result),
            None => {
                warn!(path = %path.display(), "FFprobe output was not valid JSON");
                ProbeOutcome::Unavailable
            }
        }
    }
}

/// Parse FFprobe JSON.
pub fn parse_probe_output(stdout: &str) -> Option<ProbeResult> {
    serde_json::from_str(stdout).ok()
}
