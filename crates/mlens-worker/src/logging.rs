//! Per-request structured logging.
//!
//! Every line carries the request id and the command. Once validation has
//! resolved the attachment, its kind is recorded on the request span too.

use tracing::{error, field, info, warn, Level, Span};

use mlens_models::{AttachmentKind, RequestId};

use crate::error::WorkerError;

/// Pipeline stage a log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Download,
    Analyze,
    Crop,
    Deliver,
    Cleanup,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Download => "download",
            Stage::Analyze => "analyze",
            Stage::Crop => "crop",
            Stage::Deliver => "deliver",
            Stage::Cleanup => "cleanup",
        }
    }
}

/// Severity used when a request fails with `error`.
///
/// Rejected input and shutdown are expected outcomes and stay at warn.
pub fn failure_level(error: &WorkerError) -> Level {
    if error.is_user_input() || error.is_cancelled() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

/// Logger for one inspect or crop request.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: String,
    command: &'static str,
    span: Span,
}

impl RequestLogger {
    /// `command` is `"inspect"` or `"crop"`.
    pub fn new(request_id: &RequestId, command: &'static str) -> Self {
        let request_id = request_id.to_string();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            command,
            attachment = field::Empty
        );
        Self {
            request_id,
            command,
            span,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    /// Span that instruments the whole request future.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    pub fn received(&self) {
        info!(request_id = %self.request_id, command = self.command, "Command received");
    }

    /// Record the validated attachment kind.
    pub fn accepted(&self, kind: &AttachmentKind) {
        self.span.record("attachment", kind.as_str());
        info!(
            request_id = %self.request_id,
            command = self.command,
            attachment = kind.as_str(),
            "Attachment accepted"
        );
    }

    pub fn rejected(&self, reason: &str) {
        warn!(
            request_id = %self.request_id,
            command = self.command,
            stage = Stage::Validate.as_str(),
            "Command rejected: {}", reason
        );
    }

    /// A stage finished.
    pub fn stage(&self, stage: Stage, detail: &str) {
        info!(
            request_id = %self.request_id,
            command = self.command,
            stage = stage.as_str(),
            "{}", detail
        );
    }

    /// Something went wrong that does not fail the request.
    pub fn degraded(&self, stage: Stage, detail: &str) {
        warn!(
            request_id = %self.request_id,
            command = self.command,
            stage = stage.as_str(),
            "{}", detail
        );
    }

    pub fn cleaned(&self, removed: usize) {
        info!(
            request_id = %self.request_id,
            command = self.command,
            stage = Stage::Cleanup.as_str(),
            removed,
            "Workspace removed"
        );
    }

    pub fn completed(&self) {
        info!(request_id = %self.request_id, command = self.command, "Request completed");
    }

    /// Log a failed request at the level [`failure_level`] picks.
    pub fn failed(&self, error: &WorkerError) {
        if failure_level(error) == Level::WARN {
            warn!(
                request_id = %self.request_id,
                command = self.command,
                error = %error,
                "Request did not complete"
            );
        } else {
            error!(
                request_id = %self.request_id,
                command = self.command,
                error = %error,
                "Request failed"
            );
        }
    }

    /// A chat message could not be sent or removed.
    pub fn messaging_failed(&self, what: &str, error: &dyn std::fmt::Display) {
        error!(
            request_id = %self.request_id,
            command = self.command,
            error = %error,
            "Could not {}", what
        );
    }
}
