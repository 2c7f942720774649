//! Messaging transport collaborator.
//!
//! The worker never talks to a chat service directly. Everything it sends,
//! edits, deletes or downloads goes through [`Transport`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use mlens_models::Attachment;

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A message in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

impl MessageRef {
    pub const fn new(chat_id: i64, message_id: i64) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// The message a command replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepliedMessage {
    pub message: MessageRef,
    pub attachment: Option<Attachment>,
}

/// A command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCommand {
    /// The command message itself
    pub message: MessageRef,
    /// Free text following the command name
    pub argument: Option<String>,
    pub replied: Option<RepliedMessage>,
}

impl IncomingCommand {
    /// Non-blank argument text.
    pub fn argument(&self) -> Option<&str> {
        self.argument
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// The replied message and its attachment, if both exist.
    pub fn replied_attachment(&self) -> Option<(&RepliedMessage, &Attachment)> {
        let replied = self.replied.as_ref()?;
        let attachment = replied.attachment.as_ref()?;
        Some((replied, attachment))
    }
}

/// Chat service operations used by the pipelines.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch an attachment into `dest_dir` and return the local path.
    async fn download_media(
        &self,
        attachment: &Attachment,
        dest_dir: &Path,
    ) -> TransportResult<PathBuf>;

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> TransportResult<MessageRef>;

    async fn send_photo(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        reply_to: Option<i64>,
    ) -> TransportResult<MessageRef>;

    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        reply_to: Option<i64>,
    ) -> TransportResult<MessageRef>;

    async fn edit_text(&self, message: MessageRef, text: &str) -> TransportResult<()>;

    async fn delete_message(&self, message: MessageRef) -> TransportResult<()>;
}
