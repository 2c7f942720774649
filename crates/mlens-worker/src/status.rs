//! Progress status and short-lived user messages.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::WorkerResult;
use crate::transport::{MessageRef, Transport};

/// Delete `message` after `delay` on a detached task.
pub fn delete_after(
    transport: Arc<dyn Transport>,
    message: MessageRef,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = transport.delete_message(message).await {
            debug!(message_id = message.message_id, error = %e, "Ephemeral message already gone");
        }
    })
}

/// Reply to `command` with a message that removes itself after `visible_for`.
pub async fn reply_ephemeral(
    transport: Arc<dyn Transport>,
    command: MessageRef,
    text: &str,
    visible_for: Duration,
) -> WorkerResult<JoinHandle<()>> {
    let sent = transport
        .send_text(command.chat_id, text, Some(command.message_id))
        .await?;
    Ok(delete_after(transport, sent, visible_for))
}

/// A status message edited as a request moves through its stages.
pub struct ProgressStatus {
    transport: Arc<dyn Transport>,
    message: MessageRef,
}

impl ProgressStatus {
    /// Post the initial status as a reply to the command.
    pub async fn post(
        transport: Arc<dyn Transport>,
        command: MessageRef,
        text: &str,
    ) -> WorkerResult<Self> {
        let message = transport
            .send_text(command.chat_id, text, Some(command.message_id))
            .await?;
        Ok(Self { transport, message })
    }

    pub fn message(&self) -> MessageRef {
        self.message
    }

    /// Replace the status text. Edit failures are logged, not returned.
    pub async fn update(&self, text: &str) {
        if let Err(e) = self.transport.edit_text(self.message, text).await {
            warn!(message_id = self.message.message_id, error = %e, "Failed to update status");
        }
    }

    /// Remove the status and the command message after success.
    pub async fn finish(self, command: MessageRef) {
        for message in [self.message, command] {
            if let Err(e) = self.transport.delete_message(message).await {
                warn!(message_id = message.message_id, error = %e, "Failed to delete message");
            }
        }
    }

    /// Show a failure in place of the status, then remove it after `visible_for`.
    pub async fn fail(self, text: &str, visible_for: Duration) -> JoinHandle<()> {
        self.update(text).await;
        delete_after(self.transport, self.message, visible_for)
    }
}
