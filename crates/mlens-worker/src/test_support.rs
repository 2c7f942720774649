//! In-memory transport for pipeline tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::Mutex;

use mlens_models::Attachment;

use crate::transport::{MessageRef, Transport, TransportError, TransportResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Download {
        file_ref: String,
        path: PathBuf,
    },
    Text {
        message: MessageRef,
        text: String,
        reply_to: Option<i64>,
    },
    Photo {
        path: PathBuf,
        caption: String,
        reply_to: Option<i64>,
        existed: bool,
    },
    Video {
        path: PathBuf,
        caption: String,
        reply_to: Option<i64>,
        existed: bool,
    },
    Edit {
        message: MessageRef,
        text: String,
    },
    Delete {
        message: MessageRef,
    },
}

/// Records every call. Downloads copy `file_ref` when it names an existing
/// file, otherwise they write a small placeholder.
pub struct RecordingTransport {
    events: Mutex<Vec<Event>>,
    next_id: AtomicI64,
    fail_downloads: AtomicBool,
    fail_media_sends: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1000),
            fail_downloads: AtomicBool::new(false),
            fail_media_sends: AtomicBool::new(false),
        }
    }

    pub fn failing_downloads(self) -> Self {
        self.fail_downloads.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_media_sends(self) -> Self {
        self.fail_media_sends.store(true, Ordering::SeqCst);
        self
    }

    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    pub async fn texts(&self) -> Vec<String> {
        self.events()
            .await
            .into_iter()
            .filter_map(|e| match e {
                Event::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub async fn edits(&self) -> Vec<String> {
        self.events()
            .await
            .into_iter()
            .filter_map(|e| match e {
                Event::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub async fn deleted(&self) -> Vec<MessageRef> {
        self.events()
            .await
            .into_iter()
            .filter_map(|e| match e {
                Event::Delete { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub async fn downloads(&self) -> Vec<PathBuf> {
        self.events()
            .await
            .into_iter()
            .filter_map(|e| match e {
                Event::Download { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    fn next_message(&self, chat_id: i64) -> MessageRef {
        MessageRef::new(chat_id, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn push(&self, event: Event) {
        self.events.lock().await.push(event);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn download_media(
        &self,
        attachment: &Attachment,
        dest_dir: &Path,
    ) -> TransportResult<PathBuf> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(TransportError::Download("connection reset".to_string()));
        }

        let source = Path::new(&attachment.file_ref);
        let name = attachment
            .file_name
            .clone()
            .or_else(|| source.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "download.bin".to_string());
        let path = dest_dir.join(name);

        if source.is_file() {
            tokio::fs::copy(source, &path).await?;
        } else {
            tokio::fs::write(&path, b"media").await?;
        }

        self.push(Event::Download {
            file_ref: attachment.file_ref.clone(),
            path: path.clone(),
        })
        .await;
        Ok(path)
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> TransportResult<MessageRef> {
        let message = self.next_message(chat_id);
        self.push(Event::Text {
            message,
            text: text.to_string(),
            reply_to,
        })
        .await;
        Ok(message)
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        reply_to: Option<i64>,
    ) -> TransportResult<MessageRef> {
        if self.fail_media_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send("photo rejected".to_string()));
        }
        self.push(Event::Photo {
            path: path.to_path_buf(),
            caption: caption.to_string(),
            reply_to,
            existed: path.is_file(),
        })
        .await;
        Ok(self.next_message(chat_id))
    }

    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        reply_to: Option<i64>,
    ) -> TransportResult<MessageRef> {
        if self.fail_media_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send("video rejected".to_string()));
        }
        self.push(Event::Video {
            path: path.to_path_buf(),
            caption: caption.to_string(),
            reply_to,
            existed: path.is_file(),
        })
        .await;
        Ok(self.next_message(chat_id))
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> TransportResult<()> {
        self.push(Event::Edit {
            message,
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> TransportResult<()> {
        self.push(Event::Delete { message }).await;
        Ok(())
    }
}
