//! Filesystem-backed transport for running commands from the command line.
//!
//! Attachments are local paths, text goes to stdout and delivered media is
//! copied into an output directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

use mlens_models::{Attachment, AttachmentKind};

use crate::transport::{MessageRef, Transport, TransportError, TransportResult};

/// MIME type for a file extension, if known.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

/// Describe a local file as an attachment.
///
/// Files with a known extension become documents carrying their MIME type;
/// everything else is `Other`.
pub async fn attachment_from_path(path: &Path) -> TransportResult<Attachment> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(TransportError::Download(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let kind = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension)
        .map(AttachmentKind::document)
        .unwrap_or(AttachmentKind::Other);

    let mut attachment =
        Attachment::new(kind, path.to_string_lossy()).with_file_size(metadata.len());
    if let Some(name) = path.file_name() {
        attachment = attachment.with_file_name(name.to_string_lossy());
    }
    Ok(attachment)
}

/// Transport over the local filesystem and stdout.
pub struct LocalTransport {
    output_dir: PathBuf,
    next_id: AtomicI64,
    deliveries: Mutex<Vec<PathBuf>>,
}

impl LocalTransport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            next_id: AtomicI64::new(1),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Files written to the output directory so far.
    pub async fn deliveries(&self) -> Vec<PathBuf> {
        self.deliveries.lock().await.clone()
    }

    fn next_message(&self, chat_id: i64) -> MessageRef {
        MessageRef::new(chat_id, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn deliver(&self, chat_id: i64, path: &Path, caption: &str) -> TransportResult<MessageRef> {
        let name = path
            .file_name()
            .ok_or_else(|| TransportError::Send(format!("{} has no file name", path.display())))?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let destination = self.output_dir.join(name);
        tokio::fs::copy(path, &destination)
            .await
            .map_err(|e| TransportError::Send(format!("{}: {}", destination.display(), e)))?;

        info!(path = %destination.display(), "Media delivered");
        println!("{}\n{}", caption, destination.display());
        self.deliveries.lock().await.push(destination);
        Ok(self.next_message(chat_id))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn download_media(
        &self,
        attachment: &Attachment,
        dest_dir: &Path,
    ) -> TransportResult<PathBuf> {
        let source = Path::new(&attachment.file_ref);
        // Only the last component of a declared name is used, so the copy
        // always lands directly in `dest_dir`.
        let name = attachment
            .file_name
            .as_deref()
            .and_then(|declared| Path::new(declared).file_name())
            .or_else(|| source.file_name())
            .ok_or_else(|| TransportError::Download(format!("{} has no file name", source.display())))?;

        let destination = dest_dir.join(name);
        tokio::fs::copy(source, &destination)
            .await
            .map_err(|e| TransportError::Download(format!("{}: {}", source.display(), e)))?;

        debug!(from = %source.display(), to = %destination.display(), "Media copied");
        Ok(destination)
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        _reply_to: Option<i64>,
    ) -> TransportResult<MessageRef> {
        println!("{}", text);
        Ok(self.next_message(chat_id))
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        _reply_to: Option<i64>,
    ) -> TransportResult<MessageRef> {
        self.deliver(chat_id, path, caption).await
    }

    async fn send_video(
        &self,
        chat_id: i64,
        path: &Path,
        caption: &str,
        _reply_to: Option<i64>,
    ) -> TransportResult<MessageRef> {
        self.deliver(chat_id, path, caption).await
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> TransportResult<()> {
        info!(message_id = message.message_id, "{}", text);
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> TransportResult<()> {
        debug!(message_id = message.message_id, "Message deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mime_table() {
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("webm"), Some("video/webm"));
        assert_eq!(mime_for_extension("xyz"), None);
    }

    #[tokio::test]
    async fn test_attachment_from_path() {
        let dir = TempDir::new().unwrap();
        let gif = dir.path().join("loop.gif");
        std::fs::write(&gif, b"GIF89a").unwrap();

        let attachment = attachment_from_path(&gif).await.unwrap();
        assert!(attachment.kind.is_animated());
        assert_eq!(attachment.file_name.as_deref(), Some("loop.gif"));
        assert_eq!(attachment.mime_type.as_deref(), Some("image/gif"));
        assert_eq!(attachment.file_size, 6);

        let unknown = dir.path().join("blob");
        std::fs::write(&unknown, b"x").unwrap();
        let attachment = attachment_from_path(&unknown).await.unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Other);

        assert!(attachment_from_path(&dir.path().join("missing.png")).await.is_err());
        assert!(attachment_from_path(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_download_and_deliver() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("photo.png");
        std::fs::write(&source, b"png").unwrap();
        let work = dir.path().join("work");
        std::fs::create_dir(&work).unwrap();
        let out = dir.path().join("out");

        let transport = LocalTransport::new(&out);
        let attachment = attachment_from_path(&source).await.unwrap();
        let downloaded = transport.download_media(&attachment, &work).await.unwrap();
        assert_eq!(downloaded, work.join("photo.png"));
        assert_eq!(std::fs::read(&downloaded).unwrap(), b"png");

        let first = transport.send_text(0, "hi", None).await.unwrap();
        let second = transport
            .send_photo(0, &downloaded, "Cropped to: `1x1`", None)
            .await
            .unwrap();
        assert!(second.message_id > first.message_id);
        assert_eq!(transport.deliveries().await, vec![out.join("photo.png")]);
        assert!(out.join("photo.png").is_file());
    }

    #[tokio::test]
    async fn test_download_ignores_directories_in_declared_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("photo.png");
        std::fs::write(&source, b"png").unwrap();
        let work = dir.path().join("work");
        std::fs::create_dir(&work).unwrap();

        let transport = LocalTransport::new(dir.path().join("out"));
        for declared in ["../escaped.png", "/tmp/absolute.png", "nested/dir/inner.png"] {
            let attachment = Attachment::new(AttachmentKind::Image, source.to_string_lossy())
                .with_file_name(declared);
            let downloaded = transport.download_media(&attachment, &work).await.unwrap();
            assert_eq!(downloaded.parent(), Some(work.as_path()));
        }
        assert!(work.join("escaped.png").is_file());
        assert!(work.join("absolute.png").is_file());
        assert!(work.join("inner.png").is_file());
        assert!(!dir.path().join("escaped.png").exists());

        let attachment =
            Attachment::new(AttachmentKind::Image, source.to_string_lossy()).with_file_name("..");
        let downloaded = transport.download_media(&attachment, &work).await.unwrap();
        assert_eq!(downloaded, work.join("photo.png"));
    }

    #[tokio::test]
    async fn test_download_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let transport = LocalTransport::new(dir.path());
        let attachment = Attachment::new(AttachmentKind::Image, "/nonexistent/p.png");
        let err = transport
            .download_media(&attachment, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Download(_)));
    }
}
