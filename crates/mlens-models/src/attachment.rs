//! Attachment definitions.
//!
//! An attachment is resolved once, at pipeline entry, into a closed
//! [`AttachmentKind`]. Everything downstream matches on the kind instead of
//! probing optional fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// MIME type that marks a document as an animation.
pub const GIF_MIME_TYPE: &str = "image/gif";

/// Kind of media carried by a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Still image (compressed photo)
    Image,
    /// Video
    Video,
    /// Generic file with its declared MIME type
    Document { mime_type: String },
    /// Animated image (GIF or muted looping video)
    Animation,
    /// Audio, voice, sticker and anything else
    Other,
}

impl AttachmentKind {
    /// Document kind with the given MIME type.
    pub fn document(mime_type: impl Into<String>) -> Self {
        Self::Document {
            mime_type: mime_type.into(),
        }
    }

    /// Whether this is an animation or a GIF document.
    pub fn is_animated(&self) -> bool {
        match self {
            AttachmentKind::Animation => true,
            AttachmentKind::Document { mime_type } => mime_type.eq_ignore_ascii_case(GIF_MIME_TYPE),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Video => "video",
            AttachmentKind::Document { .. } => "document",
            AttachmentKind::Animation => "animation",
            AttachmentKind::Other => "other",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source kind accepted by the crop pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropSource {
    Image,
    Video,
}

impl CropSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropSource::Image => "image",
            CropSource::Video => "video",
        }
    }
}

impl fmt::Display for CropSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reasons an attachment cannot be cropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedAttachment {
    #[error("animated attachments are not supported")]
    Animated,

    #[error("attachment is not an image or video: {0}")]
    NotCroppable(String),
}

/// A single attachment on a message, as described by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Resolved kind
    pub kind: AttachmentKind,
    /// Transport-specific handle used to fetch the file
    pub file_ref: String,
    /// Declared file name, if any
    pub file_name: Option<String>,
    /// Declared MIME type, if any
    pub mime_type: Option<String>,
    /// Declared size in bytes (0 when unknown)
    pub file_size: u64,
}

impl Attachment {
    /// Create an attachment with only a kind and a file reference.
    pub fn new(kind: AttachmentKind, file_ref: impl Into<String>) -> Self {
        let mime_type = match &kind {
            AttachmentKind::Document { mime_type } => Some(mime_type.clone()),
            _ => None,
        };
        Self {
            kind,
            file_ref: file_ref.into(),
            file_name: None,
            mime_type,
            file_size: 0,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = size;
        self
    }

    /// Resolve the crop source for this attachment.
    ///
    /// Animations are rejected before anything else is looked at.
    pub fn crop_source(&self) -> Result<CropSource, UnsupportedAttachment> {
        if self.kind.is_animated() {
            return Err(UnsupportedAttachment::Animated);
        }

        match &self.kind {
            AttachmentKind::Image => Ok(CropSource::Image),
            AttachmentKind::Video => Ok(CropSource::Video),
            AttachmentKind::Document { mime_type } => {
                let mime = mime_type.to_ascii_lowercase();
                if mime.starts_with("image/") {
                    Ok(CropSource::Image)
                } else if mime.starts_with("video/") {
                    Ok(CropSource::Video)
                } else {
                    Err(UnsupportedAttachment::NotCroppable(mime_type.clone()))
                }
            }
            other => Err(UnsupportedAttachment::NotCroppable(other.to_string())),
        }
    }
}
