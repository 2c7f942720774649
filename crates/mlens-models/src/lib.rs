//! Shared data models for MediaLens.
//!
//! This crate provides Serde-serializable types for:
//! - Request identifiers
//! - Attachments and their resolved kinds
//! - Media descriptors built from fetched attachments
//! - Crop dimensions, rectangles and requests
//! - Probe results and EXIF maps
//! - Size and duration formatting

pub mod attachment;
pub mod crop;
pub mod exif;
pub mod media;
pub mod probe;
pub mod request;
pub mod utils;

// Re-export common types
pub use attachment::{Attachment, AttachmentKind, CropSource, UnsupportedAttachment};
pub use crop::{CropDimensions, CropDimensionsParseError, CropRect, CropRequest, CropTooLarge};
pub use exif::ExifMap;
pub use media::MediaDescriptor;
pub use probe::{FormatSection, ProbeOutcome, ProbeResult, StreamInfo};
pub use request::RequestId;
pub use utils::{format_decimal, format_mmss, format_size, round2};
