#![deny(unreachable_patterns)]
//! FFmpeg/FFprobe wrappers and media transforms for MediaLens.
//!
//! This crate provides:
//! - A mockable external process runner on top of `tokio::process`
//! - FFmpeg argument building
//! - FFprobe probing into typed results
//! - EXIF extraction from still images
//! - Center cropping of images (in-process) and videos (FFmpeg)
//! - Per-request temp file tracking with guaranteed cleanup

pub mod command;
pub mod crop;
pub mod error;
pub mod exif_reader;
pub mod filters;
pub mod probe;
pub mod temp_files;

pub use command::{check_ffmpeg, check_ffprobe, CommandOutput, FfmpegCommand, ProcessRunner, TokioProcessRunner};
pub use crop::{crop_image_blocking, cropped_output_path, Cropper, DEFAULT_FFMPEG};
pub use error::{MediaError, MediaResult};
pub use exif_reader::{extract_exif, read_exif};
pub use filters::center_crop_filter;
pub use probe::{parse_probe_output, Prober, DEFAULT_FFPROBE};
pub use temp_files::{RequestWorkspace, TempFileSet};
