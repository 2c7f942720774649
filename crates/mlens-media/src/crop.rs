//! Center cropping for images and videos.
//!
//! Images are cropped in-process on the blocking pool. Videos are
//! re-encoded through FFmpeg with a crop filter, copying the audio track.

use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use mlens_models::{CropDimensions, CropRect, CropRequest, CropSource};

use crate::command::{FfmpegCommand, ProcessRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::center_crop_filter;
use crate::probe::Prober;
use crate::temp_files::RequestWorkspace;

/// Default FFmpeg binary.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

const CROPPED_SUFFIX: &str = "_cropped";

/// Output path for a cropped copy of `input`, placed in `dir`.
///
/// `clip.mp4` becomes `clip_cropped.mp4`.
pub fn cropped_output_path(dir: &Path, input: &Path) -> MediaResult<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| MediaError::InvalidFileName(input.to_path_buf()))?;

    let mut name = stem.to_os_string();
    name.push(CROPPED_SUFFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    Ok(dir.join(name))
}

/// Crop a still image to the centered rectangle and save it to `output`.
///
/// Nothing is written when the requested size exceeds the image.
pub fn crop_image_blocking(
    input: &Path,
    output: &Path,
    dims: CropDimensions,
) -> MediaResult<CropRect> {
    let reader = ImageReader::open(input)?.with_guessed_format()?;
    let source_format = reader.format();
    let img = reader.decode()?;

    let (width, height) = img.dimensions();
    let rect = CropRect::centered(width, height, dims)?;

    let cropped = img.crop_imm(rect.left, rect.top, rect.width(), rect.height());
    let cropped = if cropped.color().has_alpha() {
        DynamicImage::ImageRgb8(cropped.to_rgb8())
    } else {
        cropped
    };

    match ImageFormat::from_path(output) {
        Ok(format) => cropped.save_with_format(output, format)?,
        Err(_) => cropped.save_with_format(output, source_format.unwrap_or(ImageFormat::Png))?,
    }

    debug!(
        input = %input.display(),
        output = %output.display(),
        source_width = width,
        source_height = height,
        left = rect.left,
        top = rect.top,
        "Image cropped"
    );
    Ok(rect)
}

/// Runs crop requests.
#[derive(Clone)]
pub struct Cropper {
    runner: Arc<dyn ProcessRunner>,
    prober: Prober,
    ffmpeg: String,
}

impl Cropper {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            prober: Prober::new(runner.clone()),
            runner,
            ffmpeg: DEFAULT_FFMPEG.to_string(),
        }
    }

    /// Use a different FFmpeg binary.
    pub fn with_ffmpeg(mut self, program: impl Into<String>) -> Self {
        self.ffmpeg = program.into();
        self
    }

    /// Use a different FFprobe binary for the video size check.
    pub fn with_ffprobe(mut self, program: impl Into<String>) -> Self {
        self.prober = self.prober.with_program(program);
        self
    }

    /// Crop `input` into the workspace and return the output path.
    ///
    /// The output path is registered with the workspace before any work
    /// starts, so partial output is cleaned up with the request.
    pub async fn crop(
        &self,
        request: CropRequest,
        input: &Path,
        workspace: &mut RequestWorkspace,
    ) -> MediaResult<PathBuf> {
        let output = cropped_output_path(workspace.path(), input)?;
        workspace.register(&output);

        info!(
            source = %request.source,
            dimensions = %request.dimensions,
            input = %input.display(),
            "Cropping media"
        );

        match request.source {
            CropSource::Image => {
                let input = input.to_path_buf();
                let out = output.clone();
                let dims = request.dimensions;
                tokio::task::spawn_blocking(move || crop_image_blocking(&input, &out, dims))
                    .await??;
            }
            CropSource::Video => {
                self.check_video_size(input, request.dimensions).await?;
                self.crop_video(input, &output, request.dimensions).await?
            }
        }

        Ok(output)
    }

    /// Reject a crop larger than the video's frame.
    ///
    /// When the frame size cannot be probed the request goes on to FFmpeg,
    /// which reports the failure itself.
    pub async fn check_video_size(&self, input: &Path, dims: CropDimensions) -> MediaResult<()> {
        let outcome = self.prober.probe(input).await;
        match outcome
            .found()
            .and_then(|result| result.video_stream())
            .and_then(|stream| stream.resolution())
        {
            Some((width, height)) => {
                CropRect::centered(width, height, dims)?;
                Ok(())
            }
            None => {
                debug!(input = %input.display(), "Video frame size unknown, skipping size check");
                Ok(())
            }
        }
    }

    /// Re-encode a video through the center crop filter.
    pub async fn crop_video(
        &self,
        input: &Path,
        output: &Path,
        dims: CropDimensions,
    ) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(input, output)
            .video_filter(center_crop_filter(dims))
            .audio_codec("copy");

        let result = self.runner.run(&self.ffmpeg, &cmd.build_args()).await?;
        if !result.success() {
            return Err(MediaError::ffmpeg_failed(result.stderr, result.exit_code));
        }

        debug!(output = %output.display(), "Video cropped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, MockProcessRunner};
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use mlens_models::RequestId;
    use tempfile::TempDir;

    fn idle_runner() -> Arc<dyn ProcessRunner> {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().never();
        Arc::new(runner)
    }

    const HD_STREAMS: &str =
        r#"{"streams":[{"codec_type":"video","codec_name":"h264","width":1920,"height":1080}]}"#;

    fn expect_ffprobe(runner: &mut MockProcessRunner, stdout: &'static str, exit_code: i32) {
        runner
            .expect_run()
            .withf(|program, _| program == "ffprobe")
            .times(1)
            .returning(move |_, _| {
                Ok(CommandOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code,
                })
            });
    }

    #[test]
    fn test_cropped_output_path() {
        let dir = Path::new("/work");
        assert_eq!(
            cropped_output_path(dir, Path::new("/dl/clip.final.mp4")).unwrap(),
            PathBuf::from("/work/clip.final_cropped.mp4")
        );
        assert_eq!(
            cropped_output_path(dir, Path::new("/dl/photo")).unwrap(),
            PathBuf::from("/work/photo_cropped")
        );
        assert!(cropped_output_path(dir, Path::new("/")).is_err());
    }

    #[test]
    fn test_crop_image_exact_size_and_offset() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("grid.png");
        let output = dir.path().join("grid_cropped.png");

        // Each pixel encodes its own coordinates.
        let img = RgbImage::from_fn(101, 51, |x, y| Rgb([x as u8, y as u8, 0]));
        img.save(&input).unwrap();

        let rect = crop_image_blocking(&input, &output, CropDimensions::new(50, 20)).unwrap();
        assert_eq!((rect.left, rect.top), (25, 15));

        let cropped = image::open(&output).unwrap().to_rgb8();
        assert_eq!(cropped.dimensions(), (50, 20));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([25, 15, 0]));
        assert_eq!(cropped.get_pixel(49, 19), &Rgb([74, 34, 0]));
    }

    #[test]
    fn test_crop_image_drops_alpha() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("alpha.png");
        let output = dir.path().join("alpha_cropped.png");
        RgbaImage::from_pixel(10, 10, Rgba([10, 20, 30, 128]))
            .save(&input)
            .unwrap();

        crop_image_blocking(&input, &output, CropDimensions::new(4, 4)).unwrap();
        let cropped = image::open(&output).unwrap();
        assert!(!cropped.color().has_alpha());
    }

    #[test]
    fn test_crop_image_too_large_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("small.png");
        let output = dir.path().join("small_cropped.png");
        RgbImage::new(100, 100).save(&input).unwrap();

        let err = crop_image_blocking(&input, &output, CropDimensions::new(101, 10)).unwrap_err();
        assert!(matches!(err, MediaError::CropTooLarge(_)));
        assert!(!output.exists());

        let err = crop_image_blocking(&input, &output, CropDimensions::new(10, 101)).unwrap_err();
        assert!(err.is_user_input());
        assert!(!output.exists());
    }

    #[test]
    fn test_crop_image_without_extension_keeps_source_format() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("download");
        RgbImage::new(8, 8)
            .save_with_format(&input, ImageFormat::Png)
            .unwrap();
        let output = cropped_output_path(dir.path(), &input).unwrap();

        crop_image_blocking(&input, &output, CropDimensions::new(4, 4)).unwrap();
        let saved = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(saved.format(), Some(ImageFormat::Png));
    }

    #[tokio::test]
    async fn test_crop_registers_image_output() {
        let base = TempDir::new().unwrap();
        let mut workspace = RequestWorkspace::create(base.path(), &RequestId::new())
            .await
            .unwrap();
        let input = workspace.path().join("pic.png");
        RgbImage::new(64, 48).save(&input).unwrap();
        workspace.register(&input);

        let cropper = Cropper::new(idle_runner());
        let request = CropRequest::new(CropDimensions::new(32, 32), CropSource::Image);
        let output = cropper.crop(request, &input, &mut workspace).await.unwrap();

        assert_eq!(output.file_name().unwrap(), "pic_cropped.png");
        assert!(workspace.files().contains(&output));
        assert_eq!(image::image_dimensions(&output).unwrap(), (32, 32));

        workspace.cleanup().await;
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_crop_video_invokes_ffmpeg() {
        let base = TempDir::new().unwrap();
        let mut workspace = RequestWorkspace::create(base.path(), &RequestId::new())
            .await
            .unwrap();
        let input = workspace.path().join("clip.mp4");
        let expected_output = workspace.path().join("clip_cropped.mp4");
        let expected_args: Vec<String> = [
            "-y",
            "-v",
            "error",
            "-i",
            &input.to_string_lossy(),
            "-vf",
            "crop=1280:720:(in_w-1280)/2:(in_h-720)/2",
            "-c:a",
            "copy",
            &expected_output.to_string_lossy(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut runner = MockProcessRunner::new();
        expect_ffprobe(&mut runner, HD_STREAMS, 0);
        runner
            .expect_run()
            .withf(move |program, args| program == "ffmpeg" && args == expected_args.as_slice())
            .times(1)
            .returning(|_, _| Ok(CommandOutput::default()));

        let cropper = Cropper::new(Arc::new(runner));
        let request = CropRequest::new(CropDimensions::new(1280, 720), CropSource::Video);
        let output = cropper.crop(request, &input, &mut workspace).await.unwrap();
        assert_eq!(output, expected_output);
        workspace.cleanup().await;
    }

    #[tokio::test]
    async fn test_crop_video_larger_than_frame_skips_ffmpeg() {
        let base = TempDir::new().unwrap();
        let mut workspace = RequestWorkspace::create(base.path(), &RequestId::new())
            .await
            .unwrap();
        let input = workspace.path().join("clip.mp4");

        let mut runner = MockProcessRunner::new();
        expect_ffprobe(&mut runner, HD_STREAMS, 0);
        runner
            .expect_run()
            .withf(|program, _| program == "ffmpeg")
            .never();

        let cropper = Cropper::new(Arc::new(runner));
        let request = CropRequest::new(CropDimensions::new(9000, 9000), CropSource::Video);
        let err = cropper.crop(request, &input, &mut workspace).await.unwrap_err();

        assert!(matches!(err, MediaError::CropTooLarge(_)));
        assert!(err.is_user_input());
        assert!(err.to_string().contains("(1920x1080)"));
        assert!(!workspace.path().join("clip_cropped.mp4").exists());
        workspace.cleanup().await;
    }

    #[tokio::test]
    async fn test_crop_video_failure_carries_stderr() {
        let base = TempDir::new().unwrap();
        let mut workspace = RequestWorkspace::create(base.path(), &RequestId::new())
            .await
            .unwrap();
        let input = workspace.path().join("clip.mkv");

        // Frame size unknown, so FFmpeg is the one to fail.
        let mut runner = MockProcessRunner::new();
        expect_ffprobe(&mut runner, "", 1);
        runner.expect_run().withf(|program, _| program == "ffmpeg").times(1).returning(|_, _| {
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: "Invalid too big or non positive size for width".to_string(),
                exit_code: 1,
            })
        });

        let cropper = Cropper::new(Arc::new(runner)).with_ffmpeg("ffmpeg");
        let request = CropRequest::new(CropDimensions::new(9000, 9000), CropSource::Video);
        let err = cropper.crop(request, &input, &mut workspace).await.unwrap_err();

        match err {
            MediaError::FfmpegFailed { stderr, exit_code } => {
                assert!(stderr.contains("Invalid too big"));
                assert_eq!(exit_code, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Output path is tracked even though the run failed.
        assert!(workspace
            .files()
            .contains(&workspace.path().join("clip_cropped.mkv")));
        workspace.cleanup().await;
    }
}
