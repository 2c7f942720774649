//! Inspection pipeline: download, probe and read EXIF, report.

use mlens_media::{extract_exif, RequestWorkspace};
use mlens_models::{Attachment, MediaDescriptor};

use crate::error::{WorkerError, WorkerResult};
use crate::executor::WorkerContext;
use crate::logging::{RequestLogger, Stage};
use crate::report::build_report;
use crate::status::ProgressStatus;
use crate::transport::{IncomingCommand, RepliedMessage};

pub const NO_MEDIA_MESSAGE: &str = "Please reply to any media file to check it.";
pub const DOWNLOADING_STATUS: &str = "<code>Downloading for deep analysis...</code>";
pub const ANALYZING_STATUS: &str = "<code>Analyzing...</code>";
pub const FAILURE_HEADING: &str = "Could not check file.";

/// Accept any attachment on the replied message.
pub fn validate_inspect(
    command: &IncomingCommand,
) -> WorkerResult<(&RepliedMessage, &Attachment)> {
    command
        .replied_attachment()
        .ok_or_else(|| WorkerError::user_input(NO_MEDIA_MESSAGE))
}

/// Run the inspection stages inside `workspace`.
pub(crate) async fn run_inspection(
    ctx: &WorkerContext,
    replied: &RepliedMessage,
    attachment: &Attachment,
    status: &ProgressStatus,
    workspace: &mut RequestWorkspace,
    logger: &RequestLogger,
) -> WorkerResult<()> {
    let input = ctx
        .transport
        .download_media(attachment, workspace.path())
        .await?;
    workspace.register(&input);
    logger.stage(Stage::Download, &format!("downloaded {}", input.display()));

    status.update(ANALYZING_STATUS).await;

    let media = MediaDescriptor::from_download(attachment, &input);
    let (probe, exif) = tokio::join!(ctx.prober.probe(&input), extract_exif(&input));
    if !probe.is_found() {
        logger.degraded(Stage::Analyze, "probe unavailable, technical details omitted");
    }
    logger.stage(Stage::Analyze, &format!("{} EXIF tags", exif.len()));

    let report = build_report(&media, &probe, &exif);
    ctx.transport
        .send_text(
            replied.message.chat_id,
            &report,
            Some(replied.message.message_id),
        )
        .await?;
    logger.stage(Stage::Deliver, "report sent");

    Ok(())
}
