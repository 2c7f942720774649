//! Crop pipeline: validate, download, crop, deliver.

use mlens_media::RequestWorkspace;
use mlens_models::{Attachment, CropDimensions, CropRequest, CropSource, UnsupportedAttachment};

use crate::error::{WorkerError, WorkerResult};
use crate::executor::WorkerContext;
use crate::logging::{RequestLogger, Stage};
use crate::status::ProgressStatus;
use crate::transport::{IncomingCommand, RepliedMessage};

pub const ANIMATED_MESSAGE: &str = "GIFs are not supported by this tool.";
pub const NOT_MEDIA_MESSAGE: &str = "Please reply to an image or video to crop it.";
pub const DOWNLOADING_STATUS: &str = "<code>Downloading media...</code>";
pub const SENDING_STATUS: &str = "<code>Sending media...</code>";
pub const FAILURE_HEADING: &str = "Could not crop media.";

fn usage_message(prefix: &str) -> String {
    format!("<b>Usage:</b> {prefix}crop [width]x[height]")
}

fn invalid_format_message(prefix: &str) -> String {
    format!("Invalid format. Use `{prefix}crop [width]x[height]`.")
}

pub fn cropping_status(dims: CropDimensions) -> String {
    format!("<code>Cropping to {dims}...</code>")
}

/// Check the replied attachment and the dimension argument.
///
/// Animated attachments are rejected before the argument is looked at.
pub fn validate_crop<'a>(
    command: &'a IncomingCommand,
    prefix: &str,
) -> WorkerResult<(&'a RepliedMessage, &'a Attachment, CropRequest)> {
    let (replied, attachment) = command
        .replied_attachment()
        .ok_or_else(|| WorkerError::user_input(NOT_MEDIA_MESSAGE))?;

    let source = attachment.crop_source().map_err(|e| match e {
        UnsupportedAttachment::Animated => WorkerError::user_input(ANIMATED_MESSAGE),
        UnsupportedAttachment::NotCroppable(_) => WorkerError::user_input(NOT_MEDIA_MESSAGE),
    })?;

    let argument = command
        .argument()
        .ok_or_else(|| WorkerError::user_input(usage_message(prefix)))?;

    let dims: CropDimensions = argument
        .parse()
        .map_err(|_| WorkerError::user_input(invalid_format_message(prefix)))?;

    Ok((replied, attachment, CropRequest::new(dims, source)))
}

/// Run the crop stages inside `workspace`.
pub(crate) async fn run_crop(
    ctx: &WorkerContext,
    replied: &RepliedMessage,
    attachment: &Attachment,
    request: CropRequest,
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

    status.update(&cropping_status(request.dimensions)).await;
    let output = ctx.cropper.crop(request, &input, workspace).await?;
    logger.stage(Stage::Crop, &format!("cropped to {}", request.dimensions));

    status.update(SENDING_STATUS).await;
    let caption = request.caption();
    let chat_id = replied.message.chat_id;
    let reply_to = Some(replied.message.message_id);
    match request.source {
        CropSource::Image => {
            ctx.transport
                .send_photo(chat_id, &output, &caption, reply_to)
                .await?
        }
        CropSource::Video => {
            ctx.transport
                .send_video(chat_id, &output, &caption, reply_to)
                .await?
        }
    };
    logger.stage(Stage::Deliver, &format!("sent {} with caption", request.source));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MessageRef;
    use mlens_models::AttachmentKind;

    fn command(kind: Option<AttachmentKind>, argument: Option<&str>) -> IncomingCommand {
        IncomingCommand {
            message: MessageRef::new(1, 2),
            argument: argument.map(str::to_string),
            replied: Some(RepliedMessage {
                message: MessageRef::new(1, 1),
                attachment: kind.map(|k| Attachment::new(k, "file")),
            }),
        }
    }

    fn rejection(cmd: &IncomingCommand) -> String {
        validate_crop(cmd, ".").unwrap_err().user_message()
    }

    #[test]
    fn test_valid_requests() {
        let cmd = command(Some(AttachmentKind::Image), Some("1280x720"));
        let (_, _, request) = validate_crop(&cmd, ".").unwrap();
        assert_eq!(request.dimensions, CropDimensions::new(1280, 720));
        assert_eq!(request.source, CropSource::Image);

        let cmd = command(Some(AttachmentKind::document("video/webm")), Some("16:9"));
        let (_, _, request) = validate_crop(&cmd, ".").unwrap();
        assert_eq!(request.source, CropSource::Video);
    }

    #[test]
    fn test_animation_rejected_regardless_of_dimensions() {
        for arg in [Some("100x100"), Some("garbage"), None] {
            let cmd = command(Some(AttachmentKind::Animation), arg);
            assert_eq!(rejection(&cmd), ANIMATED_MESSAGE);

            let cmd = command(Some(AttachmentKind::document("image/gif")), arg);
            assert_eq!(rejection(&cmd), ANIMATED_MESSAGE);
        }
    }

    #[test]
    fn test_non_media_rejected() {
        assert_eq!(rejection(&command(None, Some("1x1"))), NOT_MEDIA_MESSAGE);
        assert_eq!(
            rejection(&command(Some(AttachmentKind::Other), Some("1x1"))),
            NOT_MEDIA_MESSAGE
        );
        assert_eq!(
            rejection(&command(Some(AttachmentKind::document("text/plain")), Some("1x1"))),
            NOT_MEDIA_MESSAGE
        );

        let no_reply = IncomingCommand {
            message: MessageRef::new(1, 2),
            argument: Some("1x1".to_string()),
            replied: None,
        };
        assert_eq!(rejection(&no_reply), NOT_MEDIA_MESSAGE);
    }

    #[test]
    fn test_argument_messages() {
        assert_eq!(
            rejection(&command(Some(AttachmentKind::Image), None)),
            "<b>Usage:</b> .crop [width]x[height]"
        );
        assert_eq!(
            rejection(&command(Some(AttachmentKind::Image), Some("big"))),
            "Invalid format. Use `.crop [width]x[height]`."
        );
        assert_eq!(
            validate_crop(&command(Some(AttachmentKind::Image), None), "!")
                .unwrap_err()
                .user_message(),
            "<b>Usage:</b> !crop [width]x[height]"
        );
    }

    #[test]
    fn test_cropping_status() {
        assert_eq!(
            cropping_status(CropDimensions::new(640, 480)),
            "<code>Cropping to 640x480...</code>"
        );
    }
}
