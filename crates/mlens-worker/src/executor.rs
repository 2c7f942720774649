//! Command executor.
//!
//! Each command is one request: validate, post a progress status, run the
//! pipeline inside a private workspace, clean the workspace, then report
//! the result to the user.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

use mlens_media::{Cropper, ProcessRunner, Prober, RequestWorkspace};
use mlens_models::{Attachment, CropRequest, RequestId};

use crate::config::WorkerConfig;
use crate::crop_job;
use crate::error::{WorkerError, WorkerResult};
use crate::inspect;
use crate::logging::RequestLogger;
use crate::report::escape_html;
use crate::status::{reply_ephemeral, ProgressStatus};
use crate::transport::{IncomingCommand, RepliedMessage, Transport};

/// Shared collaborators for the pipelines.
pub struct WorkerContext {
    pub config: WorkerConfig,
    pub transport: Arc<dyn Transport>,
    pub prober: Prober,
    pub cropper: Cropper,
}

impl WorkerContext {
    pub fn new(
        config: WorkerConfig,
        transport: Arc<dyn Transport>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        let prober = Prober::new(runner.clone()).with_program(config.ffprobe_bin.clone());
        let cropper = Cropper::new(runner)
            .with_ffmpeg(config.ffmpeg_bin.clone())
            .with_ffprobe(config.ffprobe_bin.clone());
        Self {
            config,
            transport,
            prober,
            cropper,
        }
    }
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Result delivered
    Completed,
    /// Failed validation; nothing was downloaded
    Rejected,
    /// A stage failed after validation
    Failed,
    /// Shutdown was signalled mid-request
    Cancelled,
}

enum Job<'a> {
    Inspect {
        replied: &'a RepliedMessage,
        attachment: &'a Attachment,
    },
    Crop {
        replied: &'a RepliedMessage,
        attachment: &'a Attachment,
        request: CropRequest,
    },
}

impl Job<'_> {
    fn initial_status(&self) -> &'static str {
        match self {
            Job::Inspect { .. } => inspect::DOWNLOADING_STATUS,
            Job::Crop { .. } => crop_job::DOWNLOADING_STATUS,
        }
    }

    fn failure_heading(&self) -> &'static str {
        match self {
            Job::Inspect { .. } => inspect::FAILURE_HEADING,
            Job::Crop { .. } => crop_job::FAILURE_HEADING,
        }
    }
}

/// Runs inspection and crop commands.
pub struct CommandExecutor {
    ctx: WorkerContext,
    shutdown: watch::Sender<bool>,
}

impl CommandExecutor {
    pub fn new(ctx: WorkerContext) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { ctx, shutdown }
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    /// Signal shutdown. Requests in flight stop at their next suspension
    /// point and still clean their workspace.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Handle an inspection command.
    pub async fn inspect(&self, command: &IncomingCommand) -> RequestOutcome {
        let request_id = RequestId::new();
        let logger = RequestLogger::new(&request_id, "inspect");
        let span = logger.span();

        async {
            logger.received();
            match inspect::validate_inspect(command) {
                Ok((replied, attachment)) => {
                    logger.accepted(&attachment.kind);
                    let job = Job::Inspect {
                        replied,
                        attachment,
                    };
                    self.execute(&request_id, command, job, &logger).await
                }
                Err(e) => self.reject(command, e, &logger).await,
            }
        }
        .instrument(span)
        .await
    }

    /// Handle a crop command.
    pub async fn crop(&self, command: &IncomingCommand) -> RequestOutcome {
        let request_id = RequestId::new();
        let logger = RequestLogger::new(&request_id, "crop");
        let span = logger.span();

        async {
            logger.received();
            match crop_job::validate_crop(command, &self.ctx.config.command_prefix) {
                Ok((replied, attachment, request)) => {
                    logger.accepted(&attachment.kind);
                    let job = Job::Crop {
                        replied,
                        attachment,
                        request,
                    };
                    self.execute(&request_id, command, job, &logger).await
                }
                Err(e) => self.reject(command, e, &logger).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn reject(
        &self,
        command: &IncomingCommand,
        error: WorkerError,
        logger: &RequestLogger,
    ) -> RequestOutcome {
        logger.rejected(&error.user_message());
        if let Err(e) = reply_ephemeral(
            self.ctx.transport.clone(),
            command.message,
            &error.user_message(),
            self.ctx.config.error_visible_duration,
        )
        .await
        {
            logger.messaging_failed("send rejection", &e);
        }
        RequestOutcome::Rejected
    }

    async fn execute(
        &self,
        request_id: &RequestId,
        command: &IncomingCommand,
        job: Job<'_>,
        logger: &RequestLogger,
    ) -> RequestOutcome {
        let status = match ProgressStatus::post(
            self.ctx.transport.clone(),
            command.message,
            job.initial_status(),
        )
        .await
        {
            Ok(status) => status,
            Err(e) => {
                logger.messaging_failed("post status", &e);
                return RequestOutcome::Failed;
            }
        };

        let result = match RequestWorkspace::create(&self.ctx.config.work_dir, request_id).await {
            Ok(mut workspace) => {
                let mut cancel_rx = self.shutdown.subscribe();
                let result = tokio::select! {
                    result = self.run_job(&job, &status, &mut workspace, logger) => result,
                    _ = wait_for_shutdown(&mut cancel_rx) => Err(WorkerError::Cancelled),
                };
                let removed = workspace.cleanup().await;
                logger.cleaned(removed);
                result
            }
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => {
                status.finish(command.message).await;
                logger.completed();
                RequestOutcome::Completed
            }
            Err(e) => {
                logger.failed(&e);
                let text = failure_text(job.failure_heading(), &e);
                let _ = status
                    .fail(&text, self.ctx.config.error_visible_duration)
                    .await;
                if e.is_cancelled() {
                    RequestOutcome::Cancelled
                } else {
                    RequestOutcome::Failed
                }
            }
        }
    }

    async fn run_job(
        &self,
        job: &Job<'_>,
        status: &ProgressStatus,
        workspace: &mut RequestWorkspace,
        logger: &RequestLogger,
    ) -> WorkerResult<()> {
        match job {
            Job::Inspect {
                replied,
                attachment,
            } => {
                inspect::run_inspection(&self.ctx, replied, attachment, status, workspace, logger)
                    .await
            }
            Job::Crop {
                replied,
                attachment,
                request,
            } => {
                crop_job::run_crop(
                    &self.ctx, replied, attachment, *request, status, workspace, logger,
                )
                .await
            }
        }
    }
}

/// Error text shown in place of the progress status.
pub fn failure_text(heading: &str, error: &WorkerError) -> String {
    format!(
        "<b>Error:</b> {}\n<code>{}</code>",
        heading,
        escape_html(&error.user_message())
    )
}

/// Resolve once shutdown is signalled. Never resolves if the sender is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
