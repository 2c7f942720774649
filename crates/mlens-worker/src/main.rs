//! MediaLens command line worker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mlens_media::{check_ffmpeg, check_ffprobe, TokioProcessRunner};
use mlens_worker::{
    attachment_from_path, CommandExecutor, IncomingCommand, LocalTransport, MessageRef,
    RepliedMessage, RequestOutcome, WorkerConfig, WorkerContext,
};

const LOCAL_CHAT: i64 = 0;

#[derive(Parser, Debug)]
#[command(name = "mlens", version, about = "Inspect and crop media files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base directory for per-request workspaces
    #[arg(long, global = true, env = "MLENS_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Directory that receives cropped files
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report file, container, stream and EXIF details
    Inspect {
        /// Media file to inspect
        file: PathBuf,
    },
    /// Center-crop an image or video
    Crop {
        /// Media file to crop
        file: PathBuf,
        /// Target size as WIDTHxHEIGHT or WIDTH:HEIGHT
        dims: Option<String>,
    },
}

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("mlens=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();

    let mut config = WorkerConfig::from_env();
    if let Some(work_dir) = cli.work_dir {
        config = config.with_work_dir(work_dir);
    }
    info!("Worker config: {:?}", config);

    if let Err(e) = check_ffmpeg(&config.ffmpeg_bin) {
        warn!("{}; video crops will fail", e);
    }
    if let Err(e) = check_ffprobe(&config.ffprobe_bin) {
        warn!("{}; reports will omit technical details", e);
    }

    let (file, argument, is_crop) = match cli.command {
        Commands::Inspect { file } => (file, None, false),
        Commands::Crop { file, dims } => (file, dims, true),
    };

    let attachment = attachment_from_path(&file)
        .await
        .with_context(|| format!("Cannot read {}", file.display()))?;

    let command = IncomingCommand {
        message: MessageRef::new(LOCAL_CHAT, 0),
        argument,
        replied: Some(RepliedMessage {
            message: MessageRef::new(LOCAL_CHAT, -1),
            attachment: Some(attachment),
        }),
    };

    let transport = Arc::new(LocalTransport::new(cli.output_dir));
    let ctx = WorkerContext::new(config, transport, Arc::new(TokioProcessRunner));
    let executor = Arc::new(CommandExecutor::new(ctx));

    let signal_executor = executor.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_executor.shutdown();
        }
    });

    let outcome = if is_crop {
        executor.crop(&command).await
    } else {
        executor.inspect(&command).await
    };

    info!(?outcome, "Request finished");
    if outcome != RequestOutcome::Completed {
        std::process::exit(1);
    }
    Ok(())
}
