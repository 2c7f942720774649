//! Media inspection and crop worker.
//!
//! This crate provides:
//! - Request validation for the inspect and crop commands
//! - Download, probe, crop and delivery pipelines over a [`Transport`]
//! - Progress status messages and self-removing error replies
//! - Per-request workspaces that are always cleaned up
//! - Graceful cancellation on shutdown

pub mod config;
pub mod crop_job;
pub mod error;
pub mod executor;
pub mod inspect;
pub mod local_transport;
pub mod logging;
pub mod report;
pub mod status;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{CommandExecutor, RequestOutcome, WorkerContext};
pub use local_transport::{attachment_from_path, LocalTransport};
pub use logging::{RequestLogger, Stage};
pub use report::{build_report, escape_html};
pub use transport::{IncomingCommand, MessageRef, RepliedMessage, Transport, TransportError};
