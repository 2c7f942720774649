//! Per-request temporary file tracking.
//!
//! Every path a request creates is registered in a [`TempFileSet`] owned by
//! the request's [`RequestWorkspace`]. The workspace is cleaned explicitly
//! with [`RequestWorkspace::cleanup`] on every exit path; if it is dropped
//! without that call (panic, aborted task) `Drop` removes what it can
//! synchronously.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

use mlens_models::RequestId;

use crate::error::MediaResult;

/// Paths owned by one request.
#[derive(Debug, Default)]
pub struct TempFileSet {
    paths: Vec<PathBuf>,
}

impl TempFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path. Registering the same path twice is a no-op.
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Remove every tracked path and clear the set.
    ///
    /// Missing paths are skipped silently; other failures are logged and
    /// never returned. Returns the number of files actually removed.
    pub async fn remove_all(&mut self) -> usize {
        let mut removed = 0;
        for path in self.paths.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed temp file");
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temp file"),
            }
        }
        removed
    }

    /// Blocking variant of [`remove_all`](Self::remove_all) for use in `Drop`.
    pub fn remove_all_blocking(&mut self) -> usize {
        let mut removed = 0;
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temp file"),
            }
        }
        removed
    }
}

/// Private working directory for one request.
#[derive(Debug)]
pub struct RequestWorkspace {
    request_id: RequestId,
    dir: Option<TempDir>,
    files: TempFileSet,
}

impl RequestWorkspace {
    /// Create a fresh directory under `base_dir`, prefixed with the request id.
    pub async fn create(base_dir: impl AsRef<Path>, request_id: &RequestId) -> MediaResult<Self> {
        let base_dir = base_dir.as_ref();
        tokio::fs::create_dir_all(base_dir).await?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", request_id.short()))
            .tempdir_in(base_dir)?;

        debug!(
            request_id = %request_id,
            path = %dir.path().display(),
            "Created request workspace"
        );

        Ok(Self {
            request_id: request_id.clone(),
            dir: Some(dir),
            files: TempFileSet::new(),
        })
    }

    /// Directory path. Empty once the workspace has been cleaned.
    pub fn path(&self) -> &Path {
        self.dir.as_ref().map(TempDir::path).unwrap_or_else(|| Path::new(""))
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Register a path for removal at the end of the request.
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        self.files.register(path);
    }

    pub fn files(&self) -> &TempFileSet {
        &self.files
    }

    /// Remove every registered file and the directory itself.
    ///
    /// Failures are logged and swallowed.
    pub async fn cleanup(mut self) -> usize {
        let removed = self.files.remove_all().await;

        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match tokio::task::spawn_blocking(move || dir.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove workspace")
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Workspace removal task failed"),
            }
        }

        debug!(request_id = %self.request_id, removed, "Request workspace cleaned");
        removed
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        if self.dir.is_some() {
            warn!(
                request_id = %self.request_id,
                "RequestWorkspace dropped without cleanup() - removing synchronously"
            );
            self.files.remove_all_blocking();
            // TempDir removes the directory when it drops after this.
        }
    }
}
