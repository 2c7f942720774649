//! Media descriptor built once per request from the fetched attachment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::attachment::Attachment;

const NOT_AVAILABLE: &str = "N/A";

/// File facts shown in the report's File Information section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub name: String,
    /// Uppercased suffix of `name`; `"N/A"` when the name has no dot at all
    pub extension: String,
    pub mime_type: String,
    /// Declared size in bytes
    pub size: u64,
    /// Local path of the downloaded copy
    pub path: PathBuf,
}

impl MediaDescriptor {
    /// Describe a downloaded attachment.
    ///
    /// The declared file name wins; otherwise the downloaded file's base
    /// name is used.
    pub fn from_download(attachment: &Attachment, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = attachment
            .file_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            extension: extension_of(&name),
            mime_type: attachment
                .mime_type
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            size: attachment.file_size,
            path: path.to_path_buf(),
            name,
        }
    }
}

/// Suffix after the last dot of the base name. Leading dots do not start a
/// suffix, so `.bashrc` and `archive.` have an empty extension.
fn extension_of(name: &str) -> String {
    if !name.contains('.') {
        return NOT_AVAILABLE.to_string();
    }
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.trim_start_matches('.').rsplit_once('.') {
        Some((_, ext)) => ext.to_uppercase(),
        None => String::new(),
    }
}
