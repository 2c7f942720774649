//! EXIF extraction from still images.
//!
//! Unreadable files and files without a metadata block both yield an empty
//! map.

use exif::{Field, In, Reader, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use mlens_models::ExifMap;

/// Extract EXIF tags from `path` on the blocking pool.
pub async fn extract_exif(path: impl AsRef<Path>) -> ExifMap {
    let path: PathBuf = path.as_ref().to_path_buf();
    let path_text = path.display().to_string();

    match tokio::task::spawn_blocking(move || read_exif(&path)).await {
        Ok(map) => map,
        Err(e) => {
            warn!(path = %path_text, error = %e, "EXIF extraction task failed");
            ExifMap::new()
        }
    }
}

/// Blocking EXIF read.
pub fn read_exif(path: &Path) -> ExifMap {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Could not open file for EXIF");
            return ExifMap::new();
        }
    };

    let mut reader = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No EXIF data");
            return ExifMap::new();
        }
    };

    exif.fields()
        .filter(|field| field.ifd_num == In::PRIMARY)
        .map(|field| (tag_name(field), field_value(field)))
        .collect()
}

/// Registered tag name, or the numeric tag id.
fn tag_name(field: &Field) -> String {
    if field.tag.description().is_some() {
        field.tag.to_string()
    } else {
        field.tag.number().to_string()
    }
}

fn field_value(field: &Field) -> String {
    match &field.value {
        Value::Undefined(bytes, _) | Value::Byte(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => text.trim_end_matches('\0').to_string(),
            Err(_) => field.display_value().to_string(),
        },
        Value::Ascii(parts) => parts
            .iter()
            .map(|part| String::from_utf8_lossy(part).into_owned())
            .collect::<Vec<_>>()
            .join(", "),
        _ => field.display_value().to_string(),
    }
}
