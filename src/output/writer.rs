// src/output/writer.rs
//! Executes output operations by performing actual I/O.

use crate::error::AppError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `value` as pretty JSON (2-space indent, trailing newline).
///
/// The content goes to a temporary sibling first and is renamed into place,
/// so readers never observe a half-written file.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<usize, AppError> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path);
    log::debug!("Writing {} bytes to {}", content.len(), staging.display());
    fs::write(&staging, &content)?;
    fs::rename(&staging, path)?;

    log::info!("Wrote file: {}", path.display());
    Ok(content.len())
}

/// Empties `path`, creating it if needed.
pub fn reset_dir(path: &Path) -> Result<(), AppError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("Path exists but is not a directory: {}", path.display()),
            )));
        }
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    log::debug!("Reset directory: {}", path.display());
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_pretty_json_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src/data/faq.json");

        write_json_pretty(&path, &json!([{"id": 1, "question": "Q"}])).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "[\n  {\n    \"id\": 1,\n    \"question\": \"Q\"\n  }\n]\n");
        assert!(!dir.path().join("src/data/faq.json.tmp").exists());
    }

    #[test]
    fn reset_dir_removes_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        fs::create_dir_all(&images).unwrap();
        fs::write(images.join("stale.jpg"), b"x").unwrap();

        reset_dir(&images).unwrap();

        assert!(images.is_dir());
        assert_eq!(fs::read_dir(&images).unwrap().count(), 0);
    }
}
