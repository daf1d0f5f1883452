//! Profile document persistence
//!
//! The exported Server Configuration Profile is an opaque blob to this tool:
//! it is read, written and transported, never interpreted. Read/write
//! failures fail the operation loudly — a missing template must never be
//! silently skipped.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::constants::defaults;
use crate::errors::OperationError;

pub async fn read_profile(path: &Path) -> Result<Vec<u8>, OperationError> {
    let bytes = fs::read(path).await.map_err(|e| OperationError::Persistence {
        path: path.display().to_string(),
        detail: format!("read failed: {}", e),
    })?;

    if bytes.is_empty() {
        return Err(OperationError::Persistence {
            path: path.display().to_string(),
            detail: "profile file is empty".to_string(),
        });
    }

    Ok(bytes)
}

pub async fn write_profile(path: &Path, bytes: &[u8]) -> Result<(), OperationError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OperationError::Persistence {
                    path: path.display().to_string(),
                    detail: format!("creating parent directory failed: {}", e),
                })?;
        }
    }

    fs::write(path, bytes)
        .await
        .map_err(|e| OperationError::Persistence {
            path: path.display().to_string(),
            detail: format!("write failed: {}", e),
        })?;

    info!(
        "  Profile written to {} ({:.1} KB)",
        path.display(),
        bytes.len() as f64 / 1024.0
    );
    Ok(())
}

/// Auto-generated path for export-only groups without a configured template:
/// `templates/scp_<ip-with-underscores>_<UTC timestamp>.<ext>`.
pub fn default_export_path(host: &str, format: &str) -> PathBuf {
    let safe_host: String = host
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let ext = format.to_ascii_lowercase();
    PathBuf::from(defaults::TEMPLATE_DIR).join(format!("scp_{}_{}.{}", safe_host, timestamp, ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/template.xml");

        write_profile(&path, b"<SystemConfiguration/>").await.unwrap();
        let bytes = read_profile(&path).await.unwrap();
        assert_eq!(bytes, b"<SystemConfiguration/>");
    }

    #[tokio::test]
    async fn missing_file_is_a_persistence_error() {
        let err = read_profile(Path::new("/nonexistent/template.xml"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "persistence");
    }

    #[tokio::test]
    async fn empty_file_is_a_persistence_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xml");
        fs::write(&path, b"").await.unwrap();

        let err = read_profile(&path).await.unwrap_err();
        assert_eq!(err.kind(), "persistence");
    }

    #[test]
    fn default_path_encodes_host_and_format() {
        let path = default_export_path("192.168.1.10", "XML");
        let rendered = path.to_string_lossy().to_string();
        assert!(rendered.starts_with("templates/scp_192_168_1_10_"));
        assert!(rendered.ends_with(".xml"));
    }
}
