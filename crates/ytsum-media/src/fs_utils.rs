//! Filesystem helpers for transient artifacts.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub async fn remove_if_exists(path: impl AsRef<Path>) -> MediaResult<bool> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Best-effort removal of transient files; failures are logged, not returned.
pub async fn remove_quietly<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        if let Err(e) = remove_if_exists(path).await {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Size of a file in bytes.
pub async fn file_size(path: impl AsRef<Path>) -> MediaResult<u64> {
    let path = path.as_ref();
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(MediaError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => Err(MediaError::from(e)),
    }
}
