//! JSON file persistence
//!
//! Every store in the relay is a single JSON document read fully into memory.
//! Writes go to a sibling temp file which is then renamed over the original,
//! so a crash mid-write leaves either the old or the new document on disk.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::utils::error::StorageError;

/// Load a JSON document, returning `T::default()` when the file is missing or empty
pub async fn load_json<T>(path: &Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(StorageError::io(path.display(), e)),
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    let value = serde_json::from_str(&content)
        .map_err(|e| StorageError::corrupt(path.display(), e))?;

    tracing::debug!(path = %path.display(), "Store loaded");
    Ok(value)
}

/// Write a JSON document atomically (temp file + rename)
pub async fn save_json<T>(path: &Path, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent.display(), e))?;
    }

    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| StorageError::corrupt(path.display(), e))?;

    let temp_path = temp_path_for(path);
    tokio::fs::write(&temp_path, json)
        .await
        .map_err(|e| StorageError::io(temp_path.display(), e))?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| StorageError::io(path.display(), e))?;

    tracing::debug!(path = %path.display(), "Store saved");
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
