//! Save files on disk.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum SaveFileError {
    #[error("Save file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// `<name>_<date>.json`, with anything but alphanumerics, `-` and `_`
/// replaced by `_`.
pub fn save_file_name(character_name: &str, date: NaiveDate) -> String {
    let name: String = character_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = if name.is_empty() {
        "adventurer".to_string()
    } else {
        name
    };
    format!("{}_{}.json", name, date.format("%Y-%m-%d"))
}

/// Write a save as pretty JSON under `dir`, creating it if needed.
pub async fn write_save<T: Serialize>(
    dir: &Path,
    character_name: &str,
    date: NaiveDate,
    save: &T,
) -> Result<PathBuf, SaveFileError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| SaveFileError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let path = dir.join(save_file_name(character_name, date));
    let json = serde_json::to_vec_pretty(save)?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|source| SaveFileError::Io {
            path: path.clone(),
            source,
        })?;

    tracing::info!(path = %path.display(), "Game saved");
    Ok(path)
}

/// Read a save file as untyped JSON; validation happens on restore.
pub async fn read_save(path: &Path) -> Result<Value, SaveFileError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SaveFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(serde_json::from_slice(&bytes)?)
}
