use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Writes a record as a pretty-printed JSON document.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DocumentError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|e| DocumentError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    text.push('\n');
    std::fs::write(path, text).map_err(|e| DocumentError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| DocumentError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}
