//! Error types for the file-backed cache

use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CacheError {
    EmptyKey,
    Codec(String),
    Write { path: PathBuf, source: io::Error },
    NotFound(PathBuf),
    Delete { path: PathBuf, source: io::Error },
    Io(Box<io::Error>),
    Task(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::EmptyKey => write!(f, "Cache key must not be empty"),
            CacheError::Codec(msg) => write!(f, "Codec error: {}", msg),
            CacheError::Write { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            CacheError::NotFound(path) => write!(f, "No cache entry at {}", path.display()),
            CacheError::Delete { path, source } => {
                write!(f, "Failed to delete {}: {}", path.display(), source)
            }
            CacheError::Io(err) => write!(f, "IO error: {}", err),
            CacheError::Task(msg) => write!(f, "Blocking task failed: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Write { source, .. } | CacheError::Delete { source, .. } => Some(source),
            CacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for CacheError {
    fn from(err: io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
