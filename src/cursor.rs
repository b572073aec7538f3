//! Resume position for the sequential id rescan.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::db::persist::write_atomically;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("Failed to access cursor file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cursor file {path} does not hold an integer: {content:?}")]
    Parse { path: PathBuf, content: String },
}

/// A single persisted integer marking how far a rescan has progressed.
pub trait ResumeCursor {
    /// The stored position, or `None` if nothing has been written yet.
    ///
    /// A cursor that exists but holds no number is an error, not a fresh
    /// start.
    fn read(&self) -> Result<Option<u64>, CursorError>;

    fn write(&mut self, position: u64) -> Result<(), CursorError>;
}

/// Cursor kept as a decimal number in a small text file.
#[derive(Debug, Clone)]
pub struct FileCursor {
    path: PathBuf,
}

impl FileCursor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CursorError {
        CursorError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResumeCursor for FileCursor {
    fn read(&self) -> Result<Option<u64>, CursorError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let trimmed = content.trim();
        trimmed
            .parse()
            .map(Some)
            .map_err(|_| CursorError::Parse {
                path: self.path.clone(),
                content: trimmed.to_string(),
            })
    }

    fn write(&mut self, position: u64) -> Result<(), CursorError> {
        write_atomically(&self.path, position.to_string().as_bytes())
            .map_err(|e| self.io_error(e))
    }
}

/// Cursor held in memory only; useful for one-off rescans and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    position: Option<u64>,
    pub history: Vec<u64>,
}

impl MemoryCursor {
    #[must_use]
    pub fn starting_at(position: u64) -> Self {
        Self {
            position: Some(position),
            history: Vec::new(),
        }
    }
}

impl ResumeCursor for MemoryCursor {
    fn read(&self) -> Result<Option<u64>, CursorError> {
        Ok(self.position)
    }

    fn write(&mut self, position: u64) -> Result<(), CursorError> {
        self.position = Some(position);
        self.history.push(position);
        Ok(())
    }
}
