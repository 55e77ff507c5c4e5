use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LessonError {
    #[error("{path}: line {line}: {message}", path = .path.display())]
    ConfigFormat {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Missing {what}: {path}", path = .path.display())]
    MissingResource { what: &'static str, path: PathBuf },

    #[error("{tool} failed: {detail}")]
    ExternalProcess { tool: String, detail: String },

    #[error("{audio} audio slot(s) but {images} image slot(s); truncating to the shorter list")]
    CountMismatch { audio: usize, images: usize },

    #[error("Not enough raw files in {folder}: placed {placed}, fragment counts require {required}", folder = .folder.display())]
    PoolExhausted {
        folder: PathBuf,
        placed: usize,
        required: usize,
    },

    #[error("Nothing to assemble: no audio/image pairs left after matching")]
    EmptyTimeline,

    #[error("I/O error on {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LessonError {
    pub fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        LessonError::MissingResource {
            what,
            path: path.into(),
        }
    }

    pub fn format(path: &Path, line: usize, message: impl Into<String>) -> Self {
        LessonError::ConfigFormat {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub fn process(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        LessonError::ExternalProcess {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

/// Attach the offending path to an `io::Error`.
pub trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T, LessonError>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T, LessonError> {
        self.map_err(|source| LessonError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
