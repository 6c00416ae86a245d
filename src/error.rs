use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can go wrong between reading the config and the last csv hitting disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("End cannot be earlier than start: {end} < {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Could not transform report response: {0}")]
    Transform(String),

    #[error("Failed to write csv {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reporting request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
