use std::path::PathBuf;

use thiserror::Error;

use crate::surface::SurfaceError;

#[derive(Debug, Error)]
pub enum ExperimentError {
    /// A catalog, question, instructions or configuration file is absent.
    #[error("\"{}\" is not found.", path.display())]
    MissingResource { path: PathBuf },

    #[error("{}:{line}: {message}", path.display())]
    Catalog {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("{}:{line}: {message}", path.display())]
    Questions {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// The presentation surface went away mid-run. Unrecoverable.
    #[error("presentation surface failed: {0}")]
    Surface(#[from] SurfaceError),
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
