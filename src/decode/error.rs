use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open GRIB file {0:?}")]
    GribOpen(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode GRIB file {path:?}: {message}")]
    Grib { path: PathBuf, message: String },

    #[error("Field '{field}' not found in {path:?}")]
    FieldNotFound { path: PathBuf, field: String },

    #[error("Grid of {path:?} does not match the geometry of previously decoded files")]
    GeometryMismatch { path: PathBuf },

    #[error("Failed to extract archive {0:?}")]
    ArchiveExtract(PathBuf, #[source] std::io::Error),

    #[error("Failed to start decoder {exe:?} for {file:?}")]
    DecoderSpawn {
        exe: PathBuf,
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Decoder exited with {status} for {file:?}: {stderr}")]
    DecoderFailed {
        file: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Failed to read decoded report {0:?}")]
    ReportRead(PathBuf, #[source] std::io::Error),

    #[error("Malformed report {path:?} at line {line}: {message}")]
    MalformedReport {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Column '{column}' missing from report {path:?}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid report time '{value}' in {path:?}")]
    InvalidTimestamp {
        path: PathBuf,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Polars error while building observations: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),

    #[error("Blocking decode task failed")]
    TaskJoin(#[from] tokio::task::JoinError),
}
