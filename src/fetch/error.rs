use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to create archive directory {0:?}")]
    ArchiveDirCreation(PathBuf, #[source] std::io::Error),

    #[error("URL '{0}' does not end in a file name")]
    InvalidUrl(String),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Covers both the response stream and the local file
    #[error("Failed writing {url} to {path:?}")]
    DownloadIo {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download batch did not finish within {0:?}")]
    BatchTimeout(Duration),
}
