use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One remote file to retrieve, together with the times it describes.
///
/// Tasks are produced by [`crate::schedule::time_grid::build_download_tasks`] and are
/// the unit of work for the fetcher and the decoders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    /// `analysis_time + forecast_hour`.
    pub valid_time: DateTime<Utc>,
    /// The time the forecast run (or observation day) starts from.
    pub analysis_time: DateTime<Utc>,
    /// Hours after the analysis time. Always 0 for observations.
    pub forecast_hour: u32,
    pub url: String,
}

impl DownloadTask {
    /// The last path segment of the URL; this is also the name of the cached file.
    pub fn file_name(&self) -> Option<&str> {
        file_name_from_url(&self.url)
    }
}

/// Returns the basename of a URL, ignoring any query string.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
