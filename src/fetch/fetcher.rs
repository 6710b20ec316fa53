//! Populates the archive directory with the files a retrieval needs.
//!
//! The archive is a flat directory keyed by the remote file name: a file that already
//! exists there is a cache hit and is never downloaded again. Missing files are
//! downloaded concurrently, each with its own retry budget, and the whole batch is
//! bounded by a timeout.

use crate::fetch::error::FetchError;
use crate::fetch::remote::{HttpFetch, RemoteFetch};
use crate::types::download_task::file_name_from_url;
use futures_util::{stream, StreamExt};
use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Download tuning.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum number of downloads in flight.
    pub concurrency: usize,
    /// Retries after the first failed attempt of a file.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Budget for the whole batch.
    pub batch_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            batch_timeout: Duration::from_secs(600),
        }
    }
}

/// What happened to one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was already in the archive directory.
    Cached,
    Downloaded { bytes: u64, attempts: u32 },
    Failed { attempts: u32, error: String },
}

/// Per-URL outcomes of a batch, in request order.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub outcomes: Vec<(String, FetchOutcome)>,
}

impl FetchReport {
    pub fn failed_urls(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, FetchOutcome::Failed { .. }))
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn cached_count(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Cached))
    }

    pub fn downloaded_count(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Downloaded { .. }))
    }

    pub fn is_complete(&self) -> bool {
        self.failed_urls().is_empty()
    }

    fn count(&self, predicate: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }
}

pub struct Fetcher<R = HttpFetch> {
    remote: R,
    config: FetchConfig,
}

impl Fetcher<HttpFetch> {
    pub fn new() -> Self {
        Self::with_remote(HttpFetch::new(), FetchConfig::default())
    }
}

impl Default for Fetcher<HttpFetch> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RemoteFetch> Fetcher<R> {
    pub fn with_remote(remote: R, config: FetchConfig) -> Self {
        Self { remote, config }
    }

    /// Makes sure every URL has a file in `archive_dir`, creating the directory first.
    ///
    /// Individual download failures do not abort the batch; they are reported as
    /// [`FetchOutcome::Failed`]. Errors are returned only for an unusable archive
    /// directory, a URL without a file name, or an exhausted batch timeout.
    pub async fn fetch_all(
        &self,
        urls: &[String],
        archive_dir: &Path,
    ) -> Result<FetchReport, FetchError> {
        fs::create_dir_all(archive_dir)
            .await
            .map_err(|e| FetchError::ArchiveDirCreation(archive_dir.to_path_buf(), e))?;

        let mut seen = HashSet::new();
        let mut jobs: Vec<(usize, String, PathBuf)> = Vec::with_capacity(urls.len());
        for url in urls {
            let name =
                file_name_from_url(url).ok_or_else(|| FetchError::InvalidUrl(url.clone()))?;
            if seen.insert(url.as_str()) {
                jobs.push((jobs.len(), url.clone(), archive_dir.join(name)));
            }
        }

        let batch = stream::iter(jobs)
            .map(|(index, url, path)| async move {
                let outcome = self.fetch_one(&url, &path).await;
                (index, url, outcome)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect::<Vec<_>>();

        let mut finished = tokio::time::timeout(self.config.batch_timeout, batch)
            .await
            .map_err(|_| FetchError::BatchTimeout(self.config.batch_timeout))?;
        finished.sort_by_key(|(index, _, _)| *index);

        let report = FetchReport {
            outcomes: finished
                .into_iter()
                .map(|(_, url, outcome)| (url, outcome))
                .collect(),
        };
        info!(
            "Archive {:?}: {} cached, {} downloaded, {} failed",
            archive_dir,
            report.cached_count(),
            report.downloaded_count(),
            report.failed_urls().len()
        );
        Ok(report)
    }

    async fn fetch_one(&self, url: &str, path: &Path) -> FetchOutcome {
        if fs::metadata(path).await.is_ok() {
            info!("Cache hit for {} at {:?}", url, path);
            return FetchOutcome::Cached;
        }

        let mut attempts = 0;
        let mut delay = self.config.initial_backoff;
        loop {
            attempts += 1;
            match self.remote.fetch(url, path).await {
                Ok(bytes) => {
                    info!("Downloaded {} ({} bytes) to {:?}", url, bytes, path);
                    return FetchOutcome::Downloaded { bytes, attempts };
                }
                Err(e) if attempts > self.config.max_retries => {
                    warn!("Giving up on {} after {} attempts: {}", url, attempts, e);
                    return FetchOutcome::Failed {
                        attempts,
                        error: e.to_string(),
                    };
                }
                Err(e) => {
                    warn!(
                        "Attempt {} for {} failed: {}; retrying in {:?}",
                        attempts, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.config.max_backoff);
                }
            }
        }
    }
}
