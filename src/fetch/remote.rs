use crate::fetch::error::FetchError;
use futures_util::TryStreamExt;
use log::{debug, warn};
use reqwest::Client;
use std::future::Future;
use std::io;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Transfers one remote file to a local path.
///
/// The fetcher calls this only for files that are not cached yet. Implementations
/// must either leave a complete file at `destination` or no file at all.
pub trait RemoteFetch: Send + Sync {
    /// Downloads `url` to `destination` and returns the number of bytes written.
    fn fetch(
        &self,
        url: &str,
        destination: &Path,
    ) -> impl Future<Output = Result<u64, FetchError>> + Send;
}

/// HTTP GET through `reqwest`, streamed to a temporary file next to the destination and
/// renamed into place once the body has been fully received.
#[derive(Debug, Clone, Default)]
pub struct HttpFetch {
    client: Client,
}

impl HttpFetch {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl RemoteFetch for HttpFetch {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        debug!("Downloading {} to {:?}", url, destination);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let io_error = |source: io::Error| FetchError::DownloadIo {
            url: url.to_string(),
            path: destination.to_path_buf(),
            source,
        };

        let dir = destination.parent().unwrap_or_else(|| Path::new("."));
        let partial = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(dir)
            .map_err(io_error)?;
        let mut file = tokio::fs::File::from_std(partial.reopen().map_err(io_error)?);

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        drop(file);

        // A dropped NamedTempFile deletes itself, so failed transfers leave nothing behind
        partial
            .persist(destination)
            .map_err(|e| io_error(e.error))?;
        Ok(written)
    }
}
