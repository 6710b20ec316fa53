//! The main entry point: turns an analysis window and a list of locations into the
//! nearest forecast values or surface observations.

use crate::decode::error::DecodeError;
use crate::decode::grid_decoder::{decode_gfs, GribSource, GridSource};
use crate::decode::obs_decoder::{decode_obs, DEFAULT_DECODER_EXE};
use crate::error::EsrWeatherError;
use crate::fetch::fetcher::Fetcher;
use crate::fetch::remote::{HttpFetch, RemoteFetch};
use crate::nearest::grid_matcher::nearest_grid_values;
use crate::nearest::obs_matcher::{nearest_observations, DEFAULT_BUFFER_DEGREES};
use crate::schedule::time_grid::build_download_tasks;
use crate::types::bounding_box::BoundingBox;
use crate::types::data_type::DataType;
use crate::types::lat_lon::LatLon;
use crate::types::nearest_data::NearestData;
use bon::bon;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Archive directory used by [`WeatherRetriever::new`], relative to the working directory.
pub const DEFAULT_ARCHIVE_DIR: &str = "weather_data_archive";

/// Downloads, caches, decodes and matches GFS forecasts and GDAS surface observations.
///
/// Downloaded files are kept in the archive directory and reused by later retrievals.
pub struct WeatherRetriever<R = HttpFetch, G = GribSource> {
    archive_dir: PathBuf,
    fetcher: Fetcher<R>,
    grid_source: Arc<G>,
}

impl WeatherRetriever {
    /// Creates a retriever caching into [`DEFAULT_ARCHIVE_DIR`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use esr_weather::WeatherRetriever;
    ///
    /// let retriever = WeatherRetriever::new();
    /// assert!(retriever.archive_dir().ends_with("weather_data_archive"));
    /// ```
    pub fn new() -> Self {
        Self::with_archive_dir(DEFAULT_ARCHIVE_DIR)
    }

    /// Creates a retriever caching into `archive_dir`. The directory is created on the
    /// first retrieval if it does not exist.
    pub fn with_archive_dir(archive_dir: impl Into<PathBuf>) -> Self {
        Self::with_components(archive_dir.into(), Fetcher::new(), GribSource)
    }
}

impl Default for WeatherRetriever {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, G> WeatherRetriever<R, G> {
    /// Creates a retriever with a custom download transport and GRIB reader.
    pub fn with_components(archive_dir: PathBuf, fetcher: Fetcher<R>, grid_source: G) -> Self {
        Self {
            archive_dir,
            fetcher,
            grid_source: Arc::new(grid_source),
        }
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }
}

#[bon]
impl<R, G> WeatherRetriever<R, G>
where
    R: RemoteFetch,
    G: GridSource + 'static,
{
    /// Retrieves the data closest to each location between two analysis times.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.start(&str)`: **Required.** First analysis time, `YYYYMMDDTHH`.
    /// * `.end(&str)`: **Required.** Last analysis time (inclusive), `YYYYMMDDTHH`.
    /// * `.locations(Vec<LatLon>)`: **Required.** Points to match.
    /// * `.forecast_length(u32)`: Optional. Last forecast hour to download. Defaults to `0`
    ///   and must be `0` for observations.
    /// * `.data_type(DataType)`: Optional. Defaults to [`DataType::Gfs`].
    /// * `.base_url(String)`: Optional. Mirror to download from. Defaults to
    ///   [`DataType::default_base_url`].
    /// * `.decoder_exe(PathBuf)`: Optional. BUFR decoder for observations. Defaults to
    ///   `rda-bufr-decode-ADPsfc/exe/bufrsurface.x`.
    /// * `.bounding_box(BoundingBox)`: Optional. Area GFS fields are cropped to.
    ///   Defaults to [`BoundingBox::default`].
    /// * `.buffer_degrees(f64)`: Optional. Half-width of the box searched for stations.
    ///   Defaults to `3.0`.
    ///
    /// # Errors
    ///
    /// * [`EsrWeatherError::Schedule`] for malformed times or a forecast length given
    ///   with observations. Nothing is downloaded in that case.
    /// * [`EsrWeatherError::Download`] listing every URL that could not be fetched.
    /// * [`EsrWeatherError::Decode`] and [`EsrWeatherError::Nearest`] for unreadable
    ///   files and locations without a match.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use esr_weather::{EsrWeatherError, LatLon, WeatherRetriever};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), EsrWeatherError> {
    /// let retriever = WeatherRetriever::new();
    /// let data = retriever
    ///     .retrieve()
    ///     .start("20231001T00")
    ///     .end("20231001T06")
    ///     .locations(vec![LatLon(-41.29, 174.78)])
    ///     .call()
    ///     .await?;
    /// println!("{:?}", data.as_grid());
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    #[allow(clippy::too_many_arguments)]
    pub async fn retrieve(
        &self,
        start: &str,
        end: &str,
        locations: Vec<LatLon>,
        forecast_length: Option<u32>,
        data_type: Option<DataType>,
        base_url: Option<String>,
        decoder_exe: Option<PathBuf>,
        bounding_box: Option<BoundingBox>,
        buffer_degrees: Option<f64>,
    ) -> Result<NearestData, EsrWeatherError> {
        let data_type = data_type.unwrap_or_default();
        let forecast_length = forecast_length.unwrap_or(0);
        let base_url = base_url.unwrap_or_else(|| data_type.default_base_url().to_string());

        let tasks = build_download_tasks(start, end, data_type, &base_url, forecast_length)?;
        info!(
            "Retrieving {} {} files for {} locations",
            tasks.len(),
            data_type,
            locations.len()
        );

        let urls: Vec<String> = tasks.iter().map(|t| t.url.clone()).collect();
        let report = self.fetcher.fetch_all(&urls, &self.archive_dir).await?;
        let failed = report.failed_urls();
        if !failed.is_empty() {
            return Err(EsrWeatherError::Download { failed });
        }
        info!("Download completed into {:?}", self.archive_dir);

        match data_type {
            DataType::Gfs => {
                let bbox = bounding_box.unwrap_or_default();
                let archive_dir = self.archive_dir.clone();
                let source = Arc::clone(&self.grid_source);
                let snapshot = tokio::task::spawn_blocking(move || {
                    decode_gfs(&tasks, &archive_dir, &bbox, source.as_ref())
                })
                .await
                .map_err(DecodeError::from)??;
                Ok(NearestData::Grid(nearest_grid_values(&snapshot, &locations)?))
            }
            DataType::Obs => {
                let exe = decoder_exe.unwrap_or_else(|| PathBuf::from(DEFAULT_DECODER_EXE));
                let table = decode_obs(&tasks, &self.archive_dir, &exe).await?;
                let buffer = buffer_degrees.unwrap_or(DEFAULT_BUFFER_DEGREES);
                Ok(NearestData::Observations(nearest_observations(
                    &table, &locations, buffer,
                )?))
            }
        }
    }
}
