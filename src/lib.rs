//! Retrieval of GFS forecasts and GDAS surface observations for a set of locations.
//!
//! Files are downloaded from the public NCAR RDA archives into a local archive
//! directory, decoded (GRIB2 in process, BUFR through an external decoder) and matched
//! to the nearest grid cell or station. See [`WeatherRetriever`].

mod decode;
mod error;
mod fetch;
mod nearest;
mod retriever;
mod schedule;
mod types;

pub use error::EsrWeatherError;
pub use retriever::*;

pub use decode::error::DecodeError;
pub use decode::grid_decoder::{decode_gfs, FieldGrid, GribSource, GridSource};
pub use decode::obs_decoder::{decode_obs, DECODER_CONFIG, DEFAULT_DECODER_EXE};
pub use decode::report_parser::parse_report;

pub use fetch::error::FetchError;
pub use fetch::fetcher::{FetchConfig, FetchOutcome, FetchReport, Fetcher};
pub use fetch::remote::{HttpFetch, RemoteFetch};

pub use nearest::error::NearestError;
pub use nearest::grid_matcher::{nearest_grid_values, GridIndex};
pub use nearest::obs_matcher::{
    geodesic_distance_km, nearest_observation, nearest_observations,
    ObservationFrameFilterExt, DEFAULT_BUFFER_DEGREES,
};

pub use schedule::error::ScheduleError;
pub use schedule::time_grid::{
    build_download_tasks, generate_tasks, parse_analysis_time, FORECAST_HOUR_STEP,
    RAINFALL_FORECAST_HOUR,
};
pub use schedule::url_template::{parse_url, render_url};

pub use types::bounding_box::BoundingBox;
pub use types::data_type::DataType;
pub use types::download_task::DownloadTask;
pub use types::grid::{Grid, GridGeometry, GridSnapshot};
pub use types::grid_field::{GridField, ANALYSIS_FIELDS, RAINFALL_FIELDS};
pub use types::lat_lon::LatLon;
pub use types::nearest_data::{GridNearest, GridPointValues, NearestData};
pub use types::observation::{
    ObservationMatches, ObservationTable, DATETIME, DEWPOINT, DISTANCE, LATITUDE, LONGITUDE,
    NUMERIC_COLUMNS, RAIN, STATION_ID, TEMPERATURE, WIND_DIR, WIND_SPD,
};
