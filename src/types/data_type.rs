//! Defines the kinds of remote data this crate retrieves and the per-kind constants
//! (analysis interval, URL template, base URL) that drive task generation.

use crate::schedule::error::ScheduleError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// URL template of a GFS 0.25° GRIB2 forecast file.
pub const GFS_URL_TEMPLATE: &str =
    "{base}/{yyyy}/{yyyymmdd}/gfs.0p25.{yyyymmddhh}.f{fff}.grib2";
/// URL template of a daily GDAS surface observation tarball.
pub const OBS_URL_TEMPLATE: &str = "{base}/{yyyy}/gdassfcobs.{yyyymmdd}.tar.gz";

const GFS_BASE_URL: &str = "https://data.rda.ucar.edu/ds084.1";
const OBS_BASE_URL: &str = "https://data.rda.ucar.edu/ds461.0/tarfiles";

/// The kind of data to retrieve.
///
/// Each kind has its own analysis cadence and remote layout:
///
/// | kind  | analysis interval | file                                   |
/// |-------|-------------------|----------------------------------------|
/// | `Gfs` | 6 hours           | `gfs.0p25.{YYYYMMDDHH}.f{FFF}.grib2`   |
/// | `Obs` | 24 hours          | `gdassfcobs.{YYYYMMDD}.tar.gz`         |
///
/// # Examples
///
/// ```
/// use esr_weather::DataType;
///
/// let data_type: DataType = "obs".parse().unwrap();
/// assert_eq!(data_type, DataType::Obs);
/// assert_eq!(data_type.to_string(), "obs");
/// assert_eq!(DataType::Gfs.analysis_interval().num_hours(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Global Forecast System gridded forecasts.
    #[default]
    Gfs,
    /// GDAS surface observations (BUFR, decoded externally).
    Obs,
}

impl DataType {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            DataType::Gfs => "gfs",
            DataType::Obs => "obs",
        }
    }

    /// Time between two consecutive analysis times.
    pub fn analysis_interval(&self) -> Duration {
        match self {
            DataType::Gfs => Duration::hours(6),
            DataType::Obs => Duration::hours(24),
        }
    }

    /// The URL template with `{base}`, `{yyyy}`, `{yyyymmdd}`, `{yyyymmddhh}` and
    /// `{fff}` placeholders.
    pub fn url_template(&self) -> &'static str {
        match self {
            DataType::Gfs => GFS_URL_TEMPLATE,
            DataType::Obs => OBS_URL_TEMPLATE,
        }
    }

    /// The public archive the files are downloaded from.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            DataType::Gfs => GFS_BASE_URL,
            DataType::Obs => OBS_BASE_URL,
        }
    }

    /// Observations are analyses only; they have no forecast horizon.
    pub fn supports_forecast_hours(&self) -> bool {
        matches!(self, DataType::Gfs)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl FromStr for DataType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gfs" => Ok(DataType::Gfs),
            "obs" => Ok(DataType::Obs),
            _ => Err(ScheduleError::UnknownDataType(s.to_string())),
        }
    }
}
