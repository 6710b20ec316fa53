//! The meteorological fields read from GFS files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A GRIB2 field identified by its discipline, parameter category and parameter number
/// (WMO code table 4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GridField {
    #[serde(rename = "Temperature")]
    Temperature,
    #[serde(rename = "Relative humidity")]
    RelativeHumidity,
    #[serde(rename = "U component of wind")]
    UWind,
    #[serde(rename = "V component of wind")]
    VWind,
    #[serde(rename = "Precipitation rate")]
    PrecipitationRate,
}

/// Fields read from analysis (T+0) files.
pub const ANALYSIS_FIELDS: [GridField; 4] = [
    GridField::Temperature,
    GridField::RelativeHumidity,
    GridField::UWind,
    GridField::VWind,
];

/// Fields read from T+12 files, where rainfall has accumulated over the forecast.
pub const RAINFALL_FIELDS: [GridField; 1] = [GridField::PrecipitationRate];

impl GridField {
    /// `(discipline, parameter category, parameter number)`.
    pub fn grib_code(&self) -> (u8, u8, u8) {
        match self {
            GridField::Temperature => (0, 0, 0),
            GridField::RelativeHumidity => (0, 1, 1),
            GridField::UWind => (0, 2, 2),
            GridField::VWind => (0, 2, 3),
            GridField::PrecipitationRate => (0, 1, 7),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GridField::Temperature => "Temperature",
            GridField::RelativeHumidity => "Relative humidity",
            GridField::UWind => "U component of wind",
            GridField::VWind => "V component of wind",
            GridField::PrecipitationRate => "Precipitation rate",
        }
    }

    pub fn matches(&self, discipline: u8, category: u8, number: u8) -> bool {
        self.grib_code() == (discipline, category, number)
    }
}

impl fmt::Display for GridField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
