//! Column layout of decoded surface observations.

use polars::prelude::{DataFrame, PolarsResult};

pub const DATETIME: &str = "datetime";
pub const STATION_ID: &str = "station_id";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const TEMPERATURE: &str = "temperature";
pub const DEWPOINT: &str = "dewpoint";
pub const WIND_DIR: &str = "wind_dir";
pub const WIND_SPD: &str = "wind_spd";
pub const RAIN: &str = "rain";
/// Added by the nearest-station matcher, in kilometers.
pub const DISTANCE: &str = "distance";

/// Report header (after hyphenation and de-duplication) → table column, in table order.
pub(crate) const REPORT_COLUMNS: [(&str, &str); 9] = [
    ("REPORT-TIME", DATETIME),
    ("STATION", STATION_ID),
    ("LATI-", LATITUDE),
    ("LONGI-", LONGITUDE),
    ("AIR.T", TEMPERATURE),
    ("DEWPT", DEWPOINT),
    ("WIND", WIND_DIR),
    ("WIND.1", WIND_SPD),
    ("3H-PR", RAIN),
];

/// Numeric columns; unparseable values in these are stored as null.
pub const NUMERIC_COLUMNS: [&str; 7] = [
    LATITUDE,
    LONGITUDE,
    TEMPERATURE,
    DEWPOINT,
    WIND_DIR,
    WIND_SPD,
    RAIN,
];

/// All surface observations decoded for a run.
///
/// The frame has the columns `datetime` (Datetime), `station_id` (String) and the
/// nullable `f64` columns listed in [`NUMERIC_COLUMNS`].
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    pub frame: DataFrame,
}

impl ObservationTable {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Appends the rows of `other`, keeping row order.
    pub fn append(&mut self, other: &ObservationTable) -> PolarsResult<()> {
        if self.frame.width() == 0 {
            self.frame = other.frame.clone();
            return Ok(());
        }
        self.frame.vstack_mut(&other.frame)?;
        Ok(())
    }
}

/// The nearest station row for every query point, in query order, with an extra
/// [`DISTANCE`] column.
#[derive(Debug, Clone, Default)]
pub struct ObservationMatches {
    pub frame: DataFrame,
}
