use crate::types::lat_lon::normalize_longitude;
use serde::{Deserialize, Serialize};

/// A latitude/longitude box, inclusive on every edge. Longitudes are in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max
    }

    /// `lon` is normalized before the comparison.
    pub fn contains_lon(&self, lon: f64) -> bool {
        let lon = normalize_longitude(lon);
        lon >= self.lon_min && lon <= self.lon_max
    }
}

/// New Zealand and the surrounding ocean.
impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(-50.0, -30.0, 160.0, 180.0)
    }
}
