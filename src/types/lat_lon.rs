use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use esr_weather::LatLon;
///
/// let wellington = LatLon(-41.29, 174.78);
/// assert_eq!(wellington.0, -41.29);
/// assert_eq!(LatLon(-41.0, -10.0).normalized(), LatLon(-41.0, 350.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Returns a copy with the longitude wrapped into `[0, 360)`.
    pub fn normalized(&self) -> LatLon {
        LatLon(self.0, normalize_longitude(self.1))
    }
}

impl From<(f64, f64)> for LatLon {
    fn from((lat, lon): (f64, f64)) -> Self {
        LatLon(lat, lon)
    }
}

/// Wraps a longitude into `[0, 360)`.
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
