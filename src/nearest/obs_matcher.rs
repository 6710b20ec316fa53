//! Nearest station lookup over decoded surface observations.

use crate::nearest::error::NearestError;
use crate::types::lat_lon::LatLon;
use crate::types::observation::{
    ObservationMatches, ObservationTable, DISTANCE, LATITUDE, LONGITUDE,
};
use haversine::{distance, Location as HaversineLocation, Units};
use log::debug;
use ordered_float::OrderedFloat;
use polars::prelude::*;

/// Search half-width, in degrees, used when the caller does not give one.
pub const DEFAULT_BUFFER_DEGREES: f64 = 3.0;

pub trait ObservationFrameFilterExt {
    /// Keeps rows whose latitude and longitude both lie within `buffer` degrees of
    /// `location` (inclusive). Rows with a null coordinate are dropped.
    fn filter_around(self, location: LatLon, buffer: f64) -> LazyFrame;
}

impl ObservationFrameFilterExt for LazyFrame {
    fn filter_around(self, location: LatLon, buffer: f64) -> LazyFrame {
        let (lat, lon) = (location.latitude(), location.longitude());
        self.filter(
            col(LATITUDE)
                .gt_eq(lit(lat - buffer))
                .and(col(LATITUDE).lt_eq(lit(lat + buffer)))
                .and(col(LONGITUDE).gt_eq(lit(lon - buffer)))
                .and(col(LONGITUDE).lt_eq(lit(lon + buffer))),
        )
    }
}

/// Great-circle distance in kilometers on a sphere of radius 6371 km.
pub fn geodesic_distance_km(a: LatLon, b: LatLon) -> f64 {
    distance(
        HaversineLocation {
            latitude: a.latitude(),
            longitude: a.longitude(),
        },
        HaversineLocation {
            latitude: b.latitude(),
            longitude: b.longitude(),
        },
        Units::Kilometers,
    )
}

/// Finds the closest observation row to `location` among those in its buffer box and
/// returns it with a `distance` column in kilometers.
pub fn nearest_observation(
    table: &ObservationTable,
    location: LatLon,
    buffer: f64,
) -> Result<DataFrame, NearestError> {
    let no_match = || NearestError::NoMatch {
        latitude: location.latitude(),
        longitude: location.longitude(),
        buffer,
    };
    if table.is_empty() {
        return Err(no_match());
    }

    let candidates = table
        .frame
        .clone()
        .lazy()
        .filter_around(location, buffer)
        .collect()?;

    let latitudes = candidates.column(LATITUDE)?.f64()?;
    let longitudes = candidates.column(LONGITUDE)?.f64()?;
    let closest = latitudes
        .iter()
        .zip(longitudes.iter())
        .enumerate()
        .filter_map(|(idx, (lat, lon))| {
            Some((idx, geodesic_distance_km(location, LatLon(lat?, lon?))))
        })
        .min_by_key(|(_, km)| OrderedFloat(*km));

    let (idx, km) = closest.ok_or_else(no_match)?;
    debug!(
        "Nearest observation to {:?} is {:.1} km away ({} candidates)",
        location,
        km,
        candidates.height()
    );

    let mut row = candidates.slice(idx as i64, 1);
    row.with_column(Column::new(DISTANCE.into(), [km]))?;
    Ok(row)
}

/// Nearest observation for every location, stacked in location order.
///
/// Fails with [`NearestError::NoMatch`] for the first location that has no
/// observation within `buffer` degrees.
pub fn nearest_observations(
    table: &ObservationTable,
    locations: &[LatLon],
    buffer: f64,
) -> Result<ObservationMatches, NearestError> {
    let mut matches: Option<DataFrame> = None;
    for &location in locations {
        let row = nearest_observation(table, location, buffer)?;
        match matches.as_mut() {
            Some(frame) => {
                frame.vstack_mut(&row)?;
            }
            None => matches = Some(row),
        }
    }
    Ok(ObservationMatches {
        frame: matches.unwrap_or_default(),
    })
}
