use crate::types::grid_field::GridField;
use crate::types::lat_lon::LatLon;
use crate::types::observation::ObservationMatches;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Forecast values at the grid cell nearest to one query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPointValues {
    /// The query point as given by the caller.
    pub location: LatLon,
    /// Values rounded to 3 decimals, by valid time and field.
    pub values: BTreeMap<DateTime<Utc>, BTreeMap<GridField, f64>>,
}

impl GridPointValues {
    pub fn get(&self, valid_time: &DateTime<Utc>, field: GridField) -> Option<f64> {
        self.values.get(valid_time)?.get(&field).copied()
    }
}

/// Nearest-grid-cell values for every query point, in query order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridNearest {
    pub points: Vec<GridPointValues>,
}

impl GridNearest {
    pub fn for_location(&self, location: LatLon) -> Option<&GridPointValues> {
        self.points.iter().find(|p| p.location == location)
    }
}

/// The result of a retrieval, depending on the requested data type.
#[derive(Debug, Clone)]
pub enum NearestData {
    Grid(GridNearest),
    Observations(ObservationMatches),
}

impl NearestData {
    pub fn as_grid(&self) -> Option<&GridNearest> {
        match self {
            NearestData::Grid(grid) => Some(grid),
            NearestData::Observations(_) => None,
        }
    }

    pub fn as_observations(&self) -> Option<&ObservationMatches> {
        match self {
            NearestData::Observations(obs) => Some(obs),
            NearestData::Grid(_) => None,
        }
    }
}
