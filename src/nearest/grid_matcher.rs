//! Nearest grid cell lookup over a decoded forecast snapshot.

use crate::nearest::error::NearestError;
use crate::types::grid::{GridGeometry, GridSnapshot};
use crate::types::lat_lon::LatLon;
use crate::types::nearest_data::{GridNearest, GridPointValues};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::BTreeMap;

/// Rounds to 3 decimals, the precision results are reported with.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// One grid cell as a point in (latitude, normalized longitude) space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GridCell {
    lat: f64,
    lon: f64,
    row: usize,
    col: usize,
}

impl RTreeObject for GridCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lon])
    }
}

impl PointDistance for GridCell {
    /// Squared planar distance in degrees.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.lat - point[0];
        let dlon = self.lon - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// Spatial index over the cells of a grid geometry.
///
/// Each cell keeps its own coordinates, so grids that are not aligned with the
/// latitude/longitude axes are matched correctly.
pub struct GridIndex {
    tree: RTree<GridCell>,
}

impl GridIndex {
    /// Indexes `geometry` with its longitudes wrapped into `[0, 360)`.
    pub fn new(geometry: &GridGeometry) -> Self {
        let normalized = geometry.normalized();
        let cells = normalized
            .lat
            .indexed_iter()
            .zip(normalized.lon.indexed_iter())
            .map(|(((row, col), lat), (_, lon))| GridCell { lat, lon, row, col })
            .collect();
        Self {
            tree: RTree::bulk_load(cells),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// `(row, col)` of the cell closest to `location`.
    pub fn nearest(&self, location: LatLon) -> Option<(usize, usize)> {
        let query = location.normalized();
        self.tree
            .nearest_neighbor(&[query.latitude(), query.longitude()])
            .map(|cell| (cell.row, cell.col))
    }
}

/// Reads every field at every valid time from the cell nearest to each location.
pub fn nearest_grid_values(
    snapshot: &GridSnapshot,
    locations: &[LatLon],
) -> Result<GridNearest, NearestError> {
    let geometry = snapshot.geometry.as_ref().ok_or(NearestError::EmptyGrid)?;
    let index = GridIndex::new(geometry);
    if index.is_empty() {
        return Err(NearestError::EmptyGrid);
    }

    let mut points = Vec::with_capacity(locations.len());
    for &location in locations {
        let (row, col) = index.nearest(location).ok_or(NearestError::EmptyGrid)?;
        let values = snapshot
            .values
            .iter()
            .map(|(valid_time, fields)| {
                let at_cell = fields
                    .iter()
                    .filter_map(|(field, grid)| Some((*field, round3(grid.get(row, col)?))))
                    .collect::<BTreeMap<_, _>>();
                (*valid_time, at_cell)
            })
            .collect();
        points.push(GridPointValues { location, values });
    }
    Ok(GridNearest { points })
}
