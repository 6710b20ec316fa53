//! Two-dimensional grids and the decoded forecast snapshot built from them.

use crate::types::grid_field::GridField;
use crate::types::lat_lon::normalize_longitude;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A dense, row-major 2D array of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Grid {
    /// Returns `None` when `data` does not hold exactly `rows * cols` values.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        (rows.checked_mul(cols)? == data.len()).then_some(Self { rows, cols, data })
    }

    /// Builds a grid from nested rows. Returns `None` for ragged input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != n_cols) {
            return None;
        }
        Self::new(n_rows, n_cols, rows.into_iter().flatten().collect())
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    /// Iterates `((row, col), value)` in row-major order.
    pub fn indexed_iter(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        let cols = self.cols.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(idx, value)| ((idx / cols, idx % cols), *value))
    }

    /// Applies `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Grid {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Keeps only the listed rows and columns, in the given order.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Grid {
        let data = rows
            .iter()
            .flat_map(|r| cols.iter().map(move |c| (*r, *c)))
            .filter_map(|(r, c)| self.get(r, c))
            .collect::<Vec<_>>();
        Grid {
            rows: rows.len(),
            cols: cols.len(),
            data,
        }
    }
}

/// Latitude and longitude of every cell of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridGeometry {
    pub lat: Grid,
    pub lon: Grid,
}

impl GridGeometry {
    /// Returns `None` when the two coordinate grids differ in shape.
    pub fn new(lat: Grid, lon: Grid) -> Option<Self> {
        (lat.shape() == lon.shape()).then_some(Self { lat, lon })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.lat.shape()
    }

    /// A copy whose longitudes are wrapped into `[0, 360)`.
    pub fn normalized(&self) -> GridGeometry {
        GridGeometry {
            lat: self.lat.clone(),
            lon: self.lon.map(normalize_longitude),
        }
    }
}

/// Decoded forecast fields keyed by valid time and field, on a single shared grid.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GridSnapshot {
    pub values: BTreeMap<DateTime<Utc>, BTreeMap<GridField, Grid>>,
    pub geometry: Option<GridGeometry>,
}

impl GridSnapshot {
    pub fn insert(&mut self, valid_time: DateTime<Utc>, field: GridField, grid: Grid) {
        self.values
            .entry(valid_time)
            .or_default()
            .insert(field, grid);
    }

    pub fn get(&self, valid_time: &DateTime<Utc>, field: GridField) -> Option<&Grid> {
        self.values.get(valid_time)?.get(&field)
    }

    /// Records the geometry of an extraction. Returns `false`, leaving the snapshot
    /// unchanged, when it differs from the geometry already recorded.
    pub fn merge_geometry(&mut self, geometry: GridGeometry) -> bool {
        match &self.geometry {
            Some(existing) => *existing == geometry,
            None => {
                self.geometry = Some(geometry);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        assert!(Grid::new(2, 2, vec![1.0, 2.0, 3.0]).is_none());
        assert!(Grid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_none());
    }

    #[test]
    fn indexes_row_major() {
        let grid = Grid::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(grid.shape(), (2, 3));
        assert_eq!(grid.get(1, 0), Some(4.0));
        assert_eq!(grid.get(0, 2), Some(3.0));
        assert_eq!(grid.get(2, 0), None);
        let cells: Vec<_> = grid.indexed_iter().collect();
        assert_eq!(cells[4], ((1, 1), 5.0));
    }

    #[test]
    fn select_keeps_requested_cells() {
        let grid = Grid::from_rows(vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap();
        let sub = grid.select(&[1, 2], &[0, 2]);
        assert_eq!(sub, Grid::from_rows(vec![vec![4.0, 6.0], vec![7.0, 9.0]]).unwrap());
    }

    #[test]
    fn normalized_geometry_leaves_original_untouched() {
        let lat = Grid::from_rows(vec![vec![-40.0, -40.0]]).unwrap();
        let lon = Grid::from_rows(vec![vec![-175.0, 175.0]]).unwrap();
        let geometry = GridGeometry::new(lat, lon).unwrap();
        let normalized = geometry.normalized();
        assert_eq!(normalized.lon.get(0, 0), Some(185.0));
        assert_eq!(geometry.lon.get(0, 0), Some(-175.0));
    }

    #[test]
    fn merge_geometry_detects_conflicts() {
        let geometry = |offset: f64| {
            GridGeometry::new(
                Grid::from_rows(vec![vec![-40.0 + offset]]).unwrap(),
                Grid::from_rows(vec![vec![175.0]]).unwrap(),
            )
            .unwrap()
        };
        let mut snapshot = GridSnapshot::default();
        assert!(snapshot.merge_geometry(geometry(0.0)));
        assert!(snapshot.merge_geometry(geometry(0.0)));
        assert!(!snapshot.merge_geometry(geometry(0.25)));
        assert_eq!(snapshot.geometry, Some(geometry(0.0)));
    }
}
