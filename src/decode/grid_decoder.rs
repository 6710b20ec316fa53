//! Extraction of the forecast fields of interest from downloaded GFS files.

use crate::decode::error::DecodeError;
use crate::schedule::time_grid::RAINFALL_FORECAST_HOUR;
use crate::types::bounding_box::BoundingBox;
use crate::types::download_task::DownloadTask;
use crate::types::grid::{Grid, GridGeometry, GridSnapshot};
use crate::types::grid_field::{GridField, ANALYSIS_FIELDS, RAINFALL_FIELDS};
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One field over the full extent of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGrid {
    pub field: GridField,
    pub values: Grid,
    pub geometry: GridGeometry,
}

/// Reads whole fields out of a forecast file.
pub trait GridSource: Send + Sync {
    /// Returns the first message of `path` matching each requested field, in the order
    /// requested. A field without a matching message is an error.
    fn read_fields(&self, path: &Path, fields: &[GridField])
        -> Result<Vec<FieldGrid>, DecodeError>;
}

/// [`GridSource`] backed by the `grib` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GribSource;

fn grib_error(path: &Path, e: impl ToString) -> DecodeError {
    DecodeError::Grib {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

impl GridSource for GribSource {
    fn read_fields(
        &self,
        path: &Path,
        fields: &[GridField],
    ) -> Result<Vec<FieldGrid>, DecodeError> {
        let file = File::open(path).map_err(|e| DecodeError::GribOpen(path.to_path_buf(), e))?;
        let grib2 = grib::from_reader(BufReader::new(file)).map_err(|e| grib_error(path, e))?;

        let mut grids = Vec::with_capacity(fields.len());
        for &field in fields {
            let submessage = grib2.iter().map(|(_, submessage)| submessage).find(|s| {
                match (s.prod_def().parameter_category(), s.prod_def().parameter_number()) {
                    (Some(category), Some(number)) => {
                        field.matches(s.indicator().discipline, category, number)
                    }
                    _ => false,
                }
            });
            let Some(submessage) = submessage else {
                return Err(DecodeError::FieldNotFound {
                    path: path.to_path_buf(),
                    field: field.to_string(),
                });
            };

            // Points come scanned along i (longitude) first, so row j holds one latitude
            let (ni, nj) = submessage.grid_shape().map_err(|e| grib_error(path, e))?;
            let (lats, lons): (Vec<f64>, Vec<f64>) = submessage
                .latlons()
                .map_err(|e| grib_error(path, e))?
                .map(|(lat, lon)| (f64::from(lat), f64::from(lon)))
                .unzip();
            let values: Vec<f64> = grib::Grib2SubmessageDecoder::from(submessage)
                .map_err(|e| grib_error(path, e))?
                .dispatch()
                .map_err(|e| grib_error(path, e))?
                .map(f64::from)
                .collect();

            let shape_error =
                || grib_error(path, format!("{field} does not fill a {nj}x{ni} grid"));
            let geometry = GridGeometry::new(
                Grid::new(nj, ni, lats).ok_or_else(shape_error)?,
                Grid::new(nj, ni, lons).ok_or_else(shape_error)?,
            )
            .ok_or_else(shape_error)?;
            grids.push(FieldGrid {
                field,
                values: Grid::new(nj, ni, values).ok_or_else(shape_error)?,
                geometry,
            });
        }
        Ok(grids)
    }
}

/// Fields to read for a forecast hour. Hours other than the analysis and the rainfall
/// hour carry nothing of interest.
pub fn fields_for_forecast_hour(forecast_hour: u32) -> &'static [GridField] {
    match forecast_hour {
        0 => &ANALYSIS_FIELDS,
        RAINFALL_FORECAST_HOUR => &RAINFALL_FIELDS,
        _ => &[],
    }
}

/// Keeps the rows whose latitude and the columns whose longitude fall in `bbox`.
///
/// Rows are judged by their first column and columns by their first row, which is exact
/// for the regular latitude/longitude grids GFS is published on.
pub fn crop(grid: &FieldGrid, bbox: &BoundingBox) -> (Grid, GridGeometry) {
    let geometry = &grid.geometry;
    let (rows, cols) = geometry.shape();
    let keep_rows: Vec<usize> = (0..rows)
        .filter(|&r| geometry.lat.get(r, 0).is_some_and(|lat| bbox.contains_lat(lat)))
        .collect();
    let keep_cols: Vec<usize> = (0..cols)
        .filter(|&c| geometry.lon.get(0, c).is_some_and(|lon| bbox.contains_lon(lon)))
        .collect();

    let cropped = GridGeometry {
        lat: geometry.lat.select(&keep_rows, &keep_cols),
        lon: geometry.lon.select(&keep_rows, &keep_cols),
    };
    (grid.values.select(&keep_rows, &keep_cols), cropped)
}

/// Decodes every GFS task into a snapshot keyed by valid time.
///
/// All extractions must share one geometry; the first one decoded becomes the
/// snapshot's geometry.
pub fn decode_gfs<G: GridSource + ?Sized>(
    tasks: &[DownloadTask],
    archive_dir: &Path,
    bbox: &BoundingBox,
    source: &G,
) -> Result<GridSnapshot, DecodeError> {
    let mut snapshot = GridSnapshot::default();
    for task in tasks {
        let fields = fields_for_forecast_hour(task.forecast_hour);
        if fields.is_empty() {
            debug!("Skipping forecast hour {} of {}", task.forecast_hour, task.url);
            continue;
        }
        let Some(name) = task.file_name() else {
            debug!("Skipping {}, it has no file name", task.url);
            continue;
        };
        let path = archive_dir.join(name);

        for grid in source.read_fields(&path, fields)? {
            let (values, geometry) = crop(&grid, bbox);
            if !snapshot.merge_geometry(geometry) {
                return Err(DecodeError::GeometryMismatch { path });
            }
            snapshot.insert(task.valid_time, grid.field, values);
        }
    }

    info!(
        "Decoded {} valid times from {}",
        snapshot.values.len(),
        archive_dir.display()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::time_grid::build_download_tasks;
    use crate::types::data_type::DataType;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves a 3x3 grid around New Zealand whose values encode the field.
    struct FakeSource {
        lat_offset: HashMap<String, f64>,
        missing: Option<GridField>,
        reads: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                lat_offset: HashMap::new(),
                missing: None,
                reads: Mutex::new(Vec::new()),
            }
        }
    }

    impl GridSource for FakeSource {
        fn read_fields(
            &self,
            path: &Path,
            fields: &[GridField],
        ) -> Result<Vec<FieldGrid>, DecodeError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.reads.lock().unwrap().push(name.clone());
            let offset = self.lat_offset.get(&name).copied().unwrap_or(0.0);
            fields
                .iter()
                .map(|&field| {
                    if Some(field) == self.missing {
                        return Err(DecodeError::FieldNotFound {
                            path: path.to_path_buf(),
                            field: field.to_string(),
                        });
                    }
                    let lat = Grid::from_rows(vec![
                        vec![-29.0 + offset; 3],
                        vec![-40.0 + offset; 3],
                        vec![-41.0 + offset; 3],
                    ])
                    .unwrap();
                    let lon = Grid::from_rows(vec![vec![-175.0, 174.0, 175.0]; 3]).unwrap();
                    let base = field.grib_code().2 as f64 * 10.0;
                    let values = Grid::new(3, 3, (0..9).map(|v| base + v as f64).collect())
                        .unwrap();
                    Ok(FieldGrid {
                        field,
                        values,
                        geometry: GridGeometry::new(lat, lon).unwrap(),
                    })
                })
                .collect()
        }
    }

    /// Sign-and-magnitude encoding of a coordinate in microdegrees.
    fn grib_coordinate(degrees: i32) -> [u8; 4] {
        let micro = degrees.unsigned_abs() * 1_000_000;
        let sign = if degrees < 0 { 0x8000_0000 } else { 0 };
        (micro | sign).to_be_bytes()
    }

    /// One GRIB2 message holding a field on a 2 row by 3 column grid running from
    /// -40 to -41 latitude and 174 to 176 longitude, packed at 8 bits per value.
    fn grib2_message(field: GridField, values: [u8; 6]) -> Vec<u8> {
        let (discipline, category, number) = field.grib_code();

        let mut sect1 = vec![0, 0, 0, 21, 1, 0, 7, 0, 0, 2, 0, 1];
        sect1.extend_from_slice(&2023u16.to_be_bytes());
        sect1.extend_from_slice(&[10, 1, 0, 0, 0, 0, 1]);

        let mut sect3 = vec![0, 0, 0, 72, 3, 0, 0, 0, 0, 6, 0, 0, 0, 0];
        // Spherical earth of radius 6371229 m, no scaled radii
        sect3.push(6);
        sect3.extend_from_slice(&[0; 15]);
        sect3.extend_from_slice(&3u32.to_be_bytes());
        sect3.extend_from_slice(&2u32.to_be_bytes());
        sect3.extend_from_slice(&[0; 4]);
        sect3.extend_from_slice(&[0xff; 4]);
        sect3.extend_from_slice(&grib_coordinate(-40));
        sect3.extend_from_slice(&grib_coordinate(174));
        sect3.push(0x30);
        sect3.extend_from_slice(&grib_coordinate(-41));
        sect3.extend_from_slice(&grib_coordinate(176));
        sect3.extend_from_slice(&1_000_000u32.to_be_bytes());
        sect3.extend_from_slice(&1_000_000u32.to_be_bytes());
        // +i, -j, rows along i
        sect3.push(0);

        let mut sect4 = vec![0, 0, 0, 34, 4, 0, 0, 0, 0, category, number, 2, 0, 96, 0, 0, 0, 1];
        sect4.extend_from_slice(&[0, 0, 0, 0, 103, 0, 0, 0, 0, 2, 255, 0, 0, 0, 0, 0]);

        let mut sect5 = vec![0, 0, 0, 21, 5, 0, 0, 0, 6, 0, 0];
        sect5.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 8, 0]);

        let sect6 = vec![0, 0, 0, 6, 6, 255];
        let mut sect7 = vec![0, 0, 0, 11, 7];
        sect7.extend_from_slice(&values);

        let body: Vec<u8> = [sect1, sect3, sect4, sect5, sect6, sect7].concat();
        let total = (16 + body.len() + 4) as u64;
        let mut message = b"GRIB".to_vec();
        message.extend_from_slice(&[0, 0, discipline, 2]);
        message.extend_from_slice(&total.to_be_bytes());
        message.extend_from_slice(&body);
        message.extend_from_slice(b"7777");
        message
    }

    fn gfs_tasks(forecast_length: u32) -> Vec<DownloadTask> {
        build_download_tasks(
            "20231001T00",
            "20231001T06",
            DataType::Gfs,
            DataType::Gfs.default_base_url(),
            forecast_length,
        )
        .unwrap()
    }

    #[test]
    fn crops_to_bounding_box() {
        let source = FakeSource::new();
        let snapshot =
            decode_gfs(&gfs_tasks(0), Path::new("/archive"), &BoundingBox::default(), &source)
                .unwrap();

        let geometry = snapshot.geometry.as_ref().unwrap();
        // -29 is north of the box and -175 wraps to 185, east of it
        assert_eq!(geometry.shape(), (2, 2));
        assert_eq!(geometry.lat.get(0, 0), Some(-40.0));
        assert_eq!(geometry.lon.get(1, 1), Some(175.0));

        let valid_time = gfs_tasks(0)[0].valid_time;
        let temperature = snapshot.get(&valid_time, GridField::Temperature).unwrap();
        assert_eq!(temperature, &Grid::from_rows(vec![vec![4.0, 5.0], vec![7.0, 8.0]]).unwrap());
    }

    #[test]
    fn analysis_and_rainfall_share_valid_times() {
        let source = FakeSource::new();
        let snapshot =
            decode_gfs(&gfs_tasks(0), Path::new("/archive"), &BoundingBox::default(), &source)
                .unwrap();

        assert_eq!(snapshot.values.len(), 2);
        for fields in snapshot.values.values() {
            let names: Vec<_> = fields.keys().copied().collect();
            assert_eq!(
                names,
                vec![
                    GridField::Temperature,
                    GridField::RelativeHumidity,
                    GridField::UWind,
                    GridField::VWind,
                    GridField::PrecipitationRate,
                ]
            );
        }
    }

    #[test]
    fn intermediate_forecast_hours_are_not_read() {
        let source = FakeSource::new();
        let tasks = gfs_tasks(6);
        decode_gfs(&tasks, Path::new("/archive"), &BoundingBox::default(), &source).unwrap();

        let reads = source.reads.lock().unwrap();
        // 2 analysis files and 2 rainfall files; f003 and f006 are skipped
        assert_eq!(reads.len(), 4);
        assert!(reads.iter().all(|name| !name.ends_with("f003.grib2")));
        assert!(reads.iter().all(|name| !name.ends_with("f006.grib2")));
    }

    #[test]
    fn missing_field_names_file_and_field() {
        let source = FakeSource {
            missing: Some(GridField::PrecipitationRate),
            ..FakeSource::new()
        };
        let tasks = gfs_tasks(0);
        let err = decode_gfs(&tasks, Path::new("/archive"), &BoundingBox::default(), &source)
            .unwrap_err();
        match err {
            DecodeError::FieldNotFound { path, field } => {
                assert!(path.to_string_lossy().ends_with("f012.grib2"));
                assert_eq!(field, "Precipitation rate");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_files_on_a_different_grid() {
        let tasks = gfs_tasks(0);
        let shifted = tasks[1].file_name().unwrap().to_string();
        let source = FakeSource {
            lat_offset: HashMap::from([(shifted.clone(), 0.25)]),
            ..FakeSource::new()
        };
        let err = decode_gfs(&tasks, Path::new("/archive"), &BoundingBox::default(), &source)
            .unwrap_err();
        match err {
            DecodeError::GeometryMismatch { path } => assert!(path.ends_with(&shifted)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn grib_source_reads_fields_row_by_latitude() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gfs.0p25.2023100100.f000.grib2");
        let file = [
            grib2_message(GridField::Temperature, [1, 2, 3, 4, 5, 6]),
            grib2_message(GridField::RelativeHumidity, [11, 12, 13, 14, 15, 16]),
        ]
        .concat();
        std::fs::write(&path, file).unwrap();

        let grids = GribSource
            .read_fields(&path, &[GridField::RelativeHumidity, GridField::Temperature])
            .unwrap();

        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].field, GridField::RelativeHumidity);
        assert_eq!(
            grids[0].values,
            Grid::from_rows(vec![vec![11.0, 12.0, 13.0], vec![14.0, 15.0, 16.0]]).unwrap()
        );
        assert_eq!(grids[1].field, GridField::Temperature);
        assert_eq!(
            grids[1].values,
            Grid::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap()
        );

        let geometry = &grids[0].geometry;
        assert_eq!(
            geometry.lat,
            Grid::from_rows(vec![vec![-40.0; 3], vec![-41.0; 3]]).unwrap()
        );
        assert_eq!(
            geometry.lon,
            Grid::from_rows(vec![vec![174.0, 175.0, 176.0]; 2]).unwrap()
        );
    }

    #[test]
    fn grib_source_reports_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gfs.0p25.2023100100.f012.grib2");
        std::fs::write(&path, grib2_message(GridField::Temperature, [1, 2, 3, 4, 5, 6])).unwrap();

        let err = GribSource.read_fields(&path, &[GridField::UWind]).unwrap_err();
        match err {
            DecodeError::FieldNotFound { path: missing, field } => {
                assert_eq!(missing, path);
                assert_eq!(field, "U component of wind");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
