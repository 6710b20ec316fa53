pub mod bounding_box;
pub mod data_type;
pub mod download_task;
pub mod grid;
pub mod grid_field;
pub mod lat_lon;
pub mod nearest_data;
pub mod observation;
