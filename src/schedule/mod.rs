pub mod error;
pub mod time_grid;
pub mod url_template;
