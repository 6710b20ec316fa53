pub mod error;
pub mod grid_decoder;
pub mod obs_decoder;
pub mod report_parser;
