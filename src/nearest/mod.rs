pub mod error;
pub mod grid_matcher;
pub mod obs_matcher;
