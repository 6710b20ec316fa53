use thiserror::Error;

#[derive(Debug, Error)]
pub enum NearestError {
    #[error("No observation within {buffer} degrees of ({latitude}, {longitude})")]
    NoMatch {
        latitude: f64,
        longitude: f64,
        buffer: f64,
    },

    #[error("Decoded grid has no cells to match against")]
    EmptyGrid,

    #[error("Polars error while matching observations: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),
}
