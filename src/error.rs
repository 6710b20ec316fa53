use crate::decode::error::DecodeError;
use crate::fetch::error::FetchError;
use crate::nearest::error::NearestError;
use crate::schedule::error::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EsrWeatherError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Nearest(#[from] NearestError),

    #[error("Failed to download {} file(s): {}", .failed.len(), .failed.join(", "))]
    Download { failed: Vec<String> },
}
