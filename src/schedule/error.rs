use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Invalid analysis time '{0}', expected YYYYMMDDTHH")]
    InvalidDateTime(String, #[source] Option<chrono::ParseError>),

    #[error("Forecast length is {0} but observations have no forecast hours")]
    ForecastLengthForObs(u32),

    #[error("Unknown data type '{0}', expected 'gfs' or 'obs'")]
    UnknownDataType(String),
}
