//! Expands an analysis window into the list of files to download.

use crate::schedule::error::ScheduleError;
use crate::schedule::url_template::render_url;
use crate::types::data_type::DataType;
use crate::types::download_task::DownloadTask;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use log::warn;

/// Forecast files are published every 3 hours.
pub const FORECAST_HOUR_STEP: u32 = 3;
/// Rainfall is read from the T+12 file of the run started 12 hours earlier.
pub const RAINFALL_FORECAST_HOUR: u32 = 12;

const ANALYSIS_TIME_LEN: usize = "YYYYMMDDTHH".len();

/// Parses an analysis time written as `YYYYMMDDTHH`, e.g. `20231001T06`.
///
/// Every digit is required, so `20231001T6` is rejected rather than read as another hour.
pub fn parse_analysis_time(text: &str) -> Result<DateTime<Utc>, ScheduleError> {
    let trimmed = text.trim();
    let well_formed = trimmed.len() == ANALYSIS_TIME_LEN
        && trimmed
            .char_indices()
            .all(|(i, c)| if i == 8 { c == 'T' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(ScheduleError::InvalidDateTime(text.to_string(), None));
    }
    let naive = NaiveDateTime::parse_from_str(&format!("{trimmed}00"), "%Y%m%dT%H%M")
        .map_err(|e| ScheduleError::InvalidDateTime(text.to_string(), Some(e)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Rejects a forecast horizon for data that has none.
pub fn validate_forecast_length(
    data_type: DataType,
    forecast_length: u32,
) -> Result<(), ScheduleError> {
    if forecast_length > 0 && !data_type.supports_forecast_hours() {
        return Err(ScheduleError::ForecastLengthForObs(forecast_length));
    }
    Ok(())
}

/// Emits one task per analysis time in `[start, end]` (stepping by the data type's
/// analysis interval) and per forecast hour in
/// `start_forecast_length..=forecast_length` (stepping by 3).
///
/// When `forecast_length` is not reachable from `start_forecast_length` in steps of 3,
/// the hours stop at the last reachable one.
pub fn generate_tasks(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    data_type: DataType,
    base_url: &str,
    forecast_length: u32,
    start_forecast_length: u32,
) -> Vec<DownloadTask> {
    if forecast_length >= start_forecast_length
        && (forecast_length - start_forecast_length) % FORECAST_HOUR_STEP != 0
    {
        warn!(
            "Forecast hour {} is not reachable from {} in steps of {}; it will not be downloaded",
            forecast_length, start_forecast_length, FORECAST_HOUR_STEP
        );
    }

    let template = data_type.url_template();
    let interval = data_type.analysis_interval();
    let mut tasks = Vec::new();
    let mut analysis_time = start;
    while analysis_time <= end {
        for forecast_hour in (start_forecast_length..=forecast_length)
            .step_by(FORECAST_HOUR_STEP as usize)
        {
            tasks.push(DownloadTask {
                valid_time: analysis_time + Duration::hours(i64::from(forecast_hour)),
                analysis_time,
                forecast_hour,
                url: render_url(template, base_url, analysis_time, forecast_hour),
            });
        }
        analysis_time += interval;
    }
    tasks
}

/// Builds every task a retrieval needs.
///
/// For GFS the T+12 rainfall files of the runs 12 hours earlier are appended, so each
/// analysis valid time ends up with two tasks: the T+0 analysis file and the T+12
/// forecast file valid at the same time.
pub fn build_download_tasks(
    start: &str,
    end: &str,
    data_type: DataType,
    base_url: &str,
    forecast_length: u32,
) -> Result<Vec<DownloadTask>, ScheduleError> {
    let start = parse_analysis_time(start)?;
    let end = parse_analysis_time(end)?;
    validate_forecast_length(data_type, forecast_length)?;

    let mut tasks = generate_tasks(start, end, data_type, base_url, forecast_length, 0);
    if data_type == DataType::Gfs {
        let shift = Duration::hours(i64::from(RAINFALL_FORECAST_HOUR));
        tasks.extend(generate_tasks(
            start - shift,
            end - shift,
            data_type,
            base_url,
            RAINFALL_FORECAST_HOUR,
            RAINFALL_FORECAST_HOUR,
        ));
    }
    Ok(tasks)
}
