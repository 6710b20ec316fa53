//! Rendering and parsing of the remote file URL templates.
//!
//! Templates use `{base}`, `{yyyy}`, `{yyyymmdd}`, `{yyyymmddhh}` and `{fff}`
//! placeholders, see [`crate::DataType::url_template`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Base,
    Year,
    Date,
    DateHour,
    ForecastHour,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "base" => Some(Placeholder::Base),
            "yyyy" => Some(Placeholder::Year),
            "yyyymmdd" => Some(Placeholder::Date),
            "yyyymmddhh" => Some(Placeholder::DateHour),
            "fff" => Some(Placeholder::ForecastHour),
            _ => None,
        }
    }

    fn width(&self) -> Option<usize> {
        match self {
            Placeholder::Base => None,
            Placeholder::Year => Some(4),
            Placeholder::Date => Some(8),
            Placeholder::DateHour => Some(10),
            Placeholder::ForecastHour => Some(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Literal(&'a str),
    Field(Placeholder),
}

fn tokenize(template: &str) -> Option<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        if start > 0 {
            tokens.push(Token::Literal(&rest[..start]));
        }
        let end = start + rest[start..].find('}')?;
        tokens.push(Token::Field(Placeholder::from_name(&rest[start + 1..end])?));
        rest = &rest[end + 1..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }
    Some(tokens)
}

/// Fills a template for one analysis time and forecast hour.
pub fn render_url(
    template: &str,
    base_url: &str,
    analysis_time: DateTime<Utc>,
    forecast_hour: u32,
) -> String {
    template
        .replace("{base}", base_url.trim_end_matches('/'))
        .replace("{yyyymmddhh}", &analysis_time.format("%Y%m%d%H").to_string())
        .replace("{yyyymmdd}", &analysis_time.format("%Y%m%d").to_string())
        .replace("{yyyy}", &analysis_time.format("%Y").to_string())
        .replace("{fff}", &format!("{forecast_hour:03}"))
}

/// Recovers `(analysis_time, forecast_hour)` from a URL rendered with `template`.
///
/// Returns `None` when the URL does not follow the template. Templates without an
/// hour or forecast-hour placeholder yield midnight and hour 0.
pub fn parse_url(template: &str, base_url: &str, url: &str) -> Option<(DateTime<Utc>, u32)> {
    let base_url = base_url.trim_end_matches('/');
    let mut rest = url;
    let mut year = None;
    let mut date = None;
    let mut date_hour = None;
    let mut forecast_hour = None;

    for token in tokenize(template)? {
        match token {
            Token::Literal(literal) => rest = rest.strip_prefix(literal)?,
            Token::Field(Placeholder::Base) => rest = rest.strip_prefix(base_url)?,
            Token::Field(placeholder) => {
                let width = placeholder.width()?;
                let digits = rest.get(..width)?;
                if !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                rest = &rest[width..];
                match placeholder {
                    Placeholder::Year => year = Some(digits),
                    Placeholder::Date => date = Some(digits),
                    Placeholder::DateHour => date_hour = Some(digits),
                    Placeholder::ForecastHour => forecast_hour = Some(digits),
                    Placeholder::Base => {}
                }
            }
        }
    }
    if !rest.is_empty() {
        return None;
    }

    let naive = match (date_hour, date) {
        (Some(stamp), _) => {
            NaiveDateTime::parse_from_str(&format!("{stamp}00"), "%Y%m%d%H%M").ok()?
        }
        (None, Some(stamp)) => NaiveDate::parse_from_str(stamp, "%Y%m%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?,
        (None, None) => return None,
    };
    let analysis_time = Utc.from_utc_datetime(&naive);

    // every date-like placeholder must agree
    let formatted = analysis_time.format("%Y%m%d%H").to_string();
    if year.is_some_and(|y| !formatted.starts_with(y))
        || date.is_some_and(|d| !formatted.starts_with(d))
    {
        return None;
    }

    let forecast_hour = match forecast_hour {
        Some(digits) => digits.parse().ok()?,
        None => 0,
    };
    Some((analysis_time, forecast_hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::data_type::{DataType, GFS_URL_TEMPLATE, OBS_URL_TEMPLATE};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn renders_gfs_url() {
        let url = render_url(
            GFS_URL_TEMPLATE,
            DataType::Gfs.default_base_url(),
            at(2023, 1, 2, 6),
            3,
        );
        assert_eq!(
            url,
            "https://data.rda.ucar.edu/ds084.1/2023/20230102/gfs.0p25.2023010206.f003.grib2"
        );
    }

    #[test]
    fn renders_obs_url() {
        let url = render_url(
            OBS_URL_TEMPLATE,
            DataType::Obs.default_base_url(),
            at(2023, 1, 1, 0),
            0,
        );
        assert_eq!(
            url,
            "https://data.rda.ucar.edu/ds461.0/tarfiles/2023/gdassfcobs.20230101.tar.gz"
        );
    }

    #[test]
    fn gfs_url_round_trips() {
        let base = "http://mirror.example/gfs/";
        for (time, hour) in [
            (at(2023, 10, 1, 0), 0),
            (at(2024, 2, 29, 18), 12),
            (at(1999, 12, 31, 6), 240),
        ] {
            let url = render_url(GFS_URL_TEMPLATE, base, time, hour);
            assert_eq!(parse_url(GFS_URL_TEMPLATE, base, &url), Some((time, hour)));
        }
    }

    #[test]
    fn obs_url_round_trips_to_midnight() {
        let base = DataType::Obs.default_base_url();
        let url = render_url(OBS_URL_TEMPLATE, base, at(2023, 10, 1, 0), 0);
        assert_eq!(parse_url(OBS_URL_TEMPLATE, base, &url), Some((at(2023, 10, 1, 0), 0)));
    }

    #[test]
    fn rejects_foreign_urls() {
        let base = DataType::Gfs.default_base_url();
        let other =
            "https://data.rda.ucar.edu/ds084.1/2023/20231001/gfs.0p50.2023100100.f000.grib2";
        assert_eq!(parse_url(GFS_URL_TEMPLATE, base, other), None);

        // year directory disagrees with the file stamp
        let inconsistent =
            "https://data.rda.ucar.edu/ds084.1/2022/20231001/gfs.0p25.2023100100.f000.grib2";
        assert_eq!(parse_url(GFS_URL_TEMPLATE, base, inconsistent), None);
    }
}
