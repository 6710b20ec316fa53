//! Parser for the whitespace-aligned text reports written by the BUFR surface decoder.
//!
//! A report looks like
//!
//! ```text
//! |
//! |  REPORT TIME  | STATION |  LATI-  |  LONGI-  |  AIR.T  |  DEWPT  |  WIND  |  WIND  |  3H PR  |
//! |  YYYYMMDDHHMM | ID      |  DEG    |  DEG     |  K      |  K      |  DEG   |  M/S   |  KG/M2  |
//! |  202310010000 | 93110   |  -36.9  |  174.8   |  288.1  |  284.2  |  230   |  5.1   |  0.0    |
//! ```
//!
//! Column separators are dropped, and on the second line single spaces between words
//! become `-`, so multi-word labels such as `REPORT TIME` stay one token. The first
//! non-blank line is the header and the first row after it carries units.

use crate::decode::error::DecodeError;
use crate::types::observation::{ObservationTable, NUMERIC_COLUMNS, REPORT_COLUMNS};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

pub const REPORT_TIME_FORMAT: &str = "%Y%m%d%H%M";

/// Replaces every whitespace character that has no whitespace on either side with `-`.
/// A line break directly after a word counts as such a character.
fn hyphenate_single_spaces(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let after_space = i > 0 && chars[i - 1].is_whitespace();
            let before_space = chars.get(i + 1).is_some_and(|n| n.is_whitespace());
            if c.is_whitespace() && !after_space && !before_space {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// Suffixes repeated names with `.1`, `.2`, ... in order of appearance.
fn deduplicate_header(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

fn parse_number(token: Option<&str>) -> Option<f64> {
    token
        .and_then(|t| t.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parses a decoded report into a table with the observation columns.
///
/// `path` is only used to name the report in errors.
pub fn parse_report(text: &str, path: &Path) -> Result<ObservationTable, DecodeError> {
    let malformed = |line: usize, message: String| DecodeError::MalformedReport {
        path: path.to_path_buf(),
        line,
        message,
    };

    let lines = text.split_inclusive('\n').enumerate().map(|(idx, raw)| {
        let line = raw.replace('|', "");
        let line = if idx == 1 {
            hyphenate_single_spaces(&line)
        } else {
            line
        };
        (idx + 1, line)
    });
    let mut rows = lines
        .map(|(number, line)| {
            let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            (number, tokens)
        })
        .filter(|(_, tokens)| !tokens.is_empty());

    let (_, header) = rows
        .next()
        .ok_or_else(|| malformed(0, "report has no header".to_string()))?;
    let header = deduplicate_header(header);

    let positions = REPORT_COLUMNS
        .iter()
        .map(|(name, _)| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DecodeError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
        })
        .collect::<Result<Vec<usize>, _>>()?;

    let mut datetimes: Vec<NaiveDateTime> = Vec::new();
    let mut stations: Vec<Option<String>> = Vec::new();
    let mut numbers: Vec<Vec<Option<f64>>> = vec![Vec::new(); NUMERIC_COLUMNS.len()];

    // The first row holds units
    for (number, tokens) in rows.skip(1) {
        if tokens.len() > header.len() {
            return Err(malformed(
                number,
                format!("expected at most {} fields, found {}", header.len(), tokens.len()),
            ));
        }
        let field = |column: usize| tokens.get(positions[column]).map(String::as_str);

        let report_time = field(0).unwrap_or_default();
        let datetime = NaiveDateTime::parse_from_str(report_time, REPORT_TIME_FORMAT)
            .map_err(|source| DecodeError::InvalidTimestamp {
                path: path.to_path_buf(),
                value: report_time.to_string(),
                source,
            })?;
        datetimes.push(datetime);
        stations.push(field(1).map(str::to_string));
        for (i, values) in numbers.iter_mut().enumerate() {
            values.push(parse_number(field(i + 2)));
        }
    }

    let mut columns = vec![
        Column::new(REPORT_COLUMNS[0].1.into(), datetimes),
        Column::new(REPORT_COLUMNS[1].1.into(), stations),
    ];
    for ((_, name), values) in REPORT_COLUMNS[2..].iter().zip(numbers) {
        columns.push(Column::new((*name).into(), values));
    }
    Ok(ObservationTable::new(DataFrame::new(columns)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const REPORT: &str = "\
|
|  REPORT TIME  |  STATION  |  LATI-   |  LONGI-  |  AIR.T   |  DEWPT  |  WIND  |  WIND  |  3H PR  |
|  YYYYMMDDHHMM |  ID       |  DEG     |  DEG     |  K       |  K      |  DEG   |  M/S   |  KG/M2  |
|  202310010000 |  93110    |  -36.92  |  174.80  |  288.1   |  284.2  |  230   |  5.1   |  0.0    |

|  202310010030 |  93439    |  -41.33  |  174.80  |  ******  |  280.0  |  180   |  7.2   |
";

    fn parse(text: &str) -> Result<ObservationTable, DecodeError> {
        parse_report(text, Path::new("/archive/gdas.adpsfc.t00z.bufr.txt"))
    }

    #[test]
    fn hyphenates_single_spaces_only() {
        assert_eq!(hyphenate_single_spaces("3H PR  DEG K\n"), "3H-PR  DEG-K-");
        assert_eq!(hyphenate_single_spaces("  A  "), "  A  ");
    }

    #[test]
    fn deduplicates_repeated_headers() {
        let names = ["WIND", "WIND", "AIR.T", "WIND"].map(String::from).to_vec();
        assert_eq!(
            deduplicate_header(names),
            vec!["WIND", "WIND.1", "AIR.T", "WIND.2"]
        );
    }

    #[test]
    fn parses_rows_after_the_unit_row() {
        let table = parse(REPORT).unwrap();
        let frame = &table.frame;
        assert_eq!(frame.height(), 2);
        assert_eq!(
            frame.get_column_names_str(),
            vec![
                "datetime",
                "station_id",
                "latitude",
                "longitude",
                "temperature",
                "dewpoint",
                "wind_dir",
                "wind_spd",
                "rain"
            ]
        );

        let stations = frame.column("station_id").unwrap().str().unwrap();
        assert_eq!(stations.get(0), Some("93110"));
        assert_eq!(stations.get(1), Some("93439"));

        let latitude = frame.column("latitude").unwrap().f64().unwrap();
        assert_eq!(latitude.get(1), Some(-41.33));
        let wind_spd = frame.column("wind_spd").unwrap().f64().unwrap();
        assert_eq!(wind_spd.get(0), Some(5.1));
    }

    #[test]
    fn unparseable_and_missing_values_are_null() {
        let table = parse(REPORT).unwrap();
        let temperature = table.frame.column("temperature").unwrap().f64().unwrap();
        assert_eq!(temperature.get(0), Some(288.1));
        assert_eq!(temperature.get(1), None);
        let rain = table.frame.column("rain").unwrap().f64().unwrap();
        assert_eq!(rain.get(1), None);
    }

    #[test]
    fn report_time_becomes_datetime() {
        let table = parse(REPORT).unwrap();
        let column = table.frame.column("datetime").unwrap();
        assert!(matches!(column.dtype(), DataType::Datetime(_, _)));
        let expected = NaiveDate::from_ymd_opt(2023, 10, 1)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap();
        let millis = column.cast(&DataType::Int64).unwrap();
        assert_eq!(
            millis.i64().unwrap().get(1),
            Some(expected.and_utc().timestamp_millis())
        );
    }

    #[test]
    fn header_only_report_is_empty() {
        let text = REPORT.lines().take(3).collect::<Vec<_>>().join("\n");
        let table = parse(&text).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.frame.width(), 9);
    }

    #[test]
    fn missing_column_is_reported() {
        let text = REPORT.replace("3H PR", "6H PR");
        match parse(&text).unwrap_err() {
            DecodeError::MissingColumn { column, .. } => assert_eq!(column, "3H-PR"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn extra_fields_are_rejected() {
        let text = format!("{REPORT}| 202310010100 | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9 | 10 |\n");
        match parse(&text).unwrap_err() {
            DecodeError::MalformedReport { line, .. } => assert_eq!(line, 7),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bad_report_time_is_rejected() {
        let text = REPORT.replace("202310010030", "2023100100XX");
        assert!(matches!(
            parse(&text).unwrap_err(),
            DecodeError::InvalidTimestamp { .. }
        ));
    }
}
