// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Render payload decoding.
//!
//! CSV rows are `metric,timestamp,value` with an empty value for gaps, and
//! timestamps in the server's local time. JSON is a list of
//! `{"target": .., "datapoints": [[value, epoch_seconds], ..]}` objects.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::frame::Series;
use crate::error::{ReaderError, Result};

/// Timestamp layout of Graphite CSV output.
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Payload format requested from `/render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Csv,
    Json,
}

impl RenderFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderFormat::Csv => "csv",
            RenderFormat::Json => "json",
        }
    }

    pub fn parse(&self, body: &str) -> Result<Vec<Series>> {
        match self {
            RenderFormat::Csv => parse_csv(body),
            RenderFormat::Json => parse_json(body),
        }
    }
}

impl std::fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RenderFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "csv" => Ok(RenderFormat::Csv),
            "json" => Ok(RenderFormat::Json),
            _ => Err(format!("unknown render format: {s}, expected csv or json")),
        }
    }
}

/// Collects points per series name, keeping first-seen order.
#[derive(Default)]
struct SeriesBuilder {
    series: Vec<Series>,
    by_name: HashMap<String, usize>,
}

impl SeriesBuilder {
    /// Position of the series called `name`, created empty on first sight.
    fn entry(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.by_name.get(name) {
            return idx;
        }
        self.series.push(Series {
            name: name.to_string(),
            points: Vec::new(),
        });
        let idx = self.series.len() - 1;
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    fn push(&mut self, name: &str, time: NaiveDateTime, value: Option<f64>) {
        let idx = self.entry(name);
        if let Some(series) = self.series.get_mut(idx) {
            series.points.push((time, value));
        }
    }
}

pub fn parse_csv(body: &str) -> Result<Vec<Series>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(body.as_bytes());

    let mut builder = SeriesBuilder::default();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let (Some(name), Some(time), Some(value)) = (record.get(0), record.get(1), record.get(2))
        else {
            return Err(ReaderError::Parse(format!(
                "line {}: expected metric,timestamp,value",
                line + 1
            )));
        };

        let time = NaiveDateTime::parse_from_str(time.trim(), CSV_TIMESTAMP_FORMAT).map_err(|e| {
            ReaderError::Parse(format!("line {}: bad timestamp '{time}': {e}", line + 1))
        })?;
        let value = match value.trim() {
            "" => None,
            raw => Some(raw.parse::<f64>().map_err(|e| {
                ReaderError::Parse(format!("line {}: bad value '{raw}': {e}", line + 1))
            })?),
        };
        builder.push(name, time, value);
    }
    Ok(builder.series)
}

#[derive(Debug, Deserialize)]
struct JsonSeries {
    target: String,
    datapoints: Vec<(Option<f64>, i64)>,
}

pub fn parse_json(body: &str) -> Result<Vec<Series>> {
    let raw: Vec<JsonSeries> = serde_json::from_str(body)?;
    let mut builder = SeriesBuilder::default();
    for series in raw {
        // a series without points still gets its column
        builder.entry(&series.target);
        for (value, epoch) in series.datapoints {
            let time = DateTime::from_timestamp(epoch, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    ReaderError::Parse(format!(
                        "timestamp {epoch} of '{}' is out of range",
                        series.target
                    ))
                })?;
            builder.push(&series.target, time, value);
        }
    }
    Ok(builder.series)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_csv_groups_rows_by_metric() {
        let body = "servers.web1.cpu,2017-01-01 00:00:00,1.5\n\
                    servers.web1.cpu,2017-01-01 00:01:00,\n\
                    servers.web2.cpu,2017-01-01 00:00:00,7\n";
        let series = parse_csv(body).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "servers.web1.cpu");
        assert_eq!(
            series[0].points,
            vec![(at(0, 0, 0), Some(1.5)), (at(0, 1, 0), None)]
        );
        assert_eq!(series[1].points, vec![(at(0, 0, 0), Some(7.0))]);
    }

    #[test]
    fn test_csv_quoted_names_with_commas() {
        let body = "\"sumSeries(a.b,a.c)\",2017-01-01 00:00:10,3\n";
        let series = parse_csv(body).unwrap();
        assert_eq!(series[0].name, "sumSeries(a.b,a.c)");
        assert_eq!(series[0].points, vec![(at(0, 0, 10), Some(3.0))]);
    }

    #[test]
    fn test_csv_empty_body() {
        assert!(parse_csv("").unwrap().is_empty());
    }

    #[test]
    fn test_csv_errors() {
        assert!(matches!(
            parse_csv("a,2017-01-01 00:00:00\n"),
            Err(ReaderError::Parse(_))
        ));
        assert!(matches!(
            parse_csv("a,yesterday,1\n"),
            Err(ReaderError::Parse(_))
        ));
        assert!(matches!(
            parse_csv("a,2017-01-01 00:00:00,abc\n"),
            Err(ReaderError::Parse(_))
        ));
    }

    #[test]
    fn test_json_series() {
        let body = r#"[
            {"target": "a.b", "datapoints": [[1.0, 1483228800], [null, 1483228860]]},
            {"target": "a.c", "datapoints": []}
        ]"#;
        let series = parse_json(body).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series[0].points,
            vec![(at(0, 0, 0), Some(1.0)), (at(0, 1, 0), None)]
        );
        assert_eq!(series[1].name, "a.c");
        assert!(series[1].points.is_empty());
    }

    #[test]
    fn test_json_rejects_other_shapes() {
        assert!(matches!(parse_json("{}"), Err(ReaderError::Json(_))));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("csv".parse::<RenderFormat>().unwrap(), RenderFormat::Csv);
        assert_eq!("json".parse::<RenderFormat>().unwrap(), RenderFormat::Json);
        assert!("pickle".parse::<RenderFormat>().is_err());
    }
}
