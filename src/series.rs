use crate::errors::{ForecastError, Result};
use crate::models::RawPoint;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Observations sorted by date with unique dates. Always holds at least two points.
///
/// When the input repeats a date, the entry that appears later in the input wins.
/// Gaps between dates are kept as-is; the estimators index time by day offset
/// and do not need evenly spaced input.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    points: Vec<ObservedPoint>,
}

impl TimeSeries {
    pub fn from_raw(raw: &[RawPoint]) -> Result<Self> {
        if raw.is_empty() {
            return Err(ForecastError::validation(
                "historical must contain at least 2 points, got none",
            ));
        }

        let mut parsed = Vec::with_capacity(raw.len());
        for (index, point) in raw.iter().enumerate() {
            let date = parse_date(index, point.date.as_ref())?;
            let value = parse_value(index, point.price.as_ref())?;
            parsed.push((date, value));
        }

        Self::from_points(parsed)
    }

    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Result<Self> {
        let mut by_date = BTreeMap::new();
        for (date, value) in points {
            if !value.is_finite() {
                return Err(ForecastError::validation(format!(
                    "value for {date} is not a finite number"
                )));
            }
            by_date.insert(date, value);
        }

        if by_date.len() < 2 {
            return Err(ForecastError::validation(format!(
                "historical must contain at least 2 distinct dates, got {}",
                by_date.len()
            )));
        }

        Ok(Self {
            points: by_date
                .into_iter()
                .map(|(date, value)| ObservedPoint { date, value })
                .collect(),
        })
    }

    pub fn points(&self) -> &[ObservedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    /// Days elapsed since the first observation, one entry per point.
    pub fn day_offsets(&self) -> Vec<f64> {
        let first = self.first_date();
        self.points
            .iter()
            .map(|point| (point.date - first).num_days() as f64)
            .collect()
    }

    /// Days between the first and last observation. Positive by construction.
    pub fn span_days(&self) -> f64 {
        (self.last_date() - self.first_date()).num_days() as f64
    }
}

fn parse_date(index: usize, raw: Option<&Value>) -> Result<NaiveDate> {
    let text = match raw {
        Some(Value::String(text)) => text.trim(),
        Some(other) => {
            return Err(ForecastError::validation(format!(
                "historical[{index}].date: expected a date string, got {other}"
            )));
        }
        None => {
            return Err(ForecastError::validation(format!(
                "historical[{index}].date: missing"
            )));
        }
    };

    parse_calendar_date(text).ok_or_else(|| {
        ForecastError::validation(format!(
            "historical[{index}].date: invalid calendar date {text:?}"
        ))
    })
}

fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|datetime| datetime.date_naive())
}

fn parse_value(index: usize, raw: Option<&Value>) -> Result<f64> {
    let value = match raw {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => {
            return Err(ForecastError::validation(format!(
                "historical[{index}].price: missing"
            )));
        }
    };

    match value {
        Some(value) if value.is_finite() => Ok(value),
        _ => Err(ForecastError::validation(format!(
            "historical[{index}].price: expected a finite number, got {}",
            raw.map(Value::to_string).unwrap_or_default()
        ))),
    }
}
