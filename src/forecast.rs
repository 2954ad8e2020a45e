use crate::config::ForecastConfig;
use crate::errors::{ForecastError, Result};
use crate::model::{FittedModel, fit};
use crate::models::ForecastPointDto;
use crate::series::TimeSeries;
use crate::uncertainty::IntervalEstimator;
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

impl From<&ForecastPoint> for ForecastPointDto {
    fn from(point: &ForecastPoint) -> Self {
        Self {
            date: point.date.format("%Y-%m-%d").to_string(),
            predicted: point.predicted,
            lower: point.lower,
            upper: point.upper,
        }
    }
}

/// Fits a fresh model to `series` and forecasts `config.horizon` days past its end.
pub fn forecast(series: &TimeSeries, config: &ForecastConfig) -> Result<Vec<ForecastPoint>> {
    let model = fit(series, config)?;
    let intervals = IntervalEstimator::new(&model.trend, model.residual_scale, config)?;
    generate(&model, &intervals, config.horizon)
}

/// Evaluates the model on the `horizon` calendar days after the last observation.
pub fn generate(
    model: &FittedModel,
    intervals: &IntervalEstimator,
    horizon: usize,
) -> Result<Vec<ForecastPoint>> {
    let mut points = Vec::with_capacity(horizon);
    for step in 1..=horizon {
        let date = model
            .last_date
            .checked_add_signed(Duration::days(step as i64))
            .ok_or_else(|| ForecastError::fit("forecast date out of range"))?;
        let predicted = model.predict(date);
        let (lower, upper) = intervals.bounds(predicted, step as f64);

        if !(predicted.is_finite() && lower.is_finite() && upper.is_finite()) {
            return Err(ForecastError::fit(format!("forecast for {date} is not finite")));
        }
        points.push(ForecastPoint {
            date,
            predicted,
            lower,
            upper,
        });
    }
    Ok(points)
}
