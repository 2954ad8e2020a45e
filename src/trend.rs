//! Piecewise-linear trend with automatically placed changepoints.
//!
//! The trend is fit on normalized axes: time runs from 0 at the first observation
//! to 1 at the last, and values are divided by the largest absolute value. Each
//! candidate changepoint contributes a hinge column `max(0, t - s)` whose
//! coefficient is the slope change at `s`. Slope changes carry a Laplace prior with
//! scale `changepoint_prior_scale`, which becomes an L1 penalty `σ²/τ · Σ|δ|`.

use crate::config::ForecastConfig;
use crate::errors::Result;
use crate::linalg::{Penalty, penalized_least_squares};
use crate::series::TimeSeries;

/// Slope changes smaller than this (in normalized units) count as inactive.
const ACTIVE_DELTA: f64 = 1e-6;

/// Maps days and values onto the unit axes the estimators work on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub span_days: f64,
    pub y_scale: f64,
}

impl Normalization {
    pub fn for_series(series: &TimeSeries) -> Self {
        let y_max = series
            .points()
            .iter()
            .map(|point| point.value.abs())
            .fold(0.0, f64::max);
        Self {
            span_days: series.span_days().max(1.0),
            y_scale: if y_max > 0.0 { y_max } else { 1.0 },
        }
    }

    pub fn time(&self, day_offset: f64) -> f64 {
        day_offset / self.span_days
    }

    pub fn value(&self, value: f64) -> f64 {
        value / self.y_scale
    }
}

/// One linear piece: `intercept + slope * t` for day offsets `t >= start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSegment {
    pub start: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl TrendSegment {
    pub fn value_at(&self, day_offset: f64) -> f64 {
        self.intercept + self.slope * day_offset
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendModel {
    segments: Vec<TrendSegment>,
    /// Slope change at each candidate changepoint, in value per day.
    slope_changes: Vec<f64>,
    active: usize,
    span_days: f64,
}

impl TrendModel {
    pub fn value_at(&self, day_offset: f64) -> f64 {
        let index = self
            .segments
            .iter()
            .rposition(|segment| segment.start <= day_offset)
            .unwrap_or(0);
        self.segments[index].value_at(day_offset)
    }

    pub fn segments(&self) -> &[TrendSegment] {
        &self.segments
    }

    pub fn slope_changes(&self) -> &[f64] {
        &self.slope_changes
    }

    /// Candidate changepoints, as day offsets from the first observation.
    pub fn changepoints(&self) -> impl Iterator<Item = f64> + '_ {
        self.segments.iter().skip(1).map(|segment| segment.start)
    }

    pub fn active_changepoints(&self) -> usize {
        self.active
    }

    pub fn span_days(&self) -> f64 {
        self.span_days
    }

    pub fn final_slope(&self) -> f64 {
        self.segments.last().map(|segment| segment.slope).unwrap_or(0.0)
    }
}

/// Extra columns estimated jointly with the trend, in normalized units.
#[derive(Debug, Clone, Default)]
pub struct Covariates {
    pub rows: Vec<Vec<f64>>,
    pub penalties: Vec<Penalty>,
}

#[derive(Debug, Clone)]
pub struct TrendFit {
    pub model: TrendModel,
    /// `value - trend` for every observation, in original units.
    pub residuals: Vec<f64>,
    /// Coefficients of the covariate columns, in normalized units.
    pub covariate_coefficients: Vec<f64>,
}

/// Picks candidate changepoints on the normalized time axis.
///
/// Up to `min(n_changepoints, n / 5)` candidates go on evenly spaced observations
/// inside the leading `changepoint_range` of the history. The first observation is
/// never a candidate.
pub fn place_changepoints(times: &[f64], config: &ForecastConfig) -> Vec<f64> {
    let n = times.len();
    let hist_size = ((n as f64) * config.changepoint_range).floor() as usize;
    let count = config
        .n_changepoints
        .min(n / 5)
        .min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }

    let step = (hist_size - 1) as f64 / count as f64;
    (1..=count)
        .map(|i| times[(i as f64 * step).round() as usize])
        .collect()
}

/// Fits `values ≈ trend(t) + covariates · γ` with L1-penalized slope changes.
///
/// `noise_scale` is the observation noise in normalized units and sets the
/// strength of the changepoint penalty.
pub fn fit_trend(
    series: &TimeSeries,
    norm: &Normalization,
    changepoints: &[f64],
    noise_scale: f64,
    config: &ForecastConfig,
    covariates: &Covariates,
) -> Result<TrendFit> {
    let days = series.day_offsets();
    let values = series.values();
    let lambda = noise_scale * noise_scale / config.changepoint_prior_scale;

    let mut design = Vec::with_capacity(days.len());
    for (i, &day) in days.iter().enumerate() {
        let mut row = trend_row(norm.time(day), changepoints);
        if let Some(extra) = covariates.rows.get(i) {
            row.extend_from_slice(extra);
        }
        design.push(row);
    }
    let target: Vec<f64> = values.iter().map(|&value| norm.value(value)).collect();

    let mut penalties = vec![Penalty::None, Penalty::None];
    penalties.extend(changepoints.iter().map(|_| Penalty::Lasso(lambda)));
    penalties.extend_from_slice(&covariates.penalties);

    let coefficients = penalized_least_squares(&design, &target, &penalties)?;
    let trend_width = 2 + changepoints.len();
    let model = build_model(&coefficients[..trend_width], changepoints, norm);
    let residuals = days
        .iter()
        .zip(&values)
        .map(|(&day, &value)| value - model.value_at(day))
        .collect();

    Ok(TrendFit {
        model,
        residuals,
        covariate_coefficients: coefficients[trend_width..].to_vec(),
    })
}

fn trend_row(t: f64, changepoints: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + changepoints.len());
    row.push(1.0);
    row.push(t);
    row.extend(changepoints.iter().map(|&s| (t - s).max(0.0)));
    row
}

/// Converts `[offset, base slope, δ_1..δ_K]` on normalized axes into day-unit segments.
fn build_model(coefficients: &[f64], changepoints: &[f64], norm: &Normalization) -> TrendModel {
    let (offset, base_slope, deltas) = (coefficients[0], coefficients[1], &coefficients[2..]);
    let slope_unit = norm.y_scale / norm.span_days;

    let mut segments = Vec::with_capacity(changepoints.len() + 1);
    segments.push(TrendSegment {
        start: 0.0,
        slope: base_slope * slope_unit,
        intercept: offset * norm.y_scale,
    });

    let (mut slope, mut intercept) = (base_slope, offset);
    for (&s, &delta) in changepoints.iter().zip(deltas) {
        slope += delta;
        intercept -= delta * s;
        segments.push(TrendSegment {
            start: s * norm.span_days,
            slope: slope * slope_unit,
            intercept: intercept * norm.y_scale,
        });
    }

    TrendModel {
        segments,
        slope_changes: deltas.iter().map(|delta| delta * slope_unit).collect(),
        active: deltas.iter().filter(|delta| delta.abs() > ACTIVE_DELTA).count(),
        span_days: norm.span_days,
    }
}
