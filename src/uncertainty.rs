//! Horizon-dependent prediction intervals.
//!
//! The band combines observation noise with trend uncertainty. Future changepoints
//! are assumed to arrive at the in-sample rate (candidates per day of history) with
//! Laplace-distributed slope changes whose scale is the mean absolute in-sample
//! change. A slope change at lead time `u` moves the forecast at horizon `h` by
//! `δ · (h - u)`, so integrating over `u` gives the trend variance
//! `rate · 2b² · h³ / 3`.

use crate::config::ForecastConfig;
use crate::errors::{ForecastError, Result};
use crate::trend::TrendModel;
use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalEstimator {
    z: f64,
    residual_scale: f64,
    changepoint_rate: f64,
    slope_change_scale: f64,
}

impl IntervalEstimator {
    pub fn new(trend: &TrendModel, residual_scale: f64, config: &ForecastConfig) -> Result<Self> {
        let deltas = trend.slope_changes();
        let slope_change_scale = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().map(|delta| delta.abs()).sum::<f64>() / deltas.len() as f64
        };

        Ok(Self {
            z: z_score(config.interval_width)?,
            residual_scale,
            changepoint_rate: deltas.len() as f64 / trend.span_days(),
            slope_change_scale,
        })
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Standard deviation contributed by future slope changes `days` past the last
    /// observation. `b` stays outside the root so huge series do not overflow.
    pub fn trend_deviation(&self, days: f64) -> f64 {
        self.slope_change_scale * (self.changepoint_rate * 2.0 * days.powi(3) / 3.0).sqrt()
    }

    /// Half-width of the band `days` past the last observation. Non-decreasing in `days`.
    pub fn half_width(&self, days: f64) -> f64 {
        self.z * self.residual_scale.hypot(self.trend_deviation(days))
    }

    /// `(lower, upper)` around `predicted`, clamped so the point always lies inside.
    pub fn bounds(&self, predicted: f64, days: f64) -> (f64, f64) {
        let width = self.half_width(days);
        ((predicted - width).min(predicted), (predicted + width).max(predicted))
    }
}

/// Two-sided standard normal quantile for the given coverage.
pub fn z_score(interval_width: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0)
        .map_err(|err| ForecastError::fit(format!("standard normal unavailable: {err}")))?;
    Ok(normal.inverse_cdf(0.5 + interval_width / 2.0))
}
