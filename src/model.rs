use crate::config::ForecastConfig;
use crate::errors::{ForecastError, Result};
use crate::linalg::Penalty;
use crate::seasonality::{WeeklySeasonality, calendar_day, centered_fourier_design, fit_weekly};
use crate::series::TimeSeries;
use crate::trend::{Covariates, Normalization, TrendFit, TrendModel, fit_trend, place_changepoints};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Noise floor relative to the series scale; keeps bands non-degenerate on exact data.
const MIN_NOISE: f64 = 1e-6;
/// Passes re-estimating the noise scale that sets the changepoint penalty.
const NOISE_PASSES: usize = 3;

/// Trend, weekly component and noise scale fitted to one history.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub trend: TrendModel,
    pub seasonality: WeeklySeasonality,
    /// Root mean square of in-sample residuals, in original units.
    pub residual_scale: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl FittedModel {
    pub fn predict(&self, date: NaiveDate) -> f64 {
        let day_offset = (date - self.first_date).num_days() as f64;
        self.trend.value_at(day_offset) + self.seasonality.value_at(calendar_day(date))
    }

    pub fn fitted_values(&self, series: &TimeSeries) -> Vec<f64> {
        series
            .points()
            .iter()
            .map(|point| self.predict(point.date))
            .collect()
    }
}

pub fn fit(series: &TimeSeries, config: &ForecastConfig) -> Result<FittedModel> {
    let norm = Normalization::for_series(series);
    let days: Vec<f64> = series
        .points()
        .iter()
        .map(|point| calendar_day(point.date))
        .collect();

    let order = if series.len() >= config.min_seasonal_points {
        config.fourier_order
    } else {
        warn!(
            points = series.len(),
            required = config.min_seasonal_points,
            "history too short for a weekly pattern, fitting trend only"
        );
        0
    };
    let fourier = centered_fourier_design(&days, order);

    // Baseline without changepoints gives the first noise estimate.
    let baseline = fit_trend(
        series,
        &norm,
        &[],
        MIN_NOISE,
        config,
        &seasonal_covariates(&fourier, order, MIN_NOISE, config),
    )?;
    let mut noise = joint_noise(&baseline, &fourier, &norm);

    let times: Vec<f64> = series
        .day_offsets()
        .iter()
        .map(|&day| norm.time(day))
        .collect();
    let changepoints = place_changepoints(&times, config);

    let mut last_pass = None;
    for _ in 0..NOISE_PASSES {
        let covariates = seasonal_covariates(&fourier, order, noise, config);
        let pass = fit_trend(series, &norm, &changepoints, noise, config, &covariates)?;
        let next = joint_noise(&pass, &fourier, &norm);
        let settled = (next - noise).abs() <= 1e-3 * noise;
        noise = next;
        last_pass = Some(pass);
        if settled {
            break;
        }
    }
    let trend_fit = last_pass.ok_or_else(|| ForecastError::fit("trend fit did not run"))?;

    let seasonality = fit_weekly(
        &days,
        &trend_fit.residuals,
        order,
        seasonal_ridge(noise, config),
    )?;

    // Squared in normalized units so values near f64::MAX stay finite.
    let residuals: Vec<f64> = trend_fit
        .residuals
        .iter()
        .zip(&days)
        .map(|(r, &day)| norm.value(r - seasonality.value_at(day)))
        .collect();
    let residual_scale = rms(&residuals).max(MIN_NOISE) * norm.y_scale;

    if !residual_scale.is_finite() {
        return Err(ForecastError::fit("residual scale is not finite"));
    }

    debug!(
        points = series.len(),
        changepoints = changepoints.len(),
        active = trend_fit.model.active_changepoints(),
        final_slope = trend_fit.model.final_slope(),
        weekly_amplitude = seasonality.amplitude(),
        residual_scale,
        "model fitted"
    );

    Ok(FittedModel {
        trend: trend_fit.model,
        seasonality,
        residual_scale,
        first_date: series.first_date(),
        last_date: series.last_date(),
    })
}

fn seasonal_covariates(
    fourier: &[Vec<f64>],
    order: usize,
    noise: f64,
    config: &ForecastConfig,
) -> Covariates {
    Covariates {
        rows: fourier.to_vec(),
        penalties: vec![Penalty::Ridge(seasonal_ridge(noise, config)); 2 * order],
    }
}

fn seasonal_ridge(noise: f64, config: &ForecastConfig) -> f64 {
    let noise = noise.max(MIN_NOISE);
    noise * noise / (config.seasonality_prior_scale * config.seasonality_prior_scale)
}

/// RMS of the joint trend-plus-weekly residual, in normalized units.
fn joint_noise(fit: &TrendFit, fourier: &[Vec<f64>], norm: &Normalization) -> f64 {
    let residuals: Vec<f64> = fit
        .residuals
        .iter()
        .enumerate()
        .map(|(i, &r)| {
            let weekly = fourier
                .get(i)
                .map(|row| {
                    row.iter()
                        .zip(&fit.covariate_coefficients)
                        .map(|(x, c)| x * c)
                        .sum::<f64>()
                })
                .unwrap_or(0.0);
            norm.value(r) - weekly
        })
        .collect();
    rms(&residuals).max(MIN_NOISE)
}

fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}
