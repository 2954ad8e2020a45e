use std::{env, net::SocketAddr, str::FromStr};
use thiserror::Error;
use tracing::warn;

/// Base period of the seasonal component, in days.
pub const WEEKLY_PERIOD: f64 = 7.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Hyperparameters of a single fit. Passed into every fitting call.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Number of future calendar days to forecast.
    pub horizon: usize,
    /// Nominal coverage of the `[lower, upper]` band.
    pub interval_width: f64,
    /// Scale of the Laplace prior on slope changes. Smaller means a smoother trend.
    pub changepoint_prior_scale: f64,
    /// Upper bound on candidate changepoints.
    pub n_changepoints: usize,
    /// Leading fraction of the history in which changepoints may be placed.
    pub changepoint_range: f64,
    /// Harmonics of the weekly Fourier series.
    pub fourier_order: usize,
    /// Scale of the Gaussian prior on seasonal coefficients.
    pub seasonality_prior_scale: f64,
    /// Below this many points the weekly component is not estimated.
    pub min_seasonal_points: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 7,
            interval_width: 0.95,
            changepoint_prior_scale: 0.05,
            n_changepoints: 25,
            changepoint_range: 0.8,
            fourier_order: 3,
            seasonality_prior_scale: 10.0,
            min_seasonal_points: 14,
        }
    }
}

impl ForecastConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            horizon: env_or("FORECAST_HORIZON", defaults.horizon),
            interval_width: env_or("FORECAST_INTERVAL_WIDTH", defaults.interval_width),
            changepoint_prior_scale: env_or(
                "FORECAST_CHANGEPOINT_PRIOR_SCALE",
                defaults.changepoint_prior_scale,
            ),
            n_changepoints: env_or("FORECAST_N_CHANGEPOINTS", defaults.n_changepoints),
            changepoint_range: env_or("FORECAST_CHANGEPOINT_RANGE", defaults.changepoint_range),
            fourier_order: env_or("FORECAST_FOURIER_ORDER", defaults.fourier_order),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(out_of_range("horizon", "at least 1", self.horizon));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(out_of_range(
                "interval_width",
                "strictly between 0 and 1",
                self.interval_width,
            ));
        }
        if !(self.changepoint_prior_scale.is_finite() && self.changepoint_prior_scale > 0.0) {
            return Err(out_of_range(
                "changepoint_prior_scale",
                "a positive number",
                self.changepoint_prior_scale,
            ));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(out_of_range(
                "changepoint_range",
                "in (0, 1]",
                self.changepoint_range,
            ));
        }
        if !(self.seasonality_prior_scale.is_finite() && self.seasonality_prior_scale > 0.0) {
            return Err(out_of_range(
                "seasonality_prior_scale",
                "a positive number",
                self.seasonality_prior_scale,
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8080),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => parse_or(name, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(name: &str, raw: &str, default: T) -> T {
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!("ignoring {name}={raw:?}: not a valid value, using {default}");
            default
        }
    }
}

fn out_of_range(name: &'static str, expected: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::OutOfRange {
        name,
        expected,
        value: value.to_string(),
    }
}
