//! Weekly Fourier seasonality.
//!
//! Time is the calendar day number (days since 0001-01-01), so a given weekday
//! always maps to the same phase regardless of where the history starts.

use crate::config::WEEKLY_PERIOD;
use crate::errors::Result;
use crate::linalg::{Penalty, penalized_least_squares};
use chrono::{Datelike, NaiveDate};
use std::f64::consts::TAU;

pub fn calendar_day(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// `[sin(2πkt/7), cos(2πkt/7)]` for `k = 1..=order`.
pub fn fourier_row(day: f64, order: usize) -> Vec<f64> {
    let phase = day.rem_euclid(WEEKLY_PERIOD) / WEEKLY_PERIOD;
    let mut row = Vec::with_capacity(2 * order);
    for k in 1..=order {
        let angle = TAU * k as f64 * phase;
        row.push(angle.sin());
        row.push(angle.cos());
    }
    row
}

pub fn fourier_design(days: &[f64], order: usize) -> Vec<Vec<f64>> {
    days.iter().map(|&day| fourier_row(day, order)).collect()
}

/// Mean of each Fourier column over the observed days.
pub fn column_means(design: &[Vec<f64>], order: usize) -> Vec<f64> {
    let mut means = vec![0.0; 2 * order];
    if design.is_empty() {
        return means;
    }
    for row in design {
        for (mean, x) in means.iter_mut().zip(row) {
            *mean += x;
        }
    }
    let n = design.len() as f64;
    means.iter_mut().for_each(|mean| *mean /= n);
    means
}

/// Fourier design with every column centred on its observed mean.
///
/// A constant level then belongs to the trend intercept alone, even when the
/// history never visits some weekdays and the raw columns could mimic a constant.
pub fn centered_fourier_design(days: &[f64], order: usize) -> Vec<Vec<f64>> {
    let mut design = fourier_design(days, order);
    let means = column_means(&design, order);
    for row in &mut design {
        for (x, mean) in row.iter_mut().zip(&means) {
            *x -= mean;
        }
    }
    design
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    pub sin: f64,
    pub cos: f64,
}

impl Harmonic {
    pub fn amplitude(&self) -> f64 {
        self.sin.hypot(self.cos)
    }

    /// Phase `φ` such that the harmonic equals `amplitude · sin(angle + φ)`.
    pub fn phase(&self) -> f64 {
        self.cos.atan2(self.sin)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySeasonality {
    harmonics: Vec<Harmonic>,
    /// Mean of the raw harmonic sum over the fitted days; subtracted on evaluation.
    level: f64,
}

impl WeeklySeasonality {
    pub fn zero(order: usize) -> Self {
        Self {
            harmonics: vec![Harmonic { sin: 0.0, cos: 0.0 }; order],
            level: 0.0,
        }
    }

    /// Builds the component from interleaved `[sin_1, cos_1, sin_2, cos_2, ...]`
    /// fitted against columns centred on `means`.
    pub fn from_coefficients(coefficients: &[f64], means: &[f64]) -> Self {
        Self {
            harmonics: coefficients
                .chunks_exact(2)
                .map(|pair| Harmonic {
                    sin: pair[0],
                    cos: pair[1],
                })
                .collect(),
            level: coefficients.iter().zip(means).map(|(c, m)| c * m).sum(),
        }
    }

    pub fn harmonics(&self) -> &[Harmonic] {
        &self.harmonics
    }

    pub fn order(&self) -> usize {
        self.harmonics.len()
    }

    pub fn value_at(&self, day: f64) -> f64 {
        let raw: f64 = fourier_row(day, self.order())
            .chunks_exact(2)
            .zip(&self.harmonics)
            .map(|(basis, h)| basis[0] * h.sin + basis[1] * h.cos)
            .sum();
        raw - self.level
    }

    pub fn amplitude(&self) -> f64 {
        self.harmonics.iter().map(Harmonic::amplitude).sum()
    }
}

/// Least-squares fit of the weekly series to `residuals` (the series minus its trend).
///
/// Columns are centred over `days`, so the fitted component averages to zero on
/// the history and never absorbs the level.
///
/// `ridge` is the Gaussian-prior penalty `σ² / prior_scale²`; it is scale free, so
/// the same value applies in original and normalized units.
pub fn fit_weekly(
    days: &[f64],
    residuals: &[f64],
    order: usize,
    ridge: f64,
) -> Result<WeeklySeasonality> {
    if order == 0 {
        return Ok(WeeklySeasonality::zero(0));
    }
    let means = column_means(&fourier_design(days, order), order);
    let design = centered_fourier_design(days, order);
    let penalties = vec![Penalty::Ridge(ridge); 2 * order];
    let coefficients = penalized_least_squares(&design, residuals, &penalties)?;
    Ok(WeeklySeasonality::from_coefficients(&coefficients, &means))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourier_row_is_periodic() {
        let a = fourier_row(3.0, 3);
        let b = fourier_row(3.0 + 7.0 * 1000.0, 3);
        assert_eq!(a.len(), 6);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn recovers_pure_sinusoid() {
        let days: Vec<f64> = (0..28).map(f64::from).collect();
        let residuals: Vec<f64> = days
            .iter()
            .map(|&d| 5.0 * (TAU * d / 7.0).sin() + 2.0 * (2.0 * TAU * d / 7.0).cos())
            .collect();
        let weekly = fit_weekly(&days, &residuals, 3, 1e-10).unwrap();
        let h = weekly.harmonics();
        assert!((h[0].sin - 5.0).abs() < 1e-6);
        assert!(h[0].cos.abs() < 1e-6);
        assert!((h[1].cos - 2.0).abs() < 1e-6);
        assert!(h[2].amplitude() < 1e-6);
        assert!((weekly.value_at(30.0) - residuals[2]).abs() < 1e-6);
    }

    #[test]
    fn harmonic_phase_matches_sine_form() {
        let h = Harmonic { sin: 3.0, cos: 4.0 };
        assert!((h.amplitude() - 5.0).abs() < 1e-12);
        let angle: f64 = 0.7;
        let direct = h.sin * angle.sin() + h.cos * angle.cos();
        assert!((h.amplitude() * (angle + h.phase()).sin() - direct).abs() < 1e-12);
    }

    #[test]
    fn calendar_day_anchors_weekdays() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let next_monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let a = fourier_row(calendar_day(monday), 3);
        let b = fourier_row(calendar_day(next_monday), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn centred_fit_averages_to_zero_on_weekdays_only() {
        // Five of seven phases, four weeks running.
        let days: Vec<f64> = (0..28)
            .filter(|d| d % 7 < 5)
            .map(|d| f64::from(d + 1))
            .collect();
        let residuals: Vec<f64> = days
            .iter()
            .map(|&d| if d % 7.0 == 3.0 { 2.0 } else { -0.5 })
            .collect();
        let weekly = fit_weekly(&days, &residuals, 3, 1e-10).unwrap();

        let mean: f64 = days.iter().map(|&d| weekly.value_at(d)).sum::<f64>() / days.len() as f64;
        assert!(mean.abs() < 1e-9);
        for (&d, &r) in days.iter().zip(&residuals) {
            assert!((weekly.value_at(d) - r).abs() < 1e-6);
        }
    }

    #[test]
    fn single_weekday_history_has_no_weekly_shape() {
        let days: Vec<f64> = (0..20).map(|w| f64::from(7 * w + 1)).collect();
        let design = centered_fourier_design(&days, 3);
        assert!(design.iter().flatten().all(|x| x.abs() < 1e-12));

        let residuals = vec![0.0; days.len()];
        let weekly = fit_weekly(&days, &residuals, 3, 1e-10).unwrap();
        for d in 0..7 {
            assert!(weekly.value_at(f64::from(d)).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_component_is_flat() {
        let weekly = WeeklySeasonality::zero(3);
        assert_eq!(weekly.order(), 3);
        assert_eq!(weekly.value_at(12.0), 0.0);
        assert_eq!(weekly.amplitude(), 0.0);
    }
}
