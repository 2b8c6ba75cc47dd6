//! Boom-bust diagnostics for the rodent population.

use serde::Serialize;

use crate::simulation::Trajectory;

/// Rodent variability over a time window of one trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeasonalProfile {
    pub start: f64,
    pub end: f64,
    /// Samples that fell inside `[start, end]`.
    pub samples: usize,
    /// Mean of the within-year max/min ratio over sliding one-year windows.
    pub seasonal_swing: f64,
    pub coefficient_of_variation: f64,
    pub mean_relative_change: f64,
}

impl SeasonalProfile {
    /// Profiles the samples with `start <= t <= end`.
    pub fn over(trajectory: &Trajectory, start: f64, end: f64) -> Self {
        let rats: Vec<f64> = trajectory
            .times()
            .iter()
            .zip(trajectory.states())
            .filter(|&(&t, _)| t >= start && t <= end)
            .map(|(_, s)| s.rats)
            .collect();

        Self {
            start,
            end,
            samples: rats.len(),
            seasonal_swing: rolling_swing(&rats, trajectory.samples_per_year()),
            coefficient_of_variation: coefficient_of_variation(&rats),
            mean_relative_change: mean_relative_change(&rats),
        }
    }
}

/// Mean max/min ratio over the windows `values[i - window..i]` for
/// `i in window..len`. A window whose minimum is zero contributes 0.
pub fn rolling_swing(values: &[f64], window: usize) -> f64 {
    if window == 0 || values.len() <= window {
        return 0.0;
    }
    let ratios: Vec<f64> = (window..values.len())
        .map(|i| {
            let chunk = &values[i - window..i];
            let max = chunk.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = chunk.iter().copied().fold(f64::INFINITY, f64::min);
            if min > 0.0 {
                max / min
            } else {
                0.0
            }
        })
        .collect();
    mean(&ratios)
}

/// Population standard deviation over mean; 0 for an empty or non-positive
/// series.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if values.is_empty() || m <= 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / m
}

/// Mean of `|x[i] - x[i-1]| / x[i-1]`, skipping zero predecessors.
pub fn mean_relative_change(values: &[f64]) -> f64 {
    let changes: Vec<f64> = values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]).abs() / w[0])
        .collect();
    mean(&changes)
}

/// Time at which the mature cohort's mean age first exceeds the senescence
/// onset age.
pub fn senescence_onset(trajectory: &Trajectory) -> Option<f64> {
    let onset = trajectory.params().palms.senescence_age;
    trajectory
        .times()
        .iter()
        .zip(trajectory.states())
        .find(|(_, s)| s.mature_avg_age > onset)
        .map(|(&t, _)| t)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
