//! Exogenous forcing: pure functions of simulation time.
//!
//! Time is measured in years since first landfall.

use std::f64::consts::PI;

use crate::params::{HumanParams, RodentParams};

/// Logistic human population
/// `K / (1 + ((K - P0) / P0) * exp(-r t))`.
///
/// Equals `P0` at `t = 0` and rises monotonically towards `K`.
pub fn human_population(humans: &HumanParams, t: f64) -> f64 {
    let k = humans.carrying_capacity;
    let p0 = humans.initial_population;
    k / (1.0 + ((k - p0) / p0) * (-humans.intrinsic_growth * t).exp())
}

/// Position within the nut season, in [0, 1] with a period of one year.
/// Zero at the turn of each year, one at mid-year.
pub fn seasonal_factor(t: f64) -> f64 {
    0.5 * (1.0 + (2.0 * PI * t - PI / 2.0).sin())
}

/// Rodents the island can currently feed.
///
/// Per-tree capacity swings between the base and peak values with the
/// season; the result never drops below the minimum viable population, so
/// a vanished forest does not produce a zero capacity.
pub fn seasonal_carrying_capacity(rodents: &RodentParams, t: f64, mature_palms: f64) -> f64 {
    let per_tree = rodents.base_capacity_per_tree
        + seasonal_factor(t) * (rodents.peak_capacity_per_tree - rodents.base_capacity_per_tree);
    (mature_palms * per_tree).max(rodents.minimum_viable_population)
}
