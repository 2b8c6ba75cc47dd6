//! Rodent-only versus rodent-and-human scenario comparison.

use serde::Serialize;
use tracing::info;

use crate::error::SimulationError;
use crate::params::EcosystemParams;
use crate::simulation::{simulate, SimulationSettings, Trajectory};
use crate::state::EcosystemState;

/// Forest-size milestones, in total palms.
pub const DEFAULT_THRESHOLDS: [f64; 5] = [
    10_000_000.0,
    5_000_000.0,
    1_000_000.0,
    100_000.0,
    10_000.0,
];

/// Headline numbers for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub disturbance: bool,
    pub horizon: f64,
    pub final_state: EcosystemState,
    pub initial_total: f64,
    pub final_total: f64,
    /// Share of the starting forest still standing, in percent.
    pub percent_remaining: f64,
    pub peak_rats: f64,
    pub peak_rats_time: f64,
    pub peak_rats_year: f64,
    /// Palms lost per year, averaged over the whole horizon.
    pub decline_rate: f64,
}

impl ScenarioSummary {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        let initial_total = trajectory.initial_state().total_palms();
        let final_state = trajectory.final_state();
        let final_total = final_state.total_palms();
        let horizon = trajectory.horizon();

        // First maximum wins on ties.
        let (peak_index, peak_rats) = trajectory
            .states()
            .iter()
            .map(|s| s.rats)
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, r)| {
                if r > best.1 {
                    (i, r)
                } else {
                    best
                }
            });
        let peak_rats_time = trajectory.times().get(peak_index).copied().unwrap_or(0.0);

        Self {
            disturbance: trajectory.disturbance(),
            horizon,
            final_state,
            initial_total,
            final_total,
            percent_remaining: if initial_total > 0.0 {
                final_total / initial_total * 100.0
            } else {
                0.0
            },
            peak_rats: peak_rats.max(0.0),
            peak_rats_time,
            peak_rats_year: trajectory.start_year() + peak_rats_time,
            decline_rate: if horizon > 0.0 {
                (initial_total - final_total) / horizon
            } else {
                0.0
            },
        }
    }
}

/// Time of the first sample whose total palm count is strictly below
/// `threshold`.
pub fn first_crossing_below(trajectory: &Trajectory, threshold: f64) -> Option<f64> {
    trajectory
        .times()
        .iter()
        .zip(trajectory.states())
        .find(|(_, s)| s.total_palms() < threshold)
        .map(|(&t, _)| t)
}

/// When each scenario first dropped below one forest size.
/// Times are years since landfall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdCrossing {
    pub threshold: f64,
    pub undisturbed: Option<f64>,
    pub disturbed: Option<f64>,
    /// Disturbed minus undisturbed, when both were reached.
    pub difference: Option<f64>,
}

impl ThresholdCrossing {
    fn between(threshold: f64, undisturbed: &Trajectory, disturbed: &Trajectory) -> Self {
        let u = first_crossing_below(undisturbed, threshold);
        let d = first_crossing_below(disturbed, threshold);
        Self {
            threshold,
            undisturbed: u,
            disturbed: d,
            difference: u.zip(d).map(|(u, d)| d - u),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonStatistics {
    pub undisturbed: ScenarioSummary,
    pub disturbed: ScenarioSummary,
    pub milestones: Vec<ThresholdCrossing>,
    /// Palms standing without humans minus palms standing with them.
    pub additional_loss: f64,
    /// `additional_loss` relative to the rodent-only final forest, in
    /// percent. Absent when that forest is gone entirely.
    pub percent_difference: Option<f64>,
    /// Ratio of decline rates; absent when the rodent-only forest did not
    /// decline.
    pub acceleration_factor: Option<f64>,
    /// Rodent-only peak minus disturbed peak.
    pub peak_rat_difference: f64,
}

impl ComparisonStatistics {
    fn compute(undisturbed: &Trajectory, disturbed: &Trajectory, thresholds: &[f64]) -> Self {
        let u = ScenarioSummary::from_trajectory(undisturbed);
        let d = ScenarioSummary::from_trajectory(disturbed);
        let additional_loss = u.final_total - d.final_total;

        Self {
            undisturbed: u,
            disturbed: d,
            milestones: thresholds
                .iter()
                .map(|&th| ThresholdCrossing::between(th, undisturbed, disturbed))
                .collect(),
            additional_loss,
            percent_difference: (u.final_total > 0.0)
                .then(|| additional_loss / u.final_total * 100.0),
            acceleration_factor: (u.decline_rate > 0.0).then(|| d.decline_rate / u.decline_rate),
            peak_rat_difference: u.peak_rats - d.peak_rats,
        }
    }
}

/// Both scenarios of one experiment and the statistics relating them.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioComparison {
    pub undisturbed: Trajectory,
    pub disturbed: Trajectory,
    pub statistics: ComparisonStatistics,
}

impl ScenarioComparison {
    /// Runs both scenarios with the default milestones.
    ///
    /// The disturbance flag in `params` is ignored; each run sets its own.
    pub fn run(
        params: &EcosystemParams,
        initial: &EcosystemState,
        settings: &SimulationSettings,
    ) -> Result<Self, SimulationError> {
        Self::run_with_thresholds(params, initial, settings, &DEFAULT_THRESHOLDS)
    }

    pub fn run_with_thresholds(
        params: &EcosystemParams,
        initial: &EcosystemState,
        settings: &SimulationSettings,
        thresholds: &[f64],
    ) -> Result<Self, SimulationError> {
        let undisturbed = simulate(&params.with_disturbance(false), initial, settings)?;
        info!(
            "Rodent-only scenario finished with {:.0} palms",
            undisturbed.final_state().total_palms()
        );
        let disturbed = simulate(&params.with_disturbance(true), initial, settings)?;
        info!(
            "Rodent-and-human scenario finished with {:.0} palms",
            disturbed.final_state().total_palms()
        );
        Self::from_trajectories(undisturbed, disturbed, thresholds)
    }

    /// Pairs two finished runs. They must share a time grid and a starting
    /// state, and differ in the disturbance flag as labelled.
    pub fn from_trajectories(
        undisturbed: Trajectory,
        disturbed: Trajectory,
        thresholds: &[f64],
    ) -> Result<Self, SimulationError> {
        if undisturbed.disturbance() || !disturbed.disturbance() {
            return Err(SimulationError::Mismatch(
                "expected one rodent-only and one disturbed trajectory".into(),
            ));
        }
        if undisturbed.times() != disturbed.times() {
            return Err(SimulationError::Mismatch(format!(
                "time grids differ ({} vs {} samples)",
                undisturbed.len(),
                disturbed.len()
            )));
        }
        if undisturbed.initial_state() != disturbed.initial_state() {
            return Err(SimulationError::Mismatch("initial states differ".into()));
        }
        if let Some(bad) = thresholds.iter().find(|th| !th.is_finite() || **th < 0.0) {
            return Err(SimulationError::Mismatch(format!(
                "threshold {bad} is not a non-negative palm count"
            )));
        }

        let statistics = ComparisonStatistics::compute(&undisturbed, &disturbed, thresholds);
        Ok(Self {
            undisturbed,
            disturbed,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{first_crossing_below, ScenarioComparison, ScenarioSummary};
    use crate::error::SimulationError;
    use crate::params::EcosystemParams;
    use crate::simulation::{simulate, SimulationSettings, Trajectory};
    use crate::state::EcosystemState;
    use approx::assert_relative_eq;

    fn settings(years: f64) -> SimulationSettings {
        SimulationSettings {
            horizon_years: years,
            ..SimulationSettings::default()
        }
    }

    fn run(disturbance: bool, years: f64) -> Trajectory {
        simulate(
            &EcosystemParams::default().with_disturbance(disturbance),
            &EcosystemState::default(),
            &settings(years),
        )
        .expect("simulation")
    }

    #[test]
    fn summary_reports_stock_and_peak() {
        let trajectory = run(false, 60.0);
        let summary = ScenarioSummary::from_trajectory(&trajectory);
        let totals = trajectory.total_palms();

        assert!(!summary.disturbance);
        assert_eq!(summary.initial_total, 15.0e6);
        assert_eq!(summary.final_total, totals[totals.len() - 1]);
        assert_relative_eq!(
            summary.percent_remaining,
            summary.final_total / 15.0e6 * 100.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            summary.decline_rate,
            (15.0e6 - summary.final_total) / 60.0,
            max_relative = 1e-9
        );
        let max_rats = trajectory.rats().into_iter().fold(0.0, f64::max);
        assert_eq!(summary.peak_rats, max_rats);
        assert_eq!(summary.peak_rats_year, 1200.0 + summary.peak_rats_time);
    }

    #[test]
    fn crossing_requires_strictly_lower_total() {
        let trajectory = run(false, 2.0);
        let start = trajectory.initial_state().total_palms();
        assert_eq!(first_crossing_below(&trajectory, start + 1.0), Some(0.0));
        assert_eq!(first_crossing_below(&trajectory, 0.0), None);
    }

    #[test]
    fn comparison_rejects_mismatched_runs() {
        let a = run(false, 10.0);
        let b = run(true, 12.0);
        let err = ScenarioComparison::from_trajectories(a.clone(), b, &[1.0e6])
            .expect_err("grid mismatch");
        assert!(matches!(err, SimulationError::Mismatch(_)));
        assert!(format!("{err}").contains("time grids differ"));

        let swapped = ScenarioComparison::from_trajectories(run(true, 10.0), a.clone(), &[1.0e6]);
        assert!(matches!(swapped, Err(SimulationError::Mismatch(_))));

        let bad_threshold =
            ScenarioComparison::from_trajectories(a, run(true, 10.0), &[f64::NAN]);
        assert!(matches!(bad_threshold, Err(SimulationError::Mismatch(_))));
    }

    #[test]
    fn comparison_ignores_incoming_disturbance_flag() {
        let params = EcosystemParams::default().with_disturbance(false);
        let comparison =
            ScenarioComparison::run(&params, &EcosystemState::default(), &settings(20.0))
                .expect("comparison");
        assert!(!comparison.undisturbed.disturbance());
        assert!(comparison.disturbed.disturbance());
        assert_eq!(comparison.statistics.milestones.len(), 5);
    }

    #[test]
    fn statistics_follow_from_summaries() {
        let comparison = ScenarioComparison::run_with_thresholds(
            &EcosystemParams::default(),
            &EcosystemState::default(),
            &settings(150.0),
            &[1.4e7, 1.0],
        )
        .expect("comparison");
        let stats = &comparison.statistics;
        let (u, d) = (&stats.undisturbed, &stats.disturbed);

        assert_eq!(stats.additional_loss, u.final_total - d.final_total);
        assert_eq!(stats.peak_rat_difference, u.peak_rats - d.peak_rats);
        assert_relative_eq!(
            stats.percent_difference.expect("forest remains"),
            stats.additional_loss / u.final_total * 100.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            stats.acceleration_factor.expect("forest declines"),
            d.decline_rate / u.decline_rate,
            max_relative = 1e-12
        );

        let reached = &stats.milestones[0];
        let (du, dd) = (reached.undisturbed.expect("u"), reached.disturbed.expect("d"));
        assert_eq!(reached.difference, Some(dd - du));

        let unreached = &stats.milestones[1];
        assert_eq!(unreached.undisturbed, None);
        assert_eq!(unreached.disturbed, None);
        assert_eq!(unreached.difference, None);
    }
}
