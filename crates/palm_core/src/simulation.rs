//! Simulation driver: time grid, integrator, trajectory.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dynamics::EcosystemModel;
use crate::error::{IntegratorFailure, SimulationError};
use crate::forcing::{human_population, seasonal_carrying_capacity};
use crate::params::EcosystemParams;
use crate::solvers::{Tsit5, RK4};
use crate::state::{EcosystemState, STATE_DIMENSION};
use crate::traits::{DynamicalSystem, EmbeddedStepper, Steppable};

/// The seasonal cycle needs at least this many samples per year.
pub const MIN_SAMPLES_PER_YEAR: usize = 8;

/// Largest output grid a run may allocate.
pub const MAX_SAMPLES: usize = 50_000_000;

/// Default relative and absolute tolerance of the adaptive integrator.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Adaptive steps smaller than this (in years) are treated as a failure.
const MIN_STEP: f64 = 1e-10;
const SAFETY: f64 = 0.9;
const MIN_SHRINK: f64 = 0.2;
const MAX_GROWTH: f64 = 5.0;

/// Which integrator advances the state between output samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum IntegratorKind {
    /// Adaptive Tsitouras 5(4) with per-component mixed tolerances.
    Tsit5 { rtol: f64, atol: f64 },
    /// Classical RK4 with a fixed number of substeps per grid interval.
    Rk4 { substeps: usize },
}

impl Default for IntegratorKind {
    fn default() -> Self {
        IntegratorKind::Tsit5 {
            rtol: DEFAULT_TOLERANCE,
            atol: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub horizon_years: f64,
    pub samples_per_year: usize,
    /// Calendar year of t = 0, used only for dating outputs.
    pub start_year: f64,
    pub integrator: IntegratorKind,
    /// Upper bound on integrator step attempts across the whole run.
    pub max_steps: usize,
}

impl Default for SimulationSettings {
    /// 1200 CE landfall to 1722 CE European contact, eight samples a year.
    fn default() -> Self {
        Self {
            horizon_years: 522.0,
            samples_per_year: MIN_SAMPLES_PER_YEAR,
            start_year: 1200.0,
            integrator: IntegratorKind::default(),
            max_steps: 2_000_000,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.horizon_years.is_finite() || self.horizon_years <= 0.0 {
            return Err(SimulationError::settings(format!(
                "horizon must be a positive number of years, got {}",
                self.horizon_years
            )));
        }
        if self.samples_per_year < MIN_SAMPLES_PER_YEAR {
            return Err(SimulationError::settings(format!(
                "at least {MIN_SAMPLES_PER_YEAR} samples per year are needed to resolve the season, got {}",
                self.samples_per_year
            )));
        }
        let requested = (self.horizon_years * self.samples_per_year as f64).round();
        if requested > MAX_SAMPLES as f64 {
            return Err(SimulationError::settings(format!(
                "grid of {requested:e} samples exceeds the maximum of {MAX_SAMPLES}"
            )));
        }
        if !self.start_year.is_finite() {
            return Err(SimulationError::settings("start year must be finite"));
        }
        if self.max_steps == 0 {
            return Err(SimulationError::settings("step budget must be at least one"));
        }
        match self.integrator {
            IntegratorKind::Tsit5 { rtol, atol } => {
                if !(rtol.is_finite() && atol.is_finite() && rtol >= 0.0 && atol >= 0.0)
                    || rtol + atol <= 0.0
                {
                    return Err(SimulationError::settings(format!(
                        "tolerances must be non-negative and not both zero, got rtol={rtol}, atol={atol}"
                    )));
                }
            }
            IntegratorKind::Rk4 { substeps } => {
                if substeps == 0 {
                    return Err(SimulationError::settings("RK4 needs at least one substep"));
                }
            }
        }
        Ok(())
    }

    pub fn sample_count(&self) -> usize {
        ((self.horizon_years * self.samples_per_year as f64).round() as usize).max(2)
    }

    /// Uniform grid from 0 to the horizon inclusive.
    pub fn time_grid(&self) -> Vec<f64> {
        let n = self.sample_count();
        let last = (n - 1) as f64;
        (0..n)
            .map(|i| self.horizon_years * i as f64 / last)
            .collect()
    }
}

/// Integrator effort for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// The immutable result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    params: EcosystemParams,
    start_year: f64,
    samples_per_year: usize,
    times: Vec<f64>,
    states: Vec<EcosystemState>,
    humans: Vec<f64>,
    stats: IntegrationStats,
}

impl Trajectory {
    pub fn params(&self) -> &EcosystemParams {
        &self.params
    }

    pub fn disturbance(&self) -> bool {
        self.params.disturbance
    }

    pub fn start_year(&self) -> f64 {
        self.start_year
    }

    pub fn samples_per_year(&self) -> usize {
        self.samples_per_year
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[EcosystemState] {
        &self.states
    }

    /// Human population at each sample.
    pub fn humans(&self) -> &[f64] {
        &self.humans
    }

    pub fn stats(&self) -> IntegrationStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn horizon(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn initial_state(&self) -> EcosystemState {
        self.states.first().copied().unwrap_or_default()
    }

    pub fn final_state(&self) -> EcosystemState {
        self.states.last().copied().unwrap_or_default()
    }

    pub fn calendar_years(&self) -> Vec<f64> {
        self.times.iter().map(|t| self.start_year + t).collect()
    }

    pub fn rats(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.rats).collect()
    }

    pub fn mature_palms(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.mature_palms).collect()
    }

    pub fn young_palms(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.young_palms).collect()
    }

    pub fn mature_avg_age(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.mature_avg_age).collect()
    }

    pub fn total_palms(&self) -> Vec<f64> {
        self.states.iter().map(EcosystemState::total_palms).collect()
    }

    /// Seasonal rodent capacity implied by each sample's mature palms.
    pub fn carrying_capacity(&self) -> Vec<f64> {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(&t, s)| seasonal_carrying_capacity(&self.params.rodents, t, s.mature_palms))
            .collect()
    }

    /// Rodents relative to their current seasonal capacity.
    pub fn capacity_ratio(&self) -> Vec<f64> {
        self.rats()
            .iter()
            .zip(self.carrying_capacity())
            .map(|(r, c)| r / c)
            .collect()
    }

    /// One row per sample: t, rats, mature, young, mean age, humans.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.len(), 6, |row, col| {
            let s = &self.states[row];
            match col {
                0 => self.times[row],
                1 => s.rats,
                2 => s.mature_palms,
                3 => s.young_palms,
                4 => s.mature_avg_age,
                _ => self.humans[row],
            }
        })
    }
}

/// Integrates one scenario over the settings' grid.
///
/// Parameters, initial state and settings are validated first; nothing is
/// integrated if any of them is rejected. Accepted steps are projected onto
/// the non-negative orthant, so every recorded sample is non-negative.
pub fn simulate(
    params: &EcosystemParams,
    initial: &EcosystemState,
    settings: &SimulationSettings,
) -> Result<Trajectory, SimulationError> {
    settings.validate()?;
    let model = EcosystemModel::new(*params, initial)?;
    let grid = settings.time_grid();

    debug!(
        "Simulating {} years on {} samples (disturbance={}, integrator={:?})",
        settings.horizon_years,
        grid.len(),
        params.disturbance,
        settings.integrator
    );

    let (states, stats) = integrate(&model, initial, &grid, settings)?;

    let humans = grid
        .iter()
        .map(|&t| human_population(&params.humans, t))
        .collect();

    debug!(
        "Finished: {} accepted, {} rejected, {} evaluations",
        stats.accepted_steps, stats.rejected_steps, stats.evaluations
    );

    Ok(Trajectory {
        params: *params,
        start_year: settings.start_year,
        samples_per_year: settings.samples_per_year,
        times: grid,
        states,
        humans,
        stats,
    })
}

/// Advances `system` across `grid`, recording the state at every grid point.
/// Any integrator failure aborts the whole run.
fn integrate<S: DynamicalSystem<f64>>(
    system: &S,
    initial: &EcosystemState,
    grid: &[f64],
    settings: &SimulationSettings,
) -> Result<(Vec<EcosystemState>, IntegrationStats), SimulationError> {
    let mut method = Method::new(settings.integrator);
    let mut progress = Progress::new(settings.max_steps);
    let mut states = Vec::with_capacity(grid.len());
    let mut state = initial.to_array();
    states.push(*initial);

    for window in grid.windows(2) {
        if let Err(reason) = method.advance(system, &mut progress, window[0], window[1], &mut state)
        {
            warn!("Integration aborted near t = {:.3}: {}", progress.t, reason);
            return Err(SimulationError::Integrator {
                time: progress.t,
                reason,
            });
        }
        states.push(EcosystemState::from(state));
    }
    Ok((states, progress.stats))
}

/// Step budget and position shared by both integrators.
struct Progress {
    max_steps: usize,
    t: f64,
    stats: IntegrationStats,
}

impl Progress {
    fn new(max_steps: usize) -> Self {
        Self {
            max_steps,
            t: 0.0,
            stats: IntegrationStats::default(),
        }
    }

    fn check_budget(&self) -> Result<(), IntegratorFailure> {
        if self.stats.accepted_steps + self.stats.rejected_steps >= self.max_steps {
            return Err(IntegratorFailure::StepBudgetExhausted(self.max_steps));
        }
        Ok(())
    }
}

enum Method {
    Adaptive(Adaptive),
    Fixed { solver: RK4<f64>, substeps: usize },
}

impl Method {
    fn new(kind: IntegratorKind) -> Self {
        match kind {
            IntegratorKind::Tsit5 { rtol, atol } => Method::Adaptive(Adaptive {
                solver: Tsit5::new(STATE_DIMENSION),
                rtol,
                atol,
                h: None,
            }),
            IntegratorKind::Rk4 { substeps } => Method::Fixed {
                solver: RK4::new(STATE_DIMENSION),
                substeps,
            },
        }
    }

    /// Advances `state` from t0 to exactly t1.
    fn advance<S: DynamicalSystem<f64>>(
        &mut self,
        system: &S,
        progress: &mut Progress,
        t0: f64,
        t1: f64,
        state: &mut [f64],
    ) -> Result<(), IntegratorFailure> {
        progress.t = t0;
        match self {
            Method::Adaptive(adaptive) => adaptive.advance(system, progress, t1, state),
            Method::Fixed { solver, substeps } => {
                let dt = (t1 - t0) / *substeps as f64;
                for i in 0..*substeps {
                    progress.check_budget()?;
                    let mut t = t0 + dt * i as f64;
                    solver.step(system, &mut t, state, dt);
                    progress.stats.accepted_steps += 1;
                    progress.stats.evaluations += 4;
                    if !state.iter().all(|v| v.is_finite()) {
                        return Err(IntegratorFailure::NonFinite);
                    }
                    project(state);
                    progress.t = t;
                }
                progress.t = t1;
                Ok(())
            }
        }
    }
}

/// Tsit5 with step-size control. The proposed step carries over between
/// grid intervals.
struct Adaptive {
    solver: Tsit5<f64>,
    rtol: f64,
    atol: f64,
    h: Option<f64>,
}

impl Adaptive {
    fn advance<S: DynamicalSystem<f64>>(
        &mut self,
        system: &S,
        progress: &mut Progress,
        t1: f64,
        state: &mut [f64],
    ) -> Result<(), IntegratorFailure> {
        let exponent = -1.0 / (self.solver.error_order() as f64 + 1.0);
        let mut proposal = [0.0; STATE_DIMENSION];
        let mut error = [0.0; STATE_DIMENSION];
        let mut t = progress.t;
        let mut h = self.h.unwrap_or(t1 - t);

        while t < t1 {
            progress.t = t;
            progress.check_budget()?;

            let remaining = t1 - t;
            let last = h >= remaining;
            let step = if last { remaining } else { h };

            self.solver
                .attempt(system, t, state, step, &mut proposal, &mut error);
            progress.stats.evaluations += 7;

            let norm = error_norm(state, &proposal, &error, self.rtol, self.atol);
            let finite = norm.is_finite() && proposal.iter().all(|v| v.is_finite());

            if finite && norm <= 1.0 {
                t = if last { t1 } else { t + step };
                state.copy_from_slice(&proposal);
                project(state);
                progress.stats.accepted_steps += 1;

                let factor = if norm > 0.0 {
                    (SAFETY * norm.powf(exponent)).clamp(MIN_SHRINK, MAX_GROWTH)
                } else {
                    MAX_GROWTH
                };
                // A step clipped to the grid says nothing about the natural step size.
                if !last || factor < 1.0 {
                    h = step * factor;
                }
            } else {
                progress.stats.rejected_steps += 1;
                let factor = if finite {
                    (SAFETY * norm.powf(exponent)).max(MIN_SHRINK)
                } else {
                    MIN_SHRINK
                };
                h = step * factor;
                if h < MIN_STEP {
                    return Err(if finite {
                        IntegratorFailure::StepSizeUnderflow {
                            step: h,
                            minimum: MIN_STEP,
                        }
                    } else {
                        IntegratorFailure::NonFinite
                    });
                }
            }
        }

        self.h = Some(h);
        progress.t = t1;
        Ok(())
    }
}

/// Root-mean-square of the error scaled by mixed tolerances.
fn error_norm(state: &[f64], proposal: &[f64], error: &[f64], rtol: f64, atol: f64) -> f64 {
    let sum: f64 = state
        .iter()
        .zip(proposal)
        .zip(error)
        .map(|((y0, y1), e)| {
            let scale = atol + rtol * y0.abs().max(y1.abs());
            (e / scale).powi(2)
        })
        .sum();
    (sum / state.len() as f64).sqrt()
}

fn project(state: &mut [f64]) {
    for v in state.iter_mut() {
        *v = v.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        integrate, simulate, IntegratorKind, SimulationSettings, MAX_SAMPLES, MIN_SAMPLES_PER_YEAR,
    };
    use crate::traits::DynamicalSystem;
    use crate::error::{IntegratorFailure, SimulationError};
    use crate::forcing::human_population;
    use crate::params::EcosystemParams;
    use crate::state::EcosystemState;
    use approx::assert_relative_eq;

    fn short_settings(years: f64) -> SimulationSettings {
        SimulationSettings {
            horizon_years: years,
            ..SimulationSettings::default()
        }
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T, SimulationError>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn default_grid_resolves_the_season() {
        let settings = SimulationSettings::default();
        let grid = settings.time_grid();
        assert_eq!(grid.len(), 522 * 8);
        assert_eq!(grid[0], 0.0);
        assert_relative_eq!(grid[grid.len() - 1], 522.0, epsilon = 1e-9);
        let spacing = grid[1] - grid[0];
        assert!(spacing <= 1.0 / MIN_SAMPLES_PER_YEAR as f64 + 1e-4);
    }

    #[test]
    fn rejects_bad_settings_before_integrating() {
        let params = EcosystemParams::default();
        let initial = EcosystemState::default();

        let coarse = SimulationSettings {
            samples_per_year: 4,
            ..SimulationSettings::default()
        };
        assert_err_contains(simulate(&params, &initial, &coarse), "samples per year");
        assert_err_contains(
            simulate(&params, &initial, &short_settings(0.0)),
            "horizon must be a positive",
        );
        let no_tolerance = SimulationSettings {
            integrator: IntegratorKind::Tsit5 {
                rtol: 0.0,
                atol: 0.0,
            },
            ..SimulationSettings::default()
        };
        assert_err_contains(simulate(&params, &initial, &no_tolerance), "tolerances");
        let no_substeps = SimulationSettings {
            integrator: IntegratorKind::Rk4 { substeps: 0 },
            ..SimulationSettings::default()
        };
        assert_err_contains(simulate(&params, &initial, &no_substeps), "substep");
    }

    #[test]
    fn oversized_grid_is_rejected_before_allocating() {
        let params = EcosystemParams::default();
        let initial = EcosystemState::default();

        assert_err_contains(
            simulate(&params, &initial, &short_settings(1.0e18)),
            "exceeds the maximum",
        );
        let dense = SimulationSettings {
            samples_per_year: usize::MAX,
            ..SimulationSettings::default()
        };
        assert_err_contains(simulate(&params, &initial, &dense), "exceeds the maximum");

        let largest = SimulationSettings {
            horizon_years: (MAX_SAMPLES / MIN_SAMPLES_PER_YEAR) as f64,
            ..SimulationSettings::default()
        };
        assert!(largest.validate().is_ok());
        let one_more = SimulationSettings {
            horizon_years: largest.horizon_years + 1.0,
            ..largest
        };
        assert!(one_more.validate().is_err());
    }

    /// Right-hand side that poisons every evaluation.
    struct Poisoned;

    impl DynamicalSystem<f64> for Poisoned {
        fn dimension(&self) -> usize {
            4
        }

        fn apply(&self, _t: f64, _x: &[f64], out: &mut [f64]) {
            out.fill(f64::NAN);
        }
    }

    /// Linear decay far too stiff for any representable explicit step.
    struct Stiff;

    impl DynamicalSystem<f64> for Stiff {
        fn dimension(&self) -> usize {
            4
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            for (o, v) in out.iter_mut().zip(x) {
                *o = -1.0e12 * v;
            }
        }
    }

    #[test]
    fn non_finite_rates_abort_the_run() {
        let grid = [0.0, 0.125, 0.25];
        for integrator in [IntegratorKind::default(), IntegratorKind::Rk4 { substeps: 2 }] {
            let settings = SimulationSettings {
                integrator,
                ..SimulationSettings::default()
            };
            match integrate(&Poisoned, &EcosystemState::default(), &grid, &settings) {
                Err(SimulationError::Integrator { time, reason }) => {
                    assert_eq!(reason, IntegratorFailure::NonFinite, "{integrator:?}");
                    assert!(time < 0.125);
                }
                other => panic!("expected non-finite failure for {integrator:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn step_size_underflow_aborts_the_run() {
        let grid = [0.0, 0.125];
        let result = integrate(
            &Stiff,
            &EcosystemState::default(),
            &grid,
            &SimulationSettings::default(),
        );
        match result {
            Err(SimulationError::Integrator {
                reason: IntegratorFailure::StepSizeUnderflow { step, minimum },
                ..
            }) => assert!(step < minimum),
            other => panic!("expected step size underflow, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_parameters_and_initial_state() {
        let mut params = EcosystemParams::default();
        params.rodents.base_capacity_per_tree = 0.0;
        let result = simulate(&params, &EcosystemState::default(), &short_settings(10.0));
        assert!(matches!(result, Err(SimulationError::Parameters(_))));

        assert_err_contains(
            simulate(
                &EcosystemParams::default(),
                &EcosystemState::new(2.0, 9.0e6, f64::INFINITY, 150.0),
                &short_settings(10.0),
            ),
            "young_palms must be finite",
        );
    }

    #[test]
    fn trajectory_starts_at_initial_state_and_records_humans() {
        let params = EcosystemParams::default();
        let initial = EcosystemState::default();
        let trajectory = simulate(&params, &initial, &short_settings(30.0)).expect("run");
        assert_eq!(trajectory.len(), 240);
        assert_eq!(trajectory.initial_state(), initial);
        assert_eq!(trajectory.states().len(), trajectory.times().len());
        for (&t, &h) in trajectory.times().iter().zip(trajectory.humans()) {
            assert_eq!(h, human_population(&params.humans, t));
        }
        assert_eq!(trajectory.calendar_years()[0], 1200.0);
        assert!(trajectory.stats().accepted_steps >= trajectory.len() - 1);
    }

    #[test]
    fn rodents_establish_within_first_decades() {
        let trajectory = simulate(
            &EcosystemParams::default(),
            &EcosystemState::default(),
            &short_settings(40.0),
        )
        .expect("run");
        let last = trajectory.final_state();
        assert!(last.rats > 1.0e6, "rodents failed to establish: {}", last.rats);
        // Mean age still rises while the founding cohort dominates.
        assert!(last.mature_avg_age > 150.0);
    }

    #[test]
    fn every_sample_is_non_negative() {
        for disturbance in [false, true] {
            let params = EcosystemParams::default().with_disturbance(disturbance);
            let trajectory =
                simulate(&params, &EcosystemState::default(), &SimulationSettings::default())
                    .expect("full run");
            for state in trajectory.states() {
                assert!(state.to_array().iter().all(|v| *v >= 0.0), "{state:?}");
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_trajectories() {
        let params = EcosystemParams::default();
        let initial = EcosystemState::default();
        let settings = short_settings(120.0);
        let first = simulate(&params, &initial, &settings).expect("first");
        let second = simulate(&params, &initial, &settings).expect("second");
        assert_eq!(first.times(), second.times());
        assert_eq!(first.states(), second.states());
        assert_eq!(first.stats(), second.stats());
    }

    #[test]
    fn fixed_step_rk4_agrees_with_adaptive_run() {
        let params = EcosystemParams::default();
        let initial = EcosystemState::default();
        let adaptive = simulate(&params, &initial, &short_settings(200.0)).expect("tsit5");
        let fixed = simulate(
            &params,
            &initial,
            &SimulationSettings {
                integrator: IntegratorKind::Rk4 { substeps: 2 },
                ..short_settings(200.0)
            },
        )
        .expect("rk4");
        assert_relative_eq!(
            fixed.final_state().total_palms(),
            adaptive.final_state().total_palms(),
            max_relative = 1e-3
        );
        assert_relative_eq!(
            fixed.final_state().rats,
            adaptive.final_state().rats,
            max_relative = 1e-2
        );
    }

    #[test]
    fn exhausted_step_budget_is_fatal() {
        let settings = SimulationSettings {
            max_steps: 10,
            ..short_settings(50.0)
        };
        let result = simulate(&EcosystemParams::default(), &EcosystemState::default(), &settings);
        match result {
            Err(SimulationError::Integrator { reason, .. }) => {
                assert_eq!(reason, IntegratorFailure::StepBudgetExhausted(10));
            }
            other => panic!("expected integrator failure, got {other:?}"),
        }
    }

    #[test]
    fn matrix_export_has_one_row_per_sample() {
        let trajectory = simulate(
            &EcosystemParams::default(),
            &EcosystemState::default(),
            &short_settings(5.0),
        )
        .expect("run");
        let m = trajectory.to_matrix();
        assert_eq!(m.nrows(), trajectory.len());
        assert_eq!(m.ncols(), 6);
        let last = trajectory.len() - 1;
        assert_eq!(m[(last, 0)], trajectory.times()[last]);
        assert_eq!(m[(last, 2)], trajectory.final_state().mature_palms);
        assert_eq!(m[(last, 5)], trajectory.humans()[last]);
    }

    #[test]
    fn capacity_series_tracks_season() {
        let trajectory = simulate(
            &EcosystemParams::default(),
            &EcosystemState::default(),
            &short_settings(3.0),
        )
        .expect("run");
        let capacity = trajectory.carrying_capacity();
        let ratio = trajectory.capacity_ratio();
        assert_eq!(capacity.len(), trajectory.len());
        assert_relative_eq!(capacity[0], 4.5e6, max_relative = 1e-12);
        assert!(capacity.iter().all(|c| *c >= 50.0));
        assert!(ratio.iter().all(|r| r.is_finite() && *r >= 0.0));
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = SimulationSettings {
            integrator: IntegratorKind::Rk4 { substeps: 3 },
            ..SimulationSettings::default()
        };
        let json = serde_json::to_string(&settings).expect("serialize");
        assert!(json.contains(r#""method":"rk4""#));
        let back: SimulationSettings = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, settings);
    }
}
