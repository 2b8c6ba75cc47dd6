//! The coupled rodent/palm vector field.

use serde::Serialize;

use crate::error::SimulationError;
use crate::forcing::{human_population, seasonal_carrying_capacity};
use crate::params::EcosystemParams;
use crate::rules::{
    clearing_pressure, mature_mortality, rodent_growth, rodent_harvest, seed_predation_pressure,
    surviving_reproduction, ClearingPressure,
};
use crate::state::{EcosystemState, STATE_DIMENSION};
use crate::traits::DynamicalSystem;

/// Below this many mature palms the mean age is frozen.
pub const AGE_TRACKING_MIN_MATURE: f64 = 100.0;

/// Every intermediate quantity of one right-hand-side evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateTerms {
    pub humans: f64,
    pub carrying_capacity: f64,
    pub mature_mortality: f64,
    pub rodent_harvest: f64,
    pub clearing: ClearingPressure,
    pub predation_pressure: f64,
    /// Young palms maturing per year.
    pub recruitment: f64,
    /// Seedlings per year after predation.
    pub reproduction: f64,
    /// d(state)/dt.
    pub derivative: EcosystemState,
}

/// The ecosystem right-hand side for one scenario.
///
/// Holds only immutable configuration: the parameter set and the total palm
/// stock the run started from, which normalizes clearing efficiency.
#[derive(Debug, Clone)]
pub struct EcosystemModel {
    params: EcosystemParams,
    reference_stock: f64,
}

impl EcosystemModel {
    /// Validates the configuration before any evaluation can happen.
    pub fn new(params: EcosystemParams, initial: &EcosystemState) -> Result<Self, SimulationError> {
        params.validate()?;
        initial.validate()?;
        Ok(Self {
            params,
            reference_stock: initial.total_palms(),
        })
    }

    pub fn params(&self) -> &EcosystemParams {
        &self.params
    }

    pub fn reference_stock(&self) -> f64 {
        self.reference_stock
    }

    /// Evaluates the vector field at (t, state), keeping the breakdown.
    pub fn terms(&self, t: f64, state: &EcosystemState) -> RateTerms {
        let p = &self.params;
        let EcosystemState {
            rats,
            mature_palms,
            young_palms,
            mature_avg_age,
        } = state.clamped();

        let humans = human_population(&p.humans, t);
        let mortality = mature_mortality(&p.palms, mature_avg_age);
        let capacity = seasonal_carrying_capacity(&p.rodents, t, mature_palms);
        let clearing = clearing_pressure(
            p,
            t,
            humans,
            mature_palms,
            young_palms,
            self.reference_stock,
        );

        let harvest = rodent_harvest(p, t, humans, rats);
        let d_rats = rodent_growth(&p.rodents, &p.humans, rats, capacity, harvest);

        let recruitment = young_palms / p.palms.maturation_time;
        let d_mature = recruitment - (mature_palms * mortality + clearing.mature);

        // Recruits enter at the maturation age and dilute the cohort mean.
        // Deaths are assumed to remove palms at the current mean age.
        let d_age = if mature_palms > AGE_TRACKING_MIN_MATURE {
            1.0 + (recruitment / mature_palms) * (p.palms.maturation_time - mature_avg_age)
        } else {
            0.0
        };

        let predation = seed_predation_pressure(&p.rodents, &p.palms, rats);
        let reproduction = surviving_reproduction(&p.palms, mature_palms, predation);
        let d_young = reproduction
            - (young_palms * p.palms.young_mortality + recruitment + clearing.young);

        RateTerms {
            humans,
            carrying_capacity: capacity,
            mature_mortality: mortality,
            rodent_harvest: harvest,
            clearing,
            predation_pressure: predation,
            recruitment,
            reproduction,
            derivative: EcosystemState::new(d_rats, d_mature, d_young, d_age),
        }
    }

    pub fn derivative(&self, t: f64, state: &EcosystemState) -> EcosystemState {
        self.terms(t, state).derivative
    }
}

impl DynamicalSystem<f64> for EcosystemModel {
    fn dimension(&self) -> usize {
        STATE_DIMENSION
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        let rates = self.derivative(t, &EcosystemState::from_slice(x));
        out[..STATE_DIMENSION].copy_from_slice(&rates.to_array());
    }
}
