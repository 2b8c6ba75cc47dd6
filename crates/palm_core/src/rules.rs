//! Piecewise mortality, growth and disturbance rules.
//!
//! Every rule is a pure function of its arguments. Regime switches (Allee
//! effect, senescence, end of lifespan, disturbance on/off) are explicit
//! branches evaluated on each call.

use serde::Serialize;

use crate::params::{EcosystemParams, HumanParams, PalmParams, RodentParams};

/// Mortality gain per century of mean age past senescence onset.
const SENESCENCE_SLOPE_PER_CENTURY: f64 = 2.0;

/// Fraction of the maximum lifespan after which the end-of-life penalty starts.
const LIFESPAN_PENALTY_ONSET: f64 = 0.8;

/// Penalty gain across the last fifth of the lifespan (6x at the maximum age).
const LIFESPAN_PENALTY_GAIN: f64 = 5.0;

/// Annual mortality of the mature cohort given its mean age.
///
/// Non-decreasing in `mean_age` and never above `palms.mortality_cap`.
pub fn mature_mortality(palms: &PalmParams, mean_age: f64) -> f64 {
    let mut mortality = palms.mature_mortality;

    if mean_age >= palms.senescence_age {
        let centuries_past = (mean_age - palms.senescence_age) / 100.0;
        mortality = palms.mature_mortality * (1.0 + SENESCENCE_SLOPE_PER_CENTURY * centuries_past);
    }

    let penalty_onset = palms.max_lifespan * LIFESPAN_PENALTY_ONSET;
    if mean_age > penalty_onset {
        let progress = (mean_age - penalty_onset) / (palms.max_lifespan * (1.0 - LIFESPAN_PENALTY_ONSET));
        mortality *= 1.0 + LIFESPAN_PENALTY_GAIN * progress;
    }

    mortality.min(palms.mortality_cap)
}

/// Rodents taken by humans per year.
///
/// Zero when disturbance is disabled. Otherwise grows with the human
/// population and ramps in linearly over the first years of settlement,
/// bounded by a fixed fraction of the standing rodent population.
pub fn rodent_harvest(params: &EcosystemParams, t: f64, humans: f64, rats: f64) -> f64 {
    if !params.disturbance {
        return 0.0;
    }
    let h = &params.humans;
    let ramp = if h.harvest_ramp_years > 0.0 {
        (t / h.harvest_ramp_years).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let pressure = humans * h.rodent_harvest_rate * ramp;
    pressure.min(rats * h.max_harvest_fraction)
}

/// Net rodent growth rate.
///
/// Above the minimum viable population: logistic growth against the
/// seasonal capacity, minus natural mortality and harvest. At or below it
/// the Allee regime applies: intrinsic growth is reduced and only a small
/// share of the harvest is taken.
pub fn rodent_growth(
    rodents: &RodentParams,
    humans: &HumanParams,
    rats: f64,
    capacity: f64,
    harvest: f64,
) -> f64 {
    let crowding = 1.0 - rats / capacity;
    let deaths = rats * rodents.natural_mortality;

    if rats > rodents.minimum_viable_population {
        rats * rodents.intrinsic_growth * crowding - deaths - harvest
    } else {
        rats * rodents.intrinsic_growth * rodents.allee_growth_factor * crowding
            - deaths
            - harvest * humans.small_population_harvest_factor
    }
}

/// Palms removed by humans per year, split by cohort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClearingPressure {
    /// Clearing effort before the per-cohort caps.
    pub rate: f64,
    pub mature: f64,
    pub young: f64,
}

impl ClearingPressure {
    pub fn total(&self) -> f64 {
        self.mature + self.young
    }
}

/// Human clearing for the current population and forest.
///
/// Effort grows with population and geometric intensification, and loses
/// efficiency both geometrically over time and with the fraction of the
/// original stock still standing. Refugia palms are never cleared.
/// `reference_stock` is the total palm count at the start of the run.
pub fn clearing_pressure(
    params: &EcosystemParams,
    t: f64,
    humans: f64,
    mature_palms: f64,
    young_palms: f64,
    reference_stock: f64,
) -> ClearingPressure {
    if !params.disturbance {
        return ClearingPressure::default();
    }
    let h = &params.humans;
    let accessible = 1.0 - params.palms.refugia_fraction;

    let remaining = (mature_palms + young_palms) / reference_stock.max(1.0);
    let efficiency = h.clearing_efficiency_decline.powf(t) * remaining;
    let rate = humans * h.clearing_per_person * h.agricultural_intensification.powf(t) * efficiency;

    ClearingPressure {
        rate,
        mature: (rate * h.mature_clearing_share)
            .min(mature_palms * accessible * h.mature_clearing_cap),
        young: (rate * h.young_clearing_share).min(young_palms * accessible * h.young_clearing_cap),
    }
}

/// Fraction of accessible seeds lost to rodents.
///
/// Saturates towards the predation efficiency as rodents increase, reaching
/// half of it at the half-saturation count.
pub fn seed_predation_pressure(rodents: &RodentParams, palms: &PalmParams, rats: f64) -> f64 {
    let density = rats / (rats + rodents.predation_half_saturation);
    palms.seed_predation_efficiency * density
}

/// Seedlings surviving predation, from refugia and accessible palms.
pub fn surviving_reproduction(palms: &PalmParams, mature_palms: f64, predation: f64) -> f64 {
    let refugia = mature_palms * palms.refugia_fraction;
    let accessible = mature_palms * (1.0 - palms.refugia_fraction);

    let refugia_seeds = refugia * palms.max_reproduction * palms.refugia_reproduction_bonus;
    let accessible_seeds = accessible * palms.max_reproduction;

    refugia_seeds * (1.0 - predation * palms.refugia_predation_share)
        + accessible_seeds * (1.0 - predation)
}
