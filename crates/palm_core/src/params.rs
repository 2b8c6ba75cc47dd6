//! Biological and anthropogenic parameters.
//!
//! Defaults are the field-estimated values for *Rattus exulans*, a
//! *Jubaea*-like palm and the founding human population. Every struct is
//! `#[serde(default)]`, so a configuration file only needs the fields it
//! overrides.

use serde::{Deserialize, Serialize};

use crate::error::ParameterError;

/// Rodent demography and food limitation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RodentParams {
    /// Per-capita reproduction (litters x litter size x breeding females).
    pub intrinsic_growth: f64,
    pub natural_mortality: f64,
    /// Rodents per mature palm sustained on alternative foods.
    pub base_capacity_per_tree: f64,
    /// Rodents per mature palm at the height of the nut season.
    pub peak_capacity_per_tree: f64,
    /// Allee threshold and carrying-capacity floor.
    pub minimum_viable_population: f64,
    /// Multiplier on intrinsic growth below the Allee threshold.
    pub allee_growth_factor: f64,
    /// Rodent count at which seed predation reaches half its ceiling.
    pub predation_half_saturation: f64,
}

impl Default for RodentParams {
    fn default() -> Self {
        Self {
            intrinsic_growth: 2.5,
            natural_mortality: 1.0,
            base_capacity_per_tree: 0.5,
            peak_capacity_per_tree: 4.0,
            minimum_viable_population: 50.0,
            allee_growth_factor: 0.5,
            predation_half_saturation: 3000.0,
        }
    }
}

/// Palm life history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PalmParams {
    /// Years from germination to reproductive maturity. Also the age at
    /// which recruits join the mature cohort.
    pub maturation_time: f64,
    pub max_lifespan: f64,
    pub young_mortality: f64,
    pub mature_mortality: f64,
    pub senescence_age: f64,
    /// Seedlings per mature palm per year before predation.
    pub max_reproduction: f64,
    /// Ceiling on the fraction of seeds lost to rodents.
    pub seed_predation_efficiency: f64,
    /// Fraction of palms out of reach of clearing.
    pub refugia_fraction: f64,
    pub refugia_reproduction_bonus: f64,
    /// Share of the predation pressure felt by refugia seeds.
    pub refugia_predation_share: f64,
    /// Absolute ceiling on mature mortality.
    pub mortality_cap: f64,
}

impl Default for PalmParams {
    fn default() -> Self {
        Self {
            maturation_time: 70.0,
            max_lifespan: 500.0,
            young_mortality: 0.01,
            mature_mortality: 0.005,
            senescence_age: 400.0,
            max_reproduction: 0.025,
            seed_predation_efficiency: 0.95,
            refugia_fraction: 0.0001,
            refugia_reproduction_bonus: 1.1,
            refugia_predation_share: 0.4,
            mortality_cap: 0.1,
        }
    }
}

/// Human demography, forest clearing and rodent harvesting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanParams {
    pub initial_population: f64,
    pub carrying_capacity: f64,
    pub intrinsic_growth: f64,
    /// Palms cleared per person per year at full efficiency.
    pub clearing_per_person: f64,
    /// Geometric yearly growth of clearing effort.
    pub agricultural_intensification: f64,
    /// Geometric yearly decay of clearing efficiency.
    pub clearing_efficiency_decline: f64,
    /// Rodents taken per person per year once harvesting is established.
    pub rodent_harvest_rate: f64,
    /// Years over which harvesting ramps linearly up to full rate.
    pub harvest_ramp_years: f64,
    /// Ceiling on the fraction of rodents harvested.
    pub max_harvest_fraction: f64,
    /// Harvest multiplier applied below the rodent Allee threshold.
    pub small_population_harvest_factor: f64,
    pub mature_clearing_share: f64,
    pub young_clearing_share: f64,
    /// Ceiling on the fraction of accessible mature palms cleared per year.
    pub mature_clearing_cap: f64,
    /// Ceiling on the fraction of accessible young palms cleared per year.
    pub young_clearing_cap: f64,
}

impl Default for HumanParams {
    fn default() -> Self {
        Self {
            initial_population: 20.0,
            carrying_capacity: 3000.0,
            intrinsic_growth: 0.025,
            clearing_per_person: 5.0,
            agricultural_intensification: 1.003,
            clearing_efficiency_decline: 0.9995,
            rodent_harvest_rate: 0.25,
            harvest_ramp_years: 150.0,
            max_harvest_fraction: 0.4,
            small_population_harvest_factor: 0.1,
            mature_clearing_share: 0.75,
            young_clearing_share: 0.25,
            mature_clearing_cap: 0.18,
            young_clearing_cap: 0.12,
        }
    }
}

/// Everything one run needs besides its initial state and time grid.
///
/// Immutable for the duration of a run; the two comparison scenarios are two
/// values of this struct differing only in `disturbance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemParams {
    pub rodents: RodentParams,
    pub palms: PalmParams,
    pub humans: HumanParams,
    /// Human clearing and rodent harvesting enabled.
    pub disturbance: bool,
}

impl Default for EcosystemParams {
    fn default() -> Self {
        Self {
            rodents: RodentParams::default(),
            palms: PalmParams::default(),
            humans: HumanParams::default(),
            disturbance: true,
        }
    }
}

impl EcosystemParams {
    pub fn with_disturbance(mut self, disturbance: bool) -> Self {
        self.disturbance = disturbance;
        self
    }

    /// Checks every field; the first violation wins.
    pub fn validate(&self) -> Result<(), ParameterError> {
        self.rodents.validate()?;
        self.palms.validate()?;
        self.humans.validate()
    }
}

impl RodentParams {
    pub fn validate(&self) -> Result<(), ParameterError> {
        non_negative("rodent intrinsic growth", self.intrinsic_growth)?;
        non_negative("rodent natural mortality", self.natural_mortality)?;
        positive("base carrying capacity per tree", self.base_capacity_per_tree)?;
        positive("peak carrying capacity per tree", self.peak_capacity_per_tree)?;
        if self.peak_capacity_per_tree < self.base_capacity_per_tree {
            return Err(ParameterError::CapacityBoundsInverted {
                base: self.base_capacity_per_tree,
                peak: self.peak_capacity_per_tree,
            });
        }
        positive("minimum viable population", self.minimum_viable_population)?;
        fraction("Allee growth factor", self.allee_growth_factor)?;
        positive("predation half saturation", self.predation_half_saturation)
    }
}

impl PalmParams {
    pub fn validate(&self) -> Result<(), ParameterError> {
        positive("maturation time", self.maturation_time)?;
        positive("maximum lifespan", self.max_lifespan)?;
        non_negative("young palm mortality", self.young_mortality)?;
        non_negative("mature palm mortality", self.mature_mortality)?;
        non_negative("senescence age", self.senescence_age)?;
        non_negative("maximum reproduction", self.max_reproduction)?;
        fraction("seed predation efficiency", self.seed_predation_efficiency)?;
        fraction("refugia fraction", self.refugia_fraction)?;
        non_negative("refugia reproduction bonus", self.refugia_reproduction_bonus)?;
        fraction("refugia predation share", self.refugia_predation_share)?;
        non_negative("mortality cap", self.mortality_cap)
    }
}

impl HumanParams {
    pub fn validate(&self) -> Result<(), ParameterError> {
        positive("initial human population", self.initial_population)?;
        finite("human carrying capacity", self.carrying_capacity)?;
        if self.carrying_capacity <= self.initial_population {
            return Err(ParameterError::HumanCapacityTooSmall {
                initial: self.initial_population,
                capacity: self.carrying_capacity,
            });
        }
        positive("human intrinsic growth", self.intrinsic_growth)?;
        non_negative("clearing per person", self.clearing_per_person)?;
        positive("agricultural intensification", self.agricultural_intensification)?;
        positive("clearing efficiency decline", self.clearing_efficiency_decline)?;
        non_negative("rodent harvest rate", self.rodent_harvest_rate)?;
        non_negative("harvest ramp years", self.harvest_ramp_years)?;
        fraction("maximum harvest fraction", self.max_harvest_fraction)?;
        fraction("small population harvest factor", self.small_population_harvest_factor)?;
        fraction("mature clearing share", self.mature_clearing_share)?;
        fraction("young clearing share", self.young_clearing_share)?;
        fraction("mature clearing cap", self.mature_clearing_cap)?;
        fraction("young clearing cap", self.young_clearing_cap)
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, ParameterError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParameterError::NonFinite { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if finite(name, value)? < 0.0 {
        return Err(ParameterError::Negative { name, value });
    }
    Ok(())
}

fn positive(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if finite(name, value)? <= 0.0 {
        return Err(ParameterError::NonPositive { name, value });
    }
    Ok(())
}

fn fraction(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if !(0.0..=1.0).contains(&finite(name, value)?) {
        return Err(ParameterError::NotAFraction { name, value });
    }
    Ok(())
}
