use nalgebra::Vector4;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Number of state variables.
pub const STATE_DIMENSION: usize = 4;

/// Aggregate ecosystem state. No per-individual identity is tracked; the
/// mature cohort's age structure is collapsed into its mean.
///
/// The same shape carries rates of change (see [`crate::dynamics`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcosystemState {
    pub rats: f64,
    pub mature_palms: f64,
    pub young_palms: f64,
    /// Mean age in years of the mature cohort.
    pub mature_avg_age: f64,
}

impl Default for EcosystemState {
    /// A founding breeding pair of rodents in a 15-million-palm forest.
    fn default() -> Self {
        Self::new(2.0, 9_000_000.0, 6_000_000.0, 150.0)
    }
}

impl EcosystemState {
    pub fn new(rats: f64, mature_palms: f64, young_palms: f64, mature_avg_age: f64) -> Self {
        Self {
            rats,
            mature_palms,
            young_palms,
            mature_avg_age,
        }
    }

    /// Reads the first four components of an integrator buffer.
    ///
    /// # Panics
    /// If `x` holds fewer than [`STATE_DIMENSION`] values.
    pub fn from_slice(x: &[f64]) -> Self {
        Self::new(x[0], x[1], x[2], x[3])
    }

    pub fn to_array(&self) -> [f64; STATE_DIMENSION] {
        [
            self.rats,
            self.mature_palms,
            self.young_palms,
            self.mature_avg_age,
        ]
    }

    pub fn as_vector(&self) -> Vector4<f64> {
        Vector4::new(
            self.rats,
            self.mature_palms,
            self.young_palms,
            self.mature_avg_age,
        )
    }

    /// Component-wise projection onto the non-negative orthant.
    pub fn clamped(&self) -> Self {
        Self::new(
            self.rats.max(0.0),
            self.mature_palms.max(0.0),
            self.young_palms.max(0.0),
            self.mature_avg_age.max(0.0),
        )
    }

    pub fn total_palms(&self) -> f64 {
        self.mature_palms + self.young_palms
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// An initial state must be finite and non-negative.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let names = ["rats", "mature_palms", "young_palms", "mature_avg_age"];
        for (name, value) in names.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(SimulationError::initial_state(format!(
                    "{name} must be finite, got {value}"
                )));
            }
            if value < 0.0 {
                return Err(SimulationError::initial_state(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl From<[f64; STATE_DIMENSION]> for EcosystemState {
    fn from(values: [f64; STATE_DIMENSION]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl From<Vector4<f64>> for EcosystemState {
    fn from(v: Vector4<f64>) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}
