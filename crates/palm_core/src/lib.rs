//! The `palm_core` crate is the engine behind the palm forest collapse model:
//! a four-variable ODE coupling an invasive rodent population, a palm forest
//! split into mature and young cohorts, and an optional human population that
//! clears forest and harvests rodents.
//!
//! Key components:
//! - **Traits**: `Scalar`, `DynamicalSystem` (non-autonomous vector fields), `Steppable` and `EmbeddedStepper` (solvers).
//! - **Solvers**: fixed-step RK4 and the embedded Tsit5 pair.
//! - **Model**: parameter groups, forcing functions, piecewise ecological rules and the coupled `EcosystemModel`.
//! - **Simulation**: grid-aligned integration into a `Trajectory`.
//! - **Comparison**: rodent-only versus rodent-and-human runs, milestones and seasonal diagnostics.
//!
//! The crate performs no I/O; every output type is `serde::Serialize`.
pub mod comparison;
pub mod dynamics;
pub mod error;
pub mod forcing;
pub mod params;
pub mod rules;
pub mod seasonal;
pub mod simulation;
pub mod solvers;
pub mod state;
pub mod traits;

pub use comparison::{ComparisonStatistics, ScenarioComparison, ScenarioSummary};
pub use dynamics::EcosystemModel;
pub use error::{IntegratorFailure, ParameterError, SimulationError};
pub use params::{EcosystemParams, HumanParams, PalmParams, RodentParams};
pub use simulation::{simulate, IntegratorKind, SimulationSettings, Trajectory};
pub use state::EcosystemState;
