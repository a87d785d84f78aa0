pub mod error;
pub mod poincare;
pub mod rossler;
pub mod solvers;
/// The `poincare_core` crate integrates the Rössler system and extracts its
/// Poincaré section on the upward y = 0 plane.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (vector fields), `Steppable` (Solvers).
/// - **Solvers**: Fixed-step integrators (RK4, forward Euler) behind one `Scheme` selector.
/// - **Rossler**: The vector field and its (a, b, c) parameters.
/// - **Poincare**: Run configuration, crossing detection, divergence guard and the section result.
pub mod traits;

pub use error::ConfigError;
pub use poincare::{
    compute_poincare_section, CrossingPoint, PoincareConfig, PoincareSection, RunStatus,
    SectionPlane,
};
pub use rossler::RosslerParams;
pub use solvers::Scheme;
