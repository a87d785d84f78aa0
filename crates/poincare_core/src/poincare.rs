//! Poincaré section extraction on an upward coordinate plane.
//!
//! A run integrates the Rössler field from a fixed starting point with a
//! fixed-step scheme and records, in temporal order, every upward crossing of
//! the section plane (y = 0 by default, reported as (x, z)). Crossing points
//! are linearly interpolated between the pre-step and post-step states.

use crate::error::ConfigError;
use crate::rossler::{Rossler, RosslerParams};
use crate::solvers::Scheme;
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_STEP_SIZE: f64 = 0.01;
pub const DEFAULT_DIVERGENCE_THRESHOLD: f64 = 1e10;
pub const DEFAULT_RK4_ITERATIONS: usize = 200_000;
pub const DEFAULT_EULER_ITERATIONS: usize = 12_000;
pub const DEFAULT_INITIAL_STATE: [f64; 3] = [1.0, 1.0, 1.0];

/// Coordinate plane the trajectory is sectioned on, always crossed upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionPlane {
    /// y = 0, points reported as (x, z).
    #[default]
    Y,
    /// z = 0, points reported as (x, y).
    Z,
}

impl SectionPlane {
    fn axis(self) -> usize {
        match self {
            SectionPlane::Y => 1,
            SectionPlane::Z => 2,
        }
    }

    /// The two in-plane coordinates reported for `point`.
    pub fn project(self, point: &CrossingPoint) -> (f64, f64) {
        match self {
            SectionPlane::Y => (point.x, point.z),
            SectionPlane::Z => (point.x, point.y),
        }
    }
}

/// Settings for one section run.
///
/// `max_iterations` counts the initial state, so a run performs
/// `max_iterations - 1` integration steps. A `divergence_threshold` of `None`
/// disables the divergence guard entirely.
///
/// Deserializing a partial config fills the missing fields from the preset
/// of the scheme it names (see [`PoincareConfig::for_scheme`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartialPoincareConfig")]
pub struct PoincareConfig {
    pub scheme: Scheme,
    pub max_iterations: usize,
    pub step_size: f64,
    pub divergence_threshold: Option<f64>,
    pub initial_state: [f64; 3],
    pub plane: SectionPlane,
}

impl Default for PoincareConfig {
    fn default() -> Self {
        Self {
            scheme: Scheme::Rk4,
            max_iterations: DEFAULT_RK4_ITERATIONS,
            step_size: DEFAULT_STEP_SIZE,
            divergence_threshold: Some(DEFAULT_DIVERGENCE_THRESHOLD),
            initial_state: DEFAULT_INITIAL_STATE,
            plane: SectionPlane::Y,
        }
    }
}

/// Wire form of [`PoincareConfig`]; every field is optional.
///
/// `divergence_threshold` distinguishes an absent key (scheme default) from an
/// explicit `null` (guard disabled).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialPoincareConfig {
    scheme: Option<Scheme>,
    max_iterations: Option<usize>,
    step_size: Option<f64>,
    #[serde(deserialize_with = "present")]
    divergence_threshold: Option<Option<f64>>,
    initial_state: Option<[f64; 3]>,
    plane: Option<SectionPlane>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<PartialPoincareConfig> for PoincareConfig {
    fn from(partial: PartialPoincareConfig) -> Self {
        let base = PoincareConfig::for_scheme(partial.scheme.unwrap_or_default());
        Self {
            scheme: base.scheme,
            max_iterations: partial.max_iterations.unwrap_or(base.max_iterations),
            step_size: partial.step_size.unwrap_or(base.step_size),
            divergence_threshold: partial
                .divergence_threshold
                .unwrap_or(base.divergence_threshold),
            initial_state: partial.initial_state.unwrap_or(base.initial_state),
            plane: partial.plane.unwrap_or(base.plane),
        }
    }
}

impl PoincareConfig {
    /// Forward Euler with a short budget and no divergence guard.
    pub fn preview() -> Self {
        Self {
            scheme: Scheme::Euler,
            max_iterations: DEFAULT_EULER_ITERATIONS,
            divergence_threshold: None,
            ..Self::default()
        }
    }

    /// The preset matching `scheme`: production for RK4, preview for Euler.
    pub fn for_scheme(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Rk4 => Self::default(),
            Scheme::Euler => Self::preview(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.step_size > 0.0 && self.step_size.is_finite()) {
            return Err(ConfigError::NonPositiveStepSize(self.step_size));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterationBudget);
        }
        if let Some(threshold) = self.divergence_threshold {
            // NaN fails the comparison; +inf is allowed and only trips on NaN states.
            if !(threshold > 0.0) {
                return Err(ConfigError::InvalidDivergenceThreshold(threshold));
            }
        }
        if self.initial_state.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFiniteInitialState(self.initial_state));
        }
        Ok(())
    }
}

/// An interpolated upward crossing of the section plane.
///
/// The coordinate normal to the plane is zero up to rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossingPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Zero-based index of the integration step that crossed the plane.
    pub step: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    Diverged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoincareSection {
    pub points: Vec<CrossingPoint>,
    pub status: RunStatus,
    /// Integration steps completed (and accepted) before the loop ended.
    pub steps_taken: usize,
    pub plane: SectionPlane,
}

impl PoincareSection {
    pub fn is_diverged(&self) -> bool {
        self.status == RunStatus::Diverged
    }

    /// Interleaved in-plane coordinates, `[x0, z0, x1, z1, ...]` on y = 0.
    pub fn flattened(&self) -> Vec<f64> {
        let mut flat = Vec::with_capacity(self.points.len() * 2);
        for point in &self.points {
            let (u, v) = self.plane.project(point);
            flat.push(u);
            flat.push(v);
        }
        flat
    }
}

/// Computes the Poincaré section of the Rössler system for `params`.
pub fn compute_poincare_section(
    params: RosslerParams,
    config: &PoincareConfig,
) -> Result<PoincareSection, ConfigError> {
    tracing::debug!(
        a = params.a,
        b = params.b,
        c = params.c,
        scheme = %config.scheme,
        max_iterations = config.max_iterations,
        step_size = config.step_size,
        plane = ?config.plane,
        "computing Poincaré section"
    );
    extract_section(&Rossler::new(params), config)
}

/// Runs the section loop for an arbitrary three-dimensional vector field.
pub fn extract_section<S>(
    system: &S,
    config: &PoincareConfig,
) -> Result<PoincareSection, ConfigError>
where
    S: DynamicalSystem<f64>,
{
    config.validate()?;
    let dim = system.dimension();
    if dim != 3 {
        return Err(ConfigError::DimensionMismatch(dim));
    }

    let dt = config.step_size;
    let mut stepper = config.scheme.build(dim);
    let mut state = config.initial_state;
    let mut t = 0.0;
    let mut points = Vec::new();
    let mut status = RunStatus::Success;
    let mut steps_taken = 0usize;

    for step in 0..config.max_iterations - 1 {
        let mut next = state;
        let mut t_next = t;
        stepper.step(system, &mut t_next, &mut next, dt);

        if let Some(threshold) = config.divergence_threshold {
            if has_diverged(&next, threshold) {
                tracing::warn!(step, state = ?next, "trajectory diverged; truncating section");
                status = RunStatus::Diverged;
                break;
            }
        }

        if let Some([x, y, z]) = plane_crossing(config.plane, &state, &next) {
            points.push(CrossingPoint { x, y, z, step });
        }

        state = next;
        t = t_next;
        steps_taken += 1;
    }

    tracing::debug!(
        points = points.len(),
        steps_taken,
        status = ?status,
        "Poincaré section complete"
    );

    Ok(PoincareSection {
        points,
        status,
        steps_taken,
        plane: config.plane,
    })
}

/// Interpolated (x, z) where the segment `prev -> next` crosses y = 0 upward.
pub fn upward_crossing(prev: &[f64; 3], next: &[f64; 3]) -> Option<(f64, f64)> {
    plane_crossing(SectionPlane::Y, prev, next).map(|p| (p[0], p[2]))
}

/// Interpolated state where `prev -> next` crosses `plane` upward.
pub fn plane_crossing(
    plane: SectionPlane,
    prev: &[f64; 3],
    next: &[f64; 3],
) -> Option<[f64; 3]> {
    let axis = plane.axis();
    let (w, w_next) = (prev[axis], next[axis]);
    if !(w < 0.0 && w_next >= 0.0) {
        return None;
    }
    // w < 0 <= w_next, so the denominator is strictly positive.
    let alpha = -w / (w_next - w);
    let mut point = [0.0; 3];
    for i in 0..3 {
        point[i] = prev[i] + alpha * (next[i] - prev[i]);
    }
    Some(point)
}

fn has_diverged(state: &[f64; 3], threshold: f64) -> bool {
    state.iter().any(|v| v.is_nan() || v.abs() > threshold)
}
