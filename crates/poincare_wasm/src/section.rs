//! WASM wrapper around a single Poincaré section run.

use anyhow::{bail, Context};
use js_sys::Float64Array;
use poincare_core::poincare::{
    compute_poincare_section as core_section, PoincareConfig, SectionPlane,
};
use poincare_core::rossler::RosslerParams;
use poincare_core::solvers::Scheme;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmPoincareSection {
    params: RosslerParams,
    pub(crate) config: PoincareConfig,
}

/// Preset configuration for a solver name (`"rk4"` or `"euler"`).
pub(crate) fn config_for_solver(solver_name: &str) -> anyhow::Result<PoincareConfig> {
    let scheme: Scheme = solver_name.parse()?;
    Ok(PoincareConfig::for_scheme(scheme))
}

/// Applies `update` to a copy of `base` and keeps it only if it still validates.
pub(crate) fn updated_config(
    base: &PoincareConfig,
    update: impl FnOnce(&mut PoincareConfig),
) -> anyhow::Result<PoincareConfig> {
    let mut next = *base;
    update(&mut next);
    next.validate().context("Invalid Poincaré configuration")?;
    Ok(next)
}

pub(crate) fn initial_state_from_slice(state: &[f64]) -> anyhow::Result<[f64; 3]> {
    if state.len() != 3 {
        bail!(
            "Initial state dimension mismatch. Expected 3, got {}.",
            state.len()
        );
    }
    Ok([state[0], state[1], state[2]])
}

pub(crate) fn plane_from_name(name: &str) -> anyhow::Result<SectionPlane> {
    match name {
        "y" => Ok(SectionPlane::Y),
        "z" => Ok(SectionPlane::Z),
        _ => bail!("Unknown section plane '{}' (expected 'y' or 'z').", name),
    }
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}

#[wasm_bindgen]
impl WasmPoincareSection {
    #[wasm_bindgen(constructor)]
    pub fn new(
        a: f64,
        b: f64,
        c: f64,
        solver_name: &str,
    ) -> Result<WasmPoincareSection, JsValue> {
        console_error_panic_hook::set_once();

        let config = config_for_solver(solver_name).map_err(to_js_error)?;
        Ok(WasmPoincareSection {
            params: RosslerParams::new(a, b, c),
            config,
        })
    }

    pub fn set_max_iterations(&mut self, max_iterations: u32) -> Result<(), JsValue> {
        self.config = updated_config(&self.config, |c| {
            c.max_iterations = max_iterations as usize
        })
        .map_err(to_js_error)?;
        Ok(())
    }

    pub fn set_step_size(&mut self, dt: f64) -> Result<(), JsValue> {
        self.config =
            updated_config(&self.config, |c| c.step_size = dt).map_err(to_js_error)?;
        Ok(())
    }

    pub fn set_divergence_threshold(&mut self, threshold: f64) -> Result<(), JsValue> {
        self.config = updated_config(&self.config, |c| {
            c.divergence_threshold = Some(threshold)
        })
        .map_err(to_js_error)?;
        Ok(())
    }

    pub fn disable_divergence_guard(&mut self) {
        self.config.divergence_threshold = None;
    }

    pub fn set_initial_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        let initial = initial_state_from_slice(state).map_err(to_js_error)?;
        self.config = updated_config(&self.config, |c| c.initial_state = initial)
            .map_err(to_js_error)?;
        Ok(())
    }

    /// Selects the upward section plane: `"y"` (default) or `"z"`.
    pub fn set_plane(&mut self, plane_name: &str) -> Result<(), JsValue> {
        self.config.plane = plane_from_name(plane_name).map_err(to_js_error)?;
        Ok(())
    }

    pub fn get_max_iterations(&self) -> u32 {
        self.config.max_iterations as u32
    }

    pub fn get_step_size(&self) -> f64 {
        self.config.step_size
    }

    /// Runs the integrator and returns the serialized section
    /// (`{ points: [{ x, y, z, step }], status, steps_taken, plane }`).
    pub fn compute(&self) -> Result<JsValue, JsValue> {
        let section = core_section(self.params, &self.config)
            .map_err(|e| JsValue::from_str(&format!("Poincaré section failed: {}", e)))?;
        to_value(&section).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Runs the integrator and returns the in-plane pairs interleaved,
    /// `[x0, z0, x1, z1, ...]` on the y plane and `[x0, y0, ...]` on the z plane.
    /// Divergence is not reported here; use `compute` when the status matters.
    pub fn compute_flat(&self) -> Result<Float64Array, JsValue> {
        let section = core_section(self.params, &self.config)
            .map_err(|e| JsValue::from_str(&format!("Poincaré section failed: {}", e)))?;
        Ok(Float64Array::from(section.flattened().as_slice()))
    }
}

/// One-shot entry point: `config` may be `undefined` (production defaults) or a
/// partial `PoincareConfig` object whose missing fields come from the preset of
/// the scheme it names.
#[wasm_bindgen]
pub fn compute_poincare_section(
    a: f64,
    b: f64,
    c: f64,
    config: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let config: PoincareConfig = if config.is_undefined() || config.is_null() {
        PoincareConfig::default()
    } else {
        from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid Poincaré configuration: {}", e)))?
    };
    let section = core_section(RosslerParams::new(a, b, c), &config)
        .map_err(|e| JsValue::from_str(&format!("Poincaré section failed: {}", e)))?;
    to_value(&section).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_for_solver_picks_matching_preset() {
        let rk4 = config_for_solver("rk4").expect("rk4 preset");
        assert_eq!(rk4, PoincareConfig::default());
        let euler = config_for_solver("euler").expect("euler preset");
        assert_eq!(euler, PoincareConfig::preview());
        assert!(config_for_solver("tsit5").is_err());
    }

    #[test]
    fn updated_config_rejects_and_leaves_base_untouched() {
        let base = PoincareConfig::default();
        let err = updated_config(&base, |c| c.step_size = -1.0).expect_err("negative dt");
        let message = format!("{:#}", err);
        assert!(message.contains("Invalid Poincaré configuration"));
        assert!(message.contains("step_size"));
        assert_eq!(base, PoincareConfig::default());

        let next = updated_config(&base, |c| c.max_iterations = 10).expect("valid update");
        assert_eq!(next.max_iterations, 10);
    }

    #[test]
    fn initial_state_requires_three_components() {
        assert_eq!(
            initial_state_from_slice(&[1.0, 2.0, 3.0]).expect("state"),
            [1.0, 2.0, 3.0]
        );
        let err = initial_state_from_slice(&[1.0, 2.0]).expect_err("short state");
        assert!(err.to_string().contains("Expected 3, got 2"));
    }

    #[test]
    fn plane_names_map_to_section_planes() {
        assert_eq!(plane_from_name("y").expect("y"), SectionPlane::Y);
        assert_eq!(plane_from_name("z").expect("z"), SectionPlane::Z);
        let err = plane_from_name("x").expect_err("x plane");
        assert!(err.to_string().contains("Unknown section plane 'x'"));
    }

    #[test]
    fn wasm_section_setters_update_config() {
        let mut section = WasmPoincareSection::new(0.2, 0.2, 5.7, "euler").expect("section");
        assert_eq!(section.get_max_iterations(), 12_000);

        section.set_max_iterations(500).expect("iterations");
        section.set_step_size(0.005).expect("dt");
        section.set_initial_state(&[0.5, 0.0, 0.1]).expect("state");
        section.set_divergence_threshold(1e6).expect("threshold");

        assert_eq!(section.get_max_iterations(), 500);
        assert_eq!(section.get_step_size(), 0.005);
        assert_eq!(section.config.initial_state, [0.5, 0.0, 0.1]);
        assert_eq!(section.config.divergence_threshold, Some(1e6));

        section.set_plane("z").expect("plane");
        assert_eq!(section.config.plane, SectionPlane::Z);

        section.disable_divergence_guard();
        assert_eq!(section.config.divergence_threshold, None);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use poincare_core::poincare::{PoincareSection, RunStatus};
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn rejects_unknown_solver() {
        let result = WasmPoincareSection::new(0.2, 0.2, 5.7, "nope");
        let message = result
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("unknown integration scheme"));
    }

    #[wasm_bindgen_test]
    fn rejects_zero_iterations() {
        let mut section = WasmPoincareSection::new(0.2, 0.2, 5.7, "rk4").expect("section");
        assert!(section.set_max_iterations(0).is_err());
        assert_eq!(section.get_max_iterations(), 200_000);
    }

    #[wasm_bindgen_test]
    fn compute_returns_serialized_section() {
        let mut section = WasmPoincareSection::new(0.2, 0.2, 5.7, "rk4").expect("section");
        section.set_max_iterations(5_000).expect("iterations");
        let value = section.compute().expect("compute");
        let decoded: PoincareSection = from_value(value).expect("decode");
        assert_eq!(decoded.status, RunStatus::Success);
        assert!(!decoded.points.is_empty());

        let flat = section.compute_flat().expect("flat").to_vec();
        assert_eq!(flat.len(), decoded.points.len() * 2);
        assert_eq!(flat[0], decoded.points[0].x);
    }

    #[wasm_bindgen_test]
    fn one_shot_partial_euler_config_uses_preview_budget() {
        let config = js_sys::JSON::parse(r#"{"scheme":"euler"}"#).expect("json");
        let value = compute_poincare_section(0.2, 0.2, 5.7, config).expect("compute");
        let decoded: PoincareSection = from_value(value).expect("decode");
        assert_eq!(decoded.status, RunStatus::Success);
        assert_eq!(decoded.steps_taken, 11_999);
        assert_eq!(decoded.points.len(), 20);
    }

    #[wasm_bindgen_test]
    fn one_shot_accepts_undefined_config() {
        let value = compute_poincare_section(0.2, 1e6, 5.7, JsValue::UNDEFINED).expect("compute");
        let decoded: PoincareSection = from_value(value).expect("decode");
        assert_eq!(decoded.status, RunStatus::Diverged);
        assert!(decoded.points.is_empty());
    }
}
