//! C ABI for the Poincaré section core.
//!
//! The signatures match the original C interface:
//! `Result* compute_poincare_map(double, double, double, int* size, int* status)`
//! and `void free_points(Result*)`, with `PoincarePoint` laid out like `Result`.
//!
//! Buffers returned by [`compute_poincare_map`] and
//! [`compute_poincare_map_with`] are owned by this library. The caller must
//! release each one exactly once with [`free_points`], passing back the same
//! pointer. The point count lives in a hidden slot just before the returned
//! pointer, so `free_points` needs no length. An empty section is returned as
//! a null pointer with `size = 0`; passing that to `free_points` is a no-op.
//!
//! Every entry point writes one of the `POINCARE_STATUS_*` codes to `status`.

use poincare_core::poincare::{compute_poincare_section, PoincareConfig, RunStatus};
use poincare_core::rossler::RosslerParams;
use poincare_core::solvers::Scheme;
use std::os::raw::{c_int, c_ulong};
use std::panic::catch_unwind;
use std::ptr;

pub const POINCARE_STATUS_SUCCESS: c_int = 0;
pub const POINCARE_STATUS_DIVERGED: c_int = 1;
pub const POINCARE_STATUS_INVALID_CONFIG: c_int = 2;
pub const POINCARE_STATUS_PANIC: c_int = 3;
pub const POINCARE_STATUS_NULL_POINTER: c_int = 4;

pub const POINCARE_SCHEME_EULER: c_int = 0;
pub const POINCARE_SCHEME_RK4: c_int = 1;

/// One section point as laid out for C callers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoincarePoint {
    pub x: f64,
    pub z: f64,
}

/// Production run: RK4, 200000 iterations, dt = 0.01, divergence guard at 1e10.
///
/// # Safety
/// `size` and `status` must be null or valid for a single write.
#[no_mangle]
pub unsafe extern "C" fn compute_poincare_map(
    a: f64,
    b: f64,
    c: f64,
    size: *mut c_int,
    status: *mut c_int,
) -> *mut PoincarePoint {
    run(a, b, c, Some(PoincareConfig::default()), size, status)
}

/// Run with an explicit scheme (`POINCARE_SCHEME_*`) and iteration budget.
/// A `max_iterations` of 0 keeps the scheme's default budget.
///
/// # Safety
/// `size` and `status` must be null or valid for a single write.
#[no_mangle]
pub unsafe extern "C" fn compute_poincare_map_with(
    a: f64,
    b: f64,
    c: f64,
    scheme: c_int,
    max_iterations: c_ulong,
    size: *mut c_int,
    status: *mut c_int,
) -> *mut PoincarePoint {
    let config = match scheme {
        POINCARE_SCHEME_EULER => Some(PoincareConfig::for_scheme(Scheme::Euler)),
        POINCARE_SCHEME_RK4 => Some(PoincareConfig::for_scheme(Scheme::Rk4)),
        other => {
            tracing::warn!(scheme = other, "rejecting unknown scheme code");
            None
        }
    };
    let config = config.map(|mut config| {
        if max_iterations > 0 {
            config.max_iterations = max_iterations as usize;
        }
        config
    });
    run(a, b, c, config, size, status)
}

/// Releases a buffer returned by one of the `compute_poincare_map*` calls.
///
/// # Safety
/// `points` must be null or a pointer returned by this library that has not
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn free_points(points: *mut PoincarePoint) {
    if points.is_null() {
        return;
    }
    let base = points.sub(1);
    let len = (*base).x.to_bits() as usize;
    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(base, len + 1)));
}

/// Boxes `points` behind a header slot whose `x` bits hold the count, and
/// returns a pointer to the first real point.
fn into_headed_buffer(points: Vec<PoincarePoint>) -> *mut PoincarePoint {
    let header = PoincarePoint {
        x: f64::from_bits(points.len() as u64),
        z: 0.0,
    };
    let buffer: Box<[PoincarePoint]> = std::iter::once(header).chain(points).collect();
    // SAFETY: the allocation has at least one slot, so offset 1 is in bounds
    // or one past the end.
    unsafe { (Box::into_raw(buffer) as *mut PoincarePoint).add(1) }
}

unsafe fn run(
    a: f64,
    b: f64,
    c: f64,
    config: Option<PoincareConfig>,
    size: *mut c_int,
    status: *mut c_int,
) -> *mut PoincarePoint {
    if size.is_null() || status.is_null() {
        if !status.is_null() {
            *status = POINCARE_STATUS_NULL_POINTER;
        }
        return ptr::null_mut();
    }
    *size = 0;

    let config = match config {
        Some(config) => config,
        None => {
            *status = POINCARE_STATUS_INVALID_CONFIG;
            return ptr::null_mut();
        }
    };

    let params = RosslerParams::new(a, b, c);
    let section = match catch_unwind(|| compute_poincare_section(params, &config)) {
        Ok(Ok(section)) => section,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "rejecting Poincaré configuration");
            *status = POINCARE_STATUS_INVALID_CONFIG;
            return ptr::null_mut();
        }
        Err(_) => {
            *status = POINCARE_STATUS_PANIC;
            return ptr::null_mut();
        }
    };

    *status = match section.status {
        RunStatus::Success => POINCARE_STATUS_SUCCESS,
        RunStatus::Diverged => POINCARE_STATUS_DIVERGED,
    };

    if section.points.is_empty() {
        return ptr::null_mut();
    }

    let count = match c_int::try_from(section.points.len()) {
        Ok(count) => count,
        Err(_) => {
            tracing::warn!(points = section.points.len(), "section too large for an int size");
            *status = POINCARE_STATUS_INVALID_CONFIG;
            return ptr::null_mut();
        }
    };
    let points = section
        .points
        .iter()
        .map(|p| PoincarePoint { x: p.x, z: p.z })
        .collect();
    *size = count;
    into_headed_buffer(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::slice;

    fn call_with(
        a: f64,
        b: f64,
        c: f64,
        scheme: c_int,
        max_iterations: c_ulong,
    ) -> (Vec<PoincarePoint>, c_int) {
        let mut size: c_int = -1;
        let mut status = -1;
        unsafe {
            let points = compute_poincare_map_with(
                a,
                b,
                c,
                scheme,
                max_iterations,
                &mut size,
                &mut status,
            );
            let copied = if points.is_null() {
                assert_eq!(size, 0);
                Vec::new()
            } else {
                slice::from_raw_parts(points, size as usize).to_vec()
            };
            free_points(points);
            (copied, status)
        }
    }

    #[test]
    fn production_call_matches_core_section() {
        let mut size: c_int = 0;
        let mut status = -1;
        let points = unsafe { compute_poincare_map(0.2, 0.2, 5.7, &mut size, &mut status) };
        assert!(!points.is_null());
        assert_eq!(status, POINCARE_STATUS_SUCCESS);

        let params = RosslerParams::new(0.2, 0.2, 5.7);
        let expected =
            compute_poincare_section(params, &PoincareConfig::default()).expect("section");
        assert_eq!(size as usize, expected.points.len());

        let copied = unsafe { slice::from_raw_parts(points, size as usize) }.to_vec();
        unsafe { free_points(points) };
        for (ffi, core) in copied.iter().zip(&expected.points) {
            assert_eq!(ffi.x, core.x);
            assert_eq!(ffi.z, core.z);
        }
    }

    #[test]
    fn headed_buffer_stores_count_before_first_point() {
        let points = vec![
            PoincarePoint { x: 1.0, z: 2.0 },
            PoincarePoint { x: 3.0, z: 4.0 },
            PoincarePoint { x: 5.0, z: 6.0 },
        ];
        let raw = into_headed_buffer(points.clone());
        unsafe {
            assert_eq!((*raw.sub(1)).x.to_bits(), 3);
            assert_eq!(slice::from_raw_parts(raw, 3), points.as_slice());
            free_points(raw);
        }
    }

    #[test]
    fn empty_section_returns_null_and_frees_safely() {
        let (points, status) = call_with(0.2, 0.2, 5.7, POINCARE_SCHEME_RK4, 2);
        assert!(points.is_empty());
        assert_eq!(status, POINCARE_STATUS_SUCCESS);
        unsafe { free_points(ptr::null_mut()) };
    }

    #[test]
    fn diverged_run_reports_status() {
        let (points, status) = call_with(0.2, 1e6, 5.7, POINCARE_SCHEME_RK4, 0);
        assert!(points.is_empty());
        assert_eq!(status, POINCARE_STATUS_DIVERGED);
    }

    #[test]
    fn euler_scheme_uses_preview_budget() {
        let (points, status) = call_with(0.2, 0.2, 5.7, POINCARE_SCHEME_EULER, 0);
        assert_eq!(status, POINCARE_STATUS_SUCCESS);
        assert_eq!(points.len(), 20);
    }

    #[test]
    fn unknown_scheme_is_invalid_config() {
        let (points, status) = call_with(0.2, 0.2, 5.7, 7, 0);
        assert!(points.is_empty());
        assert_eq!(status, POINCARE_STATUS_INVALID_CONFIG);
    }

    #[test]
    fn null_out_pointers_are_rejected() {
        let mut status = -1;
        let points =
            unsafe { compute_poincare_map(0.2, 0.2, 5.7, ptr::null_mut(), &mut status) };
        assert!(points.is_null());
        assert_eq!(status, POINCARE_STATUS_NULL_POINTER);

        let mut size: c_int = 0;
        let points = unsafe { compute_poincare_map(0.2, 0.2, 5.7, &mut size, ptr::null_mut()) };
        assert!(points.is_null());
    }
}
