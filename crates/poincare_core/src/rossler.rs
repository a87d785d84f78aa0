use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

/// Parameters (a, b, c) of the Rössler vector field.
///
/// The classic chaotic attractor sits at a = 0.2, b = 0.2, c = 5.7.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RosslerParams {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl RosslerParams {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }
}

impl Default for RosslerParams {
    fn default() -> Self {
        Self {
            a: 0.2,
            b: 0.2,
            c: 5.7,
        }
    }
}

/// The Rössler system
///
/// dx/dt = -y - z
/// dy/dt =  x + a*y
/// dz/dt =  b + z*(x - c)
#[derive(Debug, Clone, Copy)]
pub struct Rossler {
    pub params: RosslerParams,
}

impl Rossler {
    pub fn new(params: RosslerParams) -> Self {
        Self { params }
    }
}

impl<T: Scalar> DynamicalSystem<T> for Rossler {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let a = T::from_f64(self.params.a).unwrap();
        let b = T::from_f64(self.params.b).unwrap();
        let c = T::from_f64(self.params.c).unwrap();
        let (px, py, pz) = (x[0], x[1], x[2]);

        out[0] = -py - pz;
        out[1] = px + a * py;
        out[2] = b + pz * (px - c);
    }
}
