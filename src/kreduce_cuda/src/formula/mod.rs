//! Scalar formulas evaluated per (i, j) pair.
//!
//! A formula is a pure device-callable function `f(x_i, y_j, params)`
//! supplied to the tile kernels as a type parameter, so every
//! (formula, reduction, dimensions) tuple monomorphizes into its own
//! kernel with no runtime indirection on the hot path.
//!
//! Each built-in formula also implements [`HostFormula`], the
//! double-precision host evaluation used by the CPU reference in
//! [`crate::tiled::cpu`].

pub mod basic;
pub mod radial;

pub use basic::{ConstantOne, ScalarProduct, SqDist};
pub use radial::{CauchyKernel, GaussKernel, InvMultiquadricKernel, LaplaceKernel};

use cubecl::prelude::*;

/// Device-side scalar formula.
///
/// `xi` holds the DIMPOINT coordinates of x_i in thread-local storage;
/// `tile` is the shared region of interleaved `[y_j | b_j]` records and
/// `y_base` the offset of y_j inside it. The payload part of the record
/// is not visible to the formula; it belongs to the reduction.
#[cube]
pub trait PairFormula<F: Float>: 'static + Send + Sync + core::fmt::Debug {
    fn eval(
        params: &Array<F>,
        xi: &Array<F>,
        tile: &SharedMemory<F>,
        y_base: u32,
        #[comptime] dim_point: u32,
    ) -> F;
}

/// Host-side double-precision evaluation of the same formula.
///
/// Used by the CPU reference path and by tests; `x` and `y` are single
/// rows of DIMPOINT scalars.
pub trait HostFormula {
    fn eval(params: &[f64], x: &[f64], y: &[f64]) -> f64;
}

/// Squared euclidean distance between x_i and the y_j record at `y_base`.
#[cube]
pub fn squared_distance<F: Float>(
    xi: &Array<F>,
    tile: &SharedMemory<F>,
    y_base: u32,
    #[comptime] dim_point: u32,
) -> F {
    let mut r2 = F::new(0.0);
    #[unroll]
    for d in 0..dim_point {
        let diff = xi[d] - tile[y_base + d];
        r2 += diff * diff;
    }
    r2
}

/// Host counterpart of [`squared_distance`].
pub fn squared_distance_cpu(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_distance_cpu() {
        let x = [0.0, 0.0, 0.0];
        let y = [1.0, 2.0, 2.0];
        assert_eq!(squared_distance_cpu(&x, &y), 9.0);
    }

    #[test]
    fn test_squared_distance_cpu_is_symmetric() {
        let x = [1.5, -2.0];
        let y = [-0.5, 3.0];
        assert_eq!(squared_distance_cpu(&x, &y), squared_distance_cpu(&y, &x));
    }
}
