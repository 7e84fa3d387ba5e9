//! Non-radial formulas.

use cubecl::prelude::*;

use super::{squared_distance, squared_distance_cpu, HostFormula, PairFormula};

/// Raw squared distance `‖x−y‖²`. Takes no parameters.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct SqDist;

#[cube]
impl<F: Float> PairFormula<F> for SqDist {
    fn eval(
        _params: &Array<F>,
        xi: &Array<F>,
        tile: &SharedMemory<F>,
        y_base: u32,
        #[comptime] dim_point: u32,
    ) -> F {
        squared_distance::<F>(xi, tile, y_base, dim_point)
    }
}

impl HostFormula for SqDist {
    fn eval(_params: &[f64], x: &[f64], y: &[f64]) -> f64 {
        squared_distance_cpu(x, y)
    }
}

/// Scaled scalar product `p₀·⟨x, y⟩`.
///
/// Unbounded above, which makes it the natural score for exercising the
/// overflow regime of the max-shifted exponential reduction.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct ScalarProduct;

#[cube]
impl<F: Float> PairFormula<F> for ScalarProduct {
    fn eval(
        params: &Array<F>,
        xi: &Array<F>,
        tile: &SharedMemory<F>,
        y_base: u32,
        #[comptime] dim_point: u32,
    ) -> F {
        let mut dot = F::new(0.0);
        #[unroll]
        for d in 0..dim_point {
            dot += xi[d] * tile[y_base + d];
        }
        params[0] * dot
    }
}

impl HostFormula for ScalarProduct {
    fn eval(params: &[f64], x: &[f64], y: &[f64]) -> f64 {
        let dot: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
        params[0] * dot
    }
}

/// The constant formula `f ≡ 1`.
///
/// Turns the sum reduction into a plain row-sum of the payload, which is
/// the degenerate case the smallest end-to-end checks are built on.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct ConstantOne;

#[cube]
impl<F: Float> PairFormula<F> for ConstantOne {
    fn eval(
        _params: &Array<F>,
        _xi: &Array<F>,
        _tile: &SharedMemory<F>,
        _y_base: u32,
        #[comptime] _dim_point: u32,
    ) -> F {
        F::new(1.0)
    }
}

impl HostFormula for ConstantOne {
    fn eval(_params: &[f64], _x: &[f64], _y: &[f64]) -> f64 {
        1.0
    }
}
