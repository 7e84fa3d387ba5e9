//! Max-shifted exponential reduction.
//!
//! Maintains the coupled pair `(m, s) = (max_j f_ij, Σ_j exp(f_ij − m)·g_ij)`
//! per output row. The accumulator holds `m` in slot 0 and the DIMVECT
//! components of `s` in slots 1.., with neutral element `(−∞, 0)` since
//! `exp(−∞)·0 = 0`.
//!
//! The combine keeps the running maximum on the left: whichever of the
//! two maxima is smaller has its sum rescaled by `exp(smaller − larger)`,
//! so every exponentiation argument is ≤ 0 and the sum can never
//! overflow. The combine is associative and commutative on (m, s) pairs
//! up to floating-point reassociation, which is what lets the 2D scheme
//! merge per-tile partials with the same operation.
//!
//! Downstream flattening (`m + log s` for log-sum-exp, division for
//! softmax) is the caller's job; [`log_sum_exp`] is provided for hosts.

use cubecl::prelude::*;
use num_traits::Float as HostFloat;

use super::{ReduceShape, Reducer};

/// Max-shifted exponential reduction. Accumulator: `1 + DIMVECT` scalars.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct MaxShiftExpReduction;

impl ReduceShape for MaxShiftExpReduction {
    fn dim_red(dim_vect: u32) -> u32 {
        1 + dim_vect
    }

    fn dim_out(dim_vect: u32) -> u32 {
        1 + dim_vect
    }

    fn dim_comp(dim_vect: u32) -> u32 {
        dim_vect
    }
}

#[cube]
impl<F: Float> Reducer<F> for MaxShiftExpReduction {
    fn init(acc: &mut Array<F>, #[comptime] dim_vect: u32) {
        acc[0] = F::new(f32::NEG_INFINITY);
        #[unroll]
        for k in 0..dim_vect {
            acc[k + 1] = F::new(0.0);
        }
    }

    fn fold(
        acc: &mut Array<F>,
        value: F,
        tile: &SharedMemory<F>,
        base: u32,
        #[comptime] dim_vect: u32,
    ) {
        if acc[0] > value {
            // exp(m)·(s + g·exp(m' − m)) with m > m'
            let shift = F::exp(value - acc[0]);
            #[unroll]
            for k in 0..dim_vect {
                acc[k + 1] += tile[base + k] * shift;
            }
        } else {
            // exp(m')·(g + exp(m − m')·s) with m ≤ m'
            let shift = F::exp(acc[0] - value);
            #[unroll]
            for k in 0..dim_vect {
                acc[k + 1] = tile[base + k] + shift * acc[k + 1];
            }
            acc[0] = value;
        }
    }

    fn fold_kahan(
        acc: &mut Array<F>,
        comp: &mut Array<F>,
        value: F,
        tile: &SharedMemory<F>,
        base: u32,
        #[comptime] dim_vect: u32,
    ) {
        if acc[0] > value {
            let shift = F::exp(value - acc[0]);
            #[unroll]
            for k in 0..dim_vect {
                let term = tile[base + k] * shift - comp[k];
                let folded = acc[k + 1] + term;
                comp[k] = (folded - acc[k + 1]) - term;
                acc[k + 1] = folded;
            }
        } else {
            let shift = F::exp(acc[0] - value);
            #[unroll]
            for k in 0..dim_vect {
                // The running sum and its compensation both rescale by the shift.
                let scaled = shift * acc[k + 1];
                let term = tile[base + k] - shift * comp[k];
                let folded = scaled + term;
                comp[k] = (folded - scaled) - term;
                acc[k + 1] = folded;
            }
            acc[0] = value;
        }
    }

    fn merge(acc: &mut Array<F>, partials: &Array<F>, base: u32, #[comptime] dim_vect: u32) {
        let other_max = partials[base];
        if acc[0] > other_max {
            let shift = F::exp(other_max - acc[0]);
            #[unroll]
            for k in 0..dim_vect {
                acc[k + 1] += partials[base + 1 + k] * shift;
            }
        } else {
            let shift = F::exp(acc[0] - other_max);
            #[unroll]
            for k in 0..dim_vect {
                acc[k + 1] = partials[base + 1 + k] + shift * acc[k + 1];
            }
            acc[0] = other_max;
        }
    }

    fn write(acc: &Array<F>, out: &mut Array<F>, base: u32, #[comptime] dim_vect: u32) {
        out[base] = acc[0];
        #[unroll]
        for k in 0..dim_vect {
            out[base + 1 + k] = acc[k + 1];
        }
    }
}

/// Host neutral element `(−∞, 0)`.
pub fn max_shift_exp_init_cpu<T: HostFloat>(acc: &mut [T]) {
    acc[0] = T::neg_infinity();
    for a in acc[1..].iter_mut() {
        *a = T::zero();
    }
}

/// Host fold of one `(f_ij, g_j)` sample into the `(m, s)` accumulator.
pub fn max_shift_exp_fold_cpu<T: HostFloat>(acc: &mut [T], value: T, payload: &[T]) {
    if acc[0] > value {
        let shift = (value - acc[0]).exp();
        for (a, &g) in acc[1..].iter_mut().zip(payload.iter()) {
            *a = *a + g * shift;
        }
    } else {
        let shift = (acc[0] - value).exp();
        for (a, &g) in acc[1..].iter_mut().zip(payload.iter()) {
            *a = g + shift * *a;
        }
        acc[0] = value;
    }
}

/// Host compensated fold.
pub fn max_shift_exp_fold_kahan_cpu<T: HostFloat>(
    acc: &mut [T],
    comp: &mut [T],
    value: T,
    payload: &[T],
) {
    if acc[0] > value {
        let shift = (value - acc[0]).exp();
        for ((a, c), &g) in acc[1..].iter_mut().zip(comp.iter_mut()).zip(payload.iter()) {
            let term = g * shift - *c;
            let folded = *a + term;
            *c = (folded - *a) - term;
            *a = folded;
        }
    } else {
        let shift = (acc[0] - value).exp();
        for ((a, c), &g) in acc[1..].iter_mut().zip(comp.iter_mut()).zip(payload.iter()) {
            let scaled = shift * *a;
            let term = g - shift * *c;
            let folded = scaled + term;
            *c = (folded - scaled) - term;
            *a = folded;
        }
        acc[0] = value;
    }
}

/// Host merge of a partial `(m', s')` accumulator.
pub fn max_shift_exp_merge_cpu<T: HostFloat>(acc: &mut [T], partial: &[T]) {
    max_shift_exp_fold_cpu(acc, partial[0], &partial[1..]);
}

/// Flatten an `(m, s)` row (DIMVECT = 1) to `m + log s`.
///
/// The neutral row `(−∞, 0)` flattens to `−∞`.
pub fn log_sum_exp<T: HostFloat>(row: &[T]) -> T {
    row[0] + row[1].ln()
}
