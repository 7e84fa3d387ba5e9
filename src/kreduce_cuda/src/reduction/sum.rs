//! Plain weighted sum reduction `γ_i = Σ_j f_ij·b_j`.

use cubecl::prelude::*;
use num_traits::Float as HostFloat;

use super::{ReduceShape, Reducer};

/// Sum-type reduction. Accumulator: DIMVECT scalars, neutral element zero.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct SumReduction;

impl ReduceShape for SumReduction {
    fn dim_red(dim_vect: u32) -> u32 {
        dim_vect
    }

    fn dim_out(dim_vect: u32) -> u32 {
        dim_vect
    }

    fn dim_comp(dim_vect: u32) -> u32 {
        dim_vect
    }
}

#[cube]
impl<F: Float> Reducer<F> for SumReduction {
    fn init(acc: &mut Array<F>, #[comptime] dim_vect: u32) {
        #[unroll]
        for k in 0..dim_vect {
            acc[k] = F::new(0.0);
        }
    }

    fn fold(
        acc: &mut Array<F>,
        value: F,
        tile: &SharedMemory<F>,
        base: u32,
        #[comptime] dim_vect: u32,
    ) {
        #[unroll]
        for k in 0..dim_vect {
            acc[k] += value * tile[base + k];
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
        #[unroll]
        for k in 0..dim_vect {
            let term = value * tile[base + k] - comp[k];
            let folded = acc[k] + term;
            comp[k] = (folded - acc[k]) - term;
            acc[k] = folded;
        }
    }

    fn merge(acc: &mut Array<F>, partials: &Array<F>, base: u32, #[comptime] dim_vect: u32) {
        #[unroll]
        for k in 0..dim_vect {
            acc[k] += partials[base + k];
        }
    }

    fn write(acc: &Array<F>, out: &mut Array<F>, base: u32, #[comptime] dim_vect: u32) {
        #[unroll]
        for k in 0..dim_vect {
            out[base + k] = acc[k];
        }
    }
}

/// Host neutral element.
pub fn sum_init_cpu<T: HostFloat>(acc: &mut [T]) {
    for a in acc.iter_mut() {
        *a = T::zero();
    }
}

/// Host fold of one weighted payload row.
pub fn sum_fold_cpu<T: HostFloat>(acc: &mut [T], value: T, payload: &[T]) {
    for (a, &p) in acc.iter_mut().zip(payload.iter()) {
        *a = *a + value * p;
    }
}

/// Host compensated fold. `comp` carries the lost low-order bits.
pub fn sum_fold_kahan_cpu<T: HostFloat>(acc: &mut [T], comp: &mut [T], value: T, payload: &[T]) {
    for ((a, c), &p) in acc.iter_mut().zip(comp.iter_mut()).zip(payload.iter()) {
        let term = value * p - *c;
        let folded = *a + term;
        *c = (folded - *a) - term;
        *a = folded;
    }
}

/// Host merge of a partial accumulator.
pub fn sum_merge_cpu<T: HostFloat>(acc: &mut [T], partial: &[T]) {
    for (a, &p) in acc.iter_mut().zip(partial.iter()) {
        *a = *a + p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_accumulates_weighted_payload() {
        let mut acc = [0.0f64; 2];
        sum_fold_cpu(&mut acc, 2.0, &[1.0, 10.0]);
        sum_fold_cpu(&mut acc, 0.5, &[4.0, -2.0]);
        assert_eq!(acc, [4.0, 19.0]);
    }

    #[test]
    fn test_merge_matches_elementwise_add() {
        let mut acc = [1.0f64, 2.0, 3.0];
        sum_merge_cpu(&mut acc, &[0.5, 0.25, 0.125]);
        assert_eq!(acc, [1.5, 2.25, 3.125]);
    }

    #[test]
    fn test_merge_is_associative() {
        let parts = [[1e-3f64, 2.0], [5.0, -1.0], [0.25, 0.5]];

        let mut left = [0.0f64; 2];
        for p in &parts {
            sum_merge_cpu(&mut left, p);
        }

        let mut tail = [0.0f64; 2];
        sum_merge_cpu(&mut tail, &parts[1]);
        sum_merge_cpu(&mut tail, &parts[2]);
        let mut right = [0.0f64; 2];
        sum_merge_cpu(&mut right, &parts[0]);
        sum_merge_cpu(&mut right, &tail);

        assert_eq!(left, right);
    }

    #[test]
    fn test_kahan_beats_naive_in_f32() {
        // Alternating large/small terms lose the small ones entirely
        // without compensation.
        let terms: Vec<f32> = (0..2000)
            .map(|i| if i % 2 == 0 { 1.0e7 } else { 1.0e-3 })
            .collect();

        let mut naive = [0.0f32];
        let mut kahan = [0.0f32];
        let mut comp = [0.0f32];
        let mut exact = [0.0f64];
        for &t in &terms {
            sum_fold_cpu(&mut naive, 1.0, &[t]);
            sum_fold_kahan_cpu(&mut kahan, &mut comp, 1.0, &[t]);
            sum_fold_cpu(&mut exact, 1.0, &[t as f64]);
        }

        let naive_err = (naive[0] as f64 - exact[0]).abs();
        let kahan_err = (kahan[0] as f64 - exact[0]).abs();
        assert!(
            kahan_err < naive_err,
            "kahan error {kahan_err} should beat naive error {naive_err}"
        );
    }

    #[test]
    fn test_kahan_matches_plain_on_benign_input() {
        let mut plain = [0.0f64; 2];
        let mut kahan = [0.0f64; 2];
        let mut comp = [0.0f64; 2];
        for j in 0..64 {
            let payload = [j as f64, 1.0 / (1.0 + j as f64)];
            sum_fold_cpu(&mut plain, 1.5, &payload);
            sum_fold_kahan_cpu(&mut kahan, &mut comp, 1.5, &payload);
        }
        for k in 0..2 {
            assert!((plain[k] - kahan[k]).abs() < 1e-12);
        }
    }
}
