//! Double-precision CPU reference.
//!
//! Direct evaluation of the same reductions, built on the host combine
//! functions of [`crate::reduction`]. Test tooling: this is what the GPU
//! paths are compared against, not a production fallback.

use crate::formula::HostFormula;
use crate::reduction::max_shift_exp::{
    max_shift_exp_fold_cpu, max_shift_exp_fold_kahan_cpu, max_shift_exp_init_cpu,
};
use crate::reduction::sum::{sum_fold_cpu, sum_fold_kahan_cpu, sum_init_cpu};
use crate::reduction::ReductionKind;
use crate::tiled::DimPair;

/// Reference `γ_i = Σ_j f(x_i, y_j)·b_j` over all rows.
///
/// Output is `nx` rows of DIMVECT scalars. Shapes are assumed valid; the
/// launch wrapper owns validation.
pub fn reduce_sum_cpu<Fm: HostFormula>(
    params: &[f64],
    x: &[f64],
    y: &[f64],
    b: &[f64],
    dims: DimPair,
) -> Vec<f64> {
    reduce_cpu::<Fm>(ReductionKind::Sum, params, x, y, b, dims)
}

/// Reference `(m_i, s_i)` rows of `1 + DIMVECT` scalars.
pub fn reduce_max_shift_exp_cpu<Fm: HostFormula>(
    params: &[f64],
    x: &[f64],
    y: &[f64],
    b: &[f64],
    dims: DimPair,
) -> Vec<f64> {
    reduce_cpu::<Fm>(ReductionKind::MaxShiftExp, params, x, y, b, dims)
}

/// Reference evaluation for any reduction family.
pub fn reduce_cpu<Fm: HostFormula>(
    kind: ReductionKind,
    params: &[f64],
    x: &[f64],
    y: &[f64],
    b: &[f64],
    dims: DimPair,
) -> Vec<f64> {
    let dim_point = dims.point as usize;
    let dim_vect = dims.vect as usize;
    let dim_red = kind.dim_red(dims.vect) as usize;
    let nx = x.len() / dim_point;
    let ny = y.len() / dim_point;

    let mut out = vec![0.0f64; nx * dim_red];
    let mut acc = vec![0.0f64; dim_red];
    let mut comp = vec![0.0f64; dim_vect];

    for i in 0..nx {
        let xi = &x[i * dim_point..(i + 1) * dim_point];

        match kind {
            ReductionKind::Sum | ReductionKind::SumKahan => sum_init_cpu(&mut acc),
            ReductionKind::MaxShiftExp | ReductionKind::MaxShiftExpKahan => {
                max_shift_exp_init_cpu(&mut acc)
            }
        }
        comp.fill(0.0);

        for j in 0..ny {
            let yj = &y[j * dim_point..(j + 1) * dim_point];
            let bj = &b[j * dim_vect..(j + 1) * dim_vect];
            let fij = Fm::eval(params, xi, yj);
            match kind {
                ReductionKind::Sum => sum_fold_cpu(&mut acc, fij, bj),
                ReductionKind::SumKahan => sum_fold_kahan_cpu(&mut acc, &mut comp, fij, bj),
                ReductionKind::MaxShiftExp => max_shift_exp_fold_cpu(&mut acc, fij, bj),
                ReductionKind::MaxShiftExpKahan => {
                    max_shift_exp_fold_kahan_cpu(&mut acc, &mut comp, fij, bj)
                }
            }
        }

        out[i * dim_red..(i + 1) * dim_red].copy_from_slice(&acc);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{ConstantOne, GaussKernel, ScalarProduct};
    use crate::reduction::log_sum_exp;

    #[test]
    fn test_identity_sum() {
        // Single pair with a constant formula just copies the payload.
        let out = reduce_sum_cpu::<ConstantOne>(&[], &[0.0], &[0.0], &[1.0], DimPair::new(1, 1));
        assert_eq!(out, vec![1.0]);
    }

    #[test]
    fn test_two_point_gaussian() {
        let x = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let b = [1.0, 1.0];
        let out = reduce_sum_cpu::<GaussKernel>(&[0.5], &x, &x, &b, DimPair::new(3, 1));

        let cross = (-0.5f64).exp();
        assert_eq!(out.len(), 2);
        assert!((out[0] - (1.0 + cross)).abs() < 1e-15);
        assert!((out[1] - (cross + 1.0)).abs() < 1e-15);
    }

    #[test]
    fn test_empty_y_yields_neutral_rows() {
        let dims = DimPair::new(2, 1);
        let x = [0.0, 0.0];

        let sum = reduce_sum_cpu::<GaussKernel>(&[1.0], &x, &[], &[], dims);
        assert_eq!(sum, vec![0.0]);

        let mse = reduce_max_shift_exp_cpu::<GaussKernel>(&[1.0], &x, &[], &[], dims);
        assert_eq!(mse[0], f64::NEG_INFINITY);
        assert_eq!(mse[1], 0.0);
    }

    #[test]
    fn test_max_shift_exp_overflow_scenario() {
        // f = ⟨x, y⟩ with x = 1 gives f values 1000, 1001, 1002; the direct
        // log-sum-exp overflows while the shifted pair stays finite.
        let out = reduce_max_shift_exp_cpu::<ScalarProduct>(
            &[1.0],
            &[1.0],
            &[1000.0, 1001.0, 1002.0],
            &[1.0, 1.0, 1.0],
            DimPair::new(1, 1),
        );

        assert_eq!(out[0], 1002.0);
        let expected_s = 1.0 + (-1.0f64).exp() + (-2.0f64).exp();
        assert!((out[1] - expected_s).abs() < 1e-12);
        assert!(log_sum_exp(&out).is_finite());
    }

    #[test]
    fn test_output_width_per_dim_pair() {
        for &(p, v) in crate::tiled::SUPPORTED_DIM_PAIRS {
            let dims = DimPair::new(p, v);
            let nx = 3;
            let ny = 5;
            let x = vec![0.5; nx * p as usize];
            let y = vec![0.25; ny * p as usize];
            let b = vec![1.0; ny * v as usize];

            let sum = reduce_sum_cpu::<GaussKernel>(&[1.0], &x, &y, &b, dims);
            assert_eq!(sum.len(), nx * v as usize);

            let mse = reduce_max_shift_exp_cpu::<GaussKernel>(&[1.0], &x, &y, &b, dims);
            assert_eq!(mse.len(), nx * (1 + v as usize));
        }
    }

    #[test]
    fn test_kahan_family_agrees_with_plain_in_f64() {
        let dims = DimPair::new(2, 2);
        let x: Vec<f64> = (0..20).map(|i| (i as f64 * 0.13).cos()).collect();
        let y: Vec<f64> = (0..40).map(|i| (i as f64 * 0.07).sin()).collect();
        let b: Vec<f64> = (0..40).map(|i| 1.0 + (i % 5) as f64).collect();

        let plain = reduce_cpu::<GaussKernel>(ReductionKind::Sum, &[2.0], &x, &y, &b, dims);
        let kahan = reduce_cpu::<GaussKernel>(ReductionKind::SumKahan, &[2.0], &x, &y, &b, dims);
        for (a, b) in plain.iter().zip(kahan.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
