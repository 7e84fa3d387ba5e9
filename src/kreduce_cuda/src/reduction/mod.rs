//! Reduction descriptors.
//!
//! A reduction is four device-callable operations (neutral element,
//! pair combine, compensated combine, finalize) plus a merge that folds
//! a partial accumulator into another. The tile kernels receive the
//! descriptor as a type parameter, so each (reduction, formula,
//! dimensions) tuple monomorphizes into its own kernel.
//!
//! Two families are implemented:
//!
//! - [`SumReduction`]: `γ_i = Σ_j f_ij·b_j`, accumulator of DIMVECT scalars.
//! - [`MaxShiftExpReduction`]: the coupled pair
//!   `(m_i, s_i) = (max_j f_ij, Σ_j exp(f_ij − m_i)·g_ij)`, accumulator of
//!   `1 + DIMVECT` scalars with the running maximum in slot 0.
//!
//! Both carry a Kahan variant selected at compile time through the
//! kernel's `kahan` flag; `fold` itself never branches on it. The same
//! combine algebra exists as plain host functions (`*_cpu`) over
//! `num_traits::Float`, exercised by the CPU reference and the property
//! tests in f64 and f32.

pub mod max_shift_exp;
pub mod sum;

pub use max_shift_exp::{log_sum_exp, MaxShiftExpReduction};
pub use sum::SumReduction;

use cubecl::prelude::*;

/// Device-side reduction descriptor.
///
/// `tile` is the shared region of interleaved `[y_j | b_j]` records;
/// `base` addresses the first payload scalar of the record inside it.
/// Accumulator and compensation buffers are thread-local and never
/// alias.
#[cube]
pub trait Reducer<F: Float>: 'static + Send + Sync + core::fmt::Debug {
    /// Set `acc` to the neutral element.
    fn init(acc: &mut Array<F>, #[comptime] dim_vect: u32);

    /// Fold one (i, j) sample: the scalar formula value and the DIMVECT
    /// payload row at `tile[base..]`.
    fn fold(
        acc: &mut Array<F>,
        value: F,
        tile: &SharedMemory<F>,
        base: u32,
        #[comptime] dim_vect: u32,
    );

    /// As [`Reducer::fold`], with compensated additions. `comp` carries
    /// the lost low-order bits between calls; the compensation applies to
    /// the term being added, so the no-loss path reduces to an ordinary
    /// addition plus two subtractions.
    fn fold_kahan(
        acc: &mut Array<F>,
        comp: &mut Array<F>,
        value: F,
        tile: &SharedMemory<F>,
        base: u32,
        #[comptime] dim_vect: u32,
    );

    /// Fold the partial accumulator of DIMRED scalars at
    /// `partials[base..]`. Associative and commutative up to
    /// floating-point reassociation.
    fn merge(acc: &mut Array<F>, partials: &Array<F>, base: u32, #[comptime] dim_vect: u32);

    /// Copy the accumulator to the output row at `out[base..]`.
    fn write(acc: &Array<F>, out: &mut Array<F>, base: u32, #[comptime] dim_vect: u32);
}

/// Host-side shape queries of a reduction family.
pub trait ReduceShape {
    /// Accumulator width as a function of DIMVECT.
    fn dim_red(dim_vect: u32) -> u32;

    /// Output row width. Equals `dim_red` for both built-in families.
    fn dim_out(dim_vect: u32) -> u32;

    /// Width of the Kahan compensation buffer.
    fn dim_comp(dim_vect: u32) -> u32;
}

/// Runtime selector for the reduction family of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionKind {
    /// `Σ_j f_ij·b_j`.
    Sum,
    /// As [`ReductionKind::Sum`] with Kahan-compensated accumulation.
    SumKahan,
    /// `(max_j f_ij, Σ_j exp(f_ij − max)·g_ij)`.
    MaxShiftExp,
    /// As [`ReductionKind::MaxShiftExp`] with Kahan compensation on the
    /// exponential sum.
    MaxShiftExpKahan,
}

impl ReductionKind {
    /// Whether the compensated combine is selected.
    pub fn is_kahan(self) -> bool {
        matches!(self, ReductionKind::SumKahan | ReductionKind::MaxShiftExpKahan)
    }

    /// Accumulator width for this family.
    pub fn dim_red(self, dim_vect: u32) -> u32 {
        match self {
            ReductionKind::Sum | ReductionKind::SumKahan => SumReduction::dim_red(dim_vect),
            ReductionKind::MaxShiftExp | ReductionKind::MaxShiftExpKahan => {
                MaxShiftExpReduction::dim_red(dim_vect)
            }
        }
    }

    /// Output row width for this family.
    pub fn dim_out(self, dim_vect: u32) -> u32 {
        match self {
            ReductionKind::Sum | ReductionKind::SumKahan => SumReduction::dim_out(dim_vect),
            ReductionKind::MaxShiftExp | ReductionKind::MaxShiftExpKahan => {
                MaxShiftExpReduction::dim_out(dim_vect)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dim_red_per_family() {
        assert_eq!(ReductionKind::Sum.dim_red(3), 3);
        assert_eq!(ReductionKind::SumKahan.dim_red(3), 3);
        assert_eq!(ReductionKind::MaxShiftExp.dim_red(3), 4);
        assert_eq!(ReductionKind::MaxShiftExpKahan.dim_red(3), 4);
    }

    #[test]
    fn test_dim_out_equals_dim_red() {
        for kind in [
            ReductionKind::Sum,
            ReductionKind::SumKahan,
            ReductionKind::MaxShiftExp,
            ReductionKind::MaxShiftExpKahan,
        ] {
            for dim_vect in 1..=3 {
                assert_eq!(kind.dim_out(dim_vect), kind.dim_red(dim_vect));
            }
        }
    }

    #[test]
    fn test_compensation_width_is_dim_vect() {
        // Slot 0 of the max-shifted accumulator is a maximum, not a sum,
        // so only the DIMVECT exponential components carry compensation.
        for dim_vect in 1..=3 {
            assert_eq!(SumReduction::dim_comp(dim_vect), dim_vect);
            assert_eq!(MaxShiftExpReduction::dim_comp(dim_vect), dim_vect);
        }
    }

    #[test]
    fn test_kahan_flag() {
        assert!(!ReductionKind::Sum.is_kahan());
        assert!(ReductionKind::SumKahan.is_kahan());
        assert!(!ReductionKind::MaxShiftExp.is_kahan());
        assert!(ReductionKind::MaxShiftExpKahan.is_kahan());
    }
}
