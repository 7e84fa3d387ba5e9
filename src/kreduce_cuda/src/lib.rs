//! CubeCL-based tiled GPU reduction engine for kernel sums over point clouds.
//!
//! Given two point clouds x (Nx rows) and y (Ny rows), a per-y payload b
//! and a scalar formula f(x_i, y_j, params), this library computes for
//! every i a reduction over j without ever materializing the Nx×Ny
//! matrix:
//!
//! - Sum: `γ_i = Σ_j f(x_i, y_j)·b_j`
//! - Max-shifted exponential: `(m_i, s_i) = (max_j f_ij, Σ_j exp(f_ij − m_i)·g_ij)`,
//!   the overflow-free base of log-sum-exp and softmax
//!
//! # Architecture
//!
//! The evaluation is a block-tiled map-reduce:
//! - Each thread pins its x_i in registers and owns one output row
//! - Interleaved `(y_j, b_j)` records stream through shared memory one
//!   tile per block, so every y element is read from global memory once
//!   per block
//! - The reduction descriptor (neutral element, combine, Kahan combine,
//!   finalize) and the formula are type parameters of the kernels; every
//!   (formula, reduction, dimensions, precision) tuple monomorphizes
//!   into its own kernel
//! - A 2D scheme distributes the inner loop over j-tiles and merges the
//!   partial accumulators with the descriptor's own combine when Nx is
//!   too small to fill the device
//!
//! # Usage
//!
//! ```ignore
//! use kreduce_cuda::{DimPair, GaussKernel, GpuRuntime, TileConfig};
//!
//! let runtime = GpuRuntime::new()?;
//!
//! // γ_i = Σ_j exp(−0.5·‖x_i − y_j‖²)·b_j over 3D points
//! let gamma = runtime.reduce_sum::<f32, GaussKernel>(
//!     &[0.5], &x, &y, &b, DimPair::new(3, 1), &TileConfig::default())?;
//!
//! // Overflow-free log Σ_j exp f(x_i, y_j)
//! let lse = runtime.log_sum_exp::<f32, GaussKernel>(
//!     &[0.5], &x, &y, 3, &TileConfig::default())?;
//! ```

/// Print to stdout only when the `test-verbose` feature is enabled.
///
/// Use this macro in tests for debug output that is normally too verbose.
/// Enable with: `cargo test --features test-verbose`
#[macro_export]
macro_rules! test_println {
    ($($arg:tt)*) => {
        #[cfg(feature = "test-verbose")]
        println!($($arg)*);
    };
}

pub mod error;
pub mod formula;
pub mod reduction;
pub mod test_utils;
pub mod tiled;
pub mod timing;

#[cfg(feature = "cuda")]
pub mod launch;
#[cfg(feature = "cuda")]
pub mod runtime;

pub use error::EvalError;
pub use formula::{
    CauchyKernel, ConstantOne, GaussKernel, HostFormula, InvMultiquadricKernel, LaplaceKernel,
    PairFormula, ScalarProduct, SqDist,
};
pub use reduction::{
    log_sum_exp, MaxShiftExpReduction, ReduceShape, Reducer, ReductionKind, SumReduction,
};
pub use tiled::{DimPair, Scheme, TileConfig, SUPPORTED_DIM_PAIRS};
pub use timing::EvalTiming;

// Launch wrapper and runtime (the GPU entry points)
#[cfg(feature = "cuda")]
pub use launch::{evaluate, evaluate_status, validate_shapes};
#[cfg(feature = "cuda")]
pub use runtime::{is_cuda_available, GpuRuntime};
