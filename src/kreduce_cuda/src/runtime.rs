//! GPU runtime management for CubeCL CUDA execution.
//!
//! Owns device initialization and the compute client, and exposes the
//! convenience entry points most callers want:
//!
//! ```ignore
//! use kreduce_cuda::{DimPair, GaussKernel, GpuRuntime, TileConfig};
//!
//! let runtime = GpuRuntime::new()?;
//! let gamma = runtime.reduce_sum::<f32, GaussKernel>(
//!     &[0.5], &x, &y, &b, DimPair::new(3, 1), &TileConfig::default())?;
//! ```

use anyhow::Result;
use cubecl::client::ComputeClient;
use cubecl::cuda::{CudaDevice, CudaRuntime};
use cubecl::prelude::*;
use num_traits::Float as HostFloat;

use crate::formula::PairFormula;
use crate::launch::evaluate;
use crate::reduction::{log_sum_exp, ReductionKind};
use crate::tiled::{DimPair, TileConfig};

/// Type alias for the CUDA compute client.
pub type CudaClient =
    ComputeClient<<CudaRuntime as Runtime>::Server, <CudaRuntime as Runtime>::Channel>;

/// GPU runtime for tiled reductions.
///
/// Manages CUDA device initialization; every evaluation borrows the
/// client and owns its device buffers only for the duration of the call.
pub struct GpuRuntime {
    /// CUDA device (kept alive for runtime lifetime)
    #[allow(dead_code)]
    device: CudaDevice,
    /// Compute client for kernel execution
    client: CudaClient,
}

impl GpuRuntime {
    /// Create a new GPU runtime with the default CUDA device.
    pub fn new() -> Result<Self> {
        Self::with_device_id(0)
    }

    /// Create a new GPU runtime with a specific CUDA device.
    pub fn with_device_id(device_id: usize) -> Result<Self> {
        let device = CudaDevice::new(device_id);
        let client = CudaRuntime::client(&device);

        Ok(Self { device, client })
    }

    /// Get the underlying compute client.
    pub fn client(&self) -> &CudaClient {
        &self.client
    }

    /// Compute `γ_i = Σ_j f(x_i, y_j)·b_j` for every row of `x`.
    ///
    /// Returns `Nx` rows of DIMVECT scalars.
    pub fn reduce_sum<F: Float + CubeElement, Fm: PairFormula<F>>(
        &self,
        params: &[F],
        x: &[F],
        y: &[F],
        b: &[F],
        dims: DimPair,
        config: &TileConfig,
    ) -> Result<Vec<F>> {
        self.reduce::<F, Fm>(ReductionKind::Sum, params, x, y, b, dims, config)
    }

    /// Compute the stable pair `(m_i, s_i)` for every row of `x`.
    ///
    /// Returns `Nx` rows of `1 + DIMVECT` scalars with the running
    /// maximum first; flattening to log-sum-exp or softmax is the
    /// caller's job.
    pub fn reduce_max_shift_exp<F: Float + CubeElement, Fm: PairFormula<F>>(
        &self,
        params: &[F],
        x: &[F],
        y: &[F],
        b: &[F],
        dims: DimPair,
        config: &TileConfig,
    ) -> Result<Vec<F>> {
        self.reduce::<F, Fm>(ReductionKind::MaxShiftExp, params, x, y, b, dims, config)
    }

    /// Evaluate any reduction family into a freshly allocated output.
    pub fn reduce<F: Float + CubeElement, Fm: PairFormula<F>>(
        &self,
        kind: ReductionKind,
        params: &[F],
        x: &[F],
        y: &[F],
        b: &[F],
        dims: DimPair,
        config: &TileConfig,
    ) -> Result<Vec<F>> {
        let dim_point = dims.point as usize;
        if dim_point == 0 || x.len() % dim_point != 0 {
            // Let the launch validation produce the canonical error.
            let mut out = Vec::new();
            evaluate::<F, Fm>(self, kind, params, x, y, b, &mut out, dims, config)?;
            return Ok(out);
        }
        let nx = x.len() / dim_point;
        let mut out = vec![F::new(0.0); nx * kind.dim_out(dims.vect) as usize];
        evaluate::<F, Fm>(self, kind, params, x, y, b, &mut out, dims, config)?;
        Ok(out)
    }

    /// Compute `log Σ_j exp f(x_i, y_j)` per row through the stable pair.
    ///
    /// Stays finite even when `max_j f_ij` exceeds the working
    /// precision's `log(MAX)`; rows with no samples come back `−∞`.
    pub fn log_sum_exp<F, Fm>(
        &self,
        params: &[F],
        x: &[F],
        y: &[F],
        dim_point: u32,
        config: &TileConfig,
    ) -> Result<Vec<F>>
    where
        F: Float + CubeElement + HostFloat,
        Fm: PairFormula<F>,
    {
        let ny = if dim_point == 0 {
            0
        } else {
            y.len() / dim_point as usize
        };
        let ones = vec![F::new(1.0); ny];
        let pairs = self.reduce::<F, Fm>(
            ReductionKind::MaxShiftExp,
            params,
            x,
            y,
            &ones,
            DimPair::new(dim_point, 1),
            config,
        )?;
        Ok(pairs.chunks(2).map(log_sum_exp).collect())
    }
}

/// Check if CUDA is available on this system.
pub fn is_cuda_available() -> bool {
    // Try to create a device - if it fails, CUDA is not available
    std::panic::catch_unwind(|| {
        let _device = CudaDevice::new(0);
    })
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuda_availability() {
        // This test just checks if we can query CUDA availability
        let available = is_cuda_available();
        println!("CUDA available: {available}");
    }
}
