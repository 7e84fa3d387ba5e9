//! Host-side launch wrapper.
//!
//! The single blocking entry point of the engine: validate shapes,
//! enumerate the (DIMPOINT, DIMVECT) pair, pick the scheme, upload,
//! launch, read back. Device buffers are owning CubeCL handles, so they
//! are released on every exit path, error paths included.
//!
//! Input buffers are uploaded with their full declared extent and never
//! zero-initialized first: a caller that writes only part of an input
//! sees the garbage instead of silent zeros.

use std::panic::{catch_unwind, AssertUnwindSafe};

use cubecl::cuda::CudaRuntime;
use cubecl::prelude::*;
use tracing::debug;

use crate::error::EvalError;
use crate::formula::PairFormula;
use crate::reduction::{MaxShiftExpReduction, ReduceShape, Reducer, ReductionKind, SumReduction};
use crate::runtime::GpuRuntime;
use crate::tiled::gpu_1d::tile_reduce_1d_kernel;
use crate::tiled::gpu_2d::{tile_reduce_2d_merge_kernel, tile_reduce_2d_partial_kernel};
use crate::tiled::{DimPair, Scheme, TileConfig};
use crate::timing::{EvalTiming, Timer};

/// Validate a request against the declared dimensions.
///
/// Returns (Nx, Ny) on success. Runs before any device work, so a
/// rejected call leaves nothing allocated.
pub fn validate_shapes(
    kind: ReductionKind,
    x_len: usize,
    y_len: usize,
    b_len: usize,
    out_len: usize,
    dims: DimPair,
    config: &TileConfig,
) -> Result<(usize, usize), EvalError> {
    if !dims.is_supported() {
        return Err(EvalError::UnsupportedDims {
            point: dims.point,
            vect: dims.vect,
        });
    }
    config.validate()?;

    let dim_point = dims.point as usize;
    let dim_vect = dims.vect as usize;

    if x_len % dim_point != 0 {
        return Err(EvalError::InvalidShape(format!(
            "x length {x_len} is not a multiple of DIMPOINT {dim_point}"
        )));
    }
    if y_len % dim_point != 0 {
        return Err(EvalError::InvalidShape(format!(
            "y length {y_len} is not a multiple of DIMPOINT {dim_point}"
        )));
    }
    let nx = x_len / dim_point;
    let ny = y_len / dim_point;

    if b_len != ny * dim_vect {
        return Err(EvalError::InvalidShape(format!(
            "payload length {b_len} does not match Ny·DIMVECT = {}",
            ny * dim_vect
        )));
    }
    let dim_out = kind.dim_out(dims.vect) as usize;
    if out_len != nx * dim_out {
        return Err(EvalError::InvalidShape(format!(
            "output length {out_len} does not match Nx·DIMOUT = {}",
            nx * dim_out
        )));
    }

    Ok((nx, ny))
}

/// Evaluate one reduction over the given host arrays.
///
/// Blocking: returns once `out` holds the `Nx × DIMOUT` result. The
/// formula is a type parameter, so each (formula, family, dimensions,
/// precision) tuple dispatches to its own kernel instantiation.
#[allow(clippy::too_many_arguments)]
pub fn evaluate<F: Float + CubeElement, Fm: PairFormula<F>>(
    runtime: &GpuRuntime,
    kind: ReductionKind,
    params: &[F],
    x: &[F],
    y: &[F],
    b: &[F],
    out: &mut [F],
    dims: DimPair,
    config: &TileConfig,
) -> Result<(), EvalError> {
    let (nx, ny) = validate_shapes(kind, x.len(), y.len(), b.len(), out.len(), dims, config)?;

    if nx == 0 {
        return Ok(());
    }
    if ny == 0 {
        fill_neutral(kind, out, dims.vect);
        return Ok(());
    }

    match kind {
        ReductionKind::Sum | ReductionKind::SumKahan => launch_tiled::<F, Fm, SumReduction>(
            runtime, kind, params, x, y, b, out, dims, config, nx, ny,
        ),
        ReductionKind::MaxShiftExp | ReductionKind::MaxShiftExpKahan => {
            launch_tiled::<F, Fm, MaxShiftExpReduction>(
                runtime, kind, params, x, y, b, out, dims, config, nx, ny,
            )
        }
    }
}

/// Raw integer-status boundary over [`evaluate`].
///
/// `0` success, `-1` unsupported dimension pair, other negatives per
/// [`EvalError::status_code`]. Panics from the device layer are caught
/// here and reported as a launch failure; nothing propagates out.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_status<F: Float + CubeElement, Fm: PairFormula<F>>(
    runtime: &GpuRuntime,
    kind: ReductionKind,
    params: &[F],
    x: &[F],
    y: &[F],
    b: &[F],
    out: &mut [F],
    dims: DimPair,
    config: &TileConfig,
) -> i32 {
    let result = catch_unwind(AssertUnwindSafe(|| {
        evaluate::<F, Fm>(runtime, kind, params, x, y, b, out, dims, config)
    }));
    match result {
        Ok(Ok(())) => 0,
        Ok(Err(err)) => err.status_code(),
        Err(_) => EvalError::Launch("device panic during evaluation".into()).status_code(),
    }
}

/// Write neutral rows for the Ny = 0 edge without touching the device.
fn fill_neutral<F: Float>(kind: ReductionKind, out: &mut [F], dim_vect: u32) {
    let dim_red = kind.dim_red(dim_vect) as usize;
    for row in out.chunks_mut(dim_red) {
        match kind {
            ReductionKind::Sum | ReductionKind::SumKahan => row.fill(F::new(0.0)),
            ReductionKind::MaxShiftExp | ReductionKind::MaxShiftExpKahan => {
                row[0] = F::new(f32::NEG_INFINITY);
                for v in row[1..].iter_mut() {
                    *v = F::new(0.0);
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn launch_tiled<F, Fm, Rd>(
    runtime: &GpuRuntime,
    kind: ReductionKind,
    params: &[F],
    x: &[F],
    y: &[F],
    b: &[F],
    out: &mut [F],
    dims: DimPair,
    config: &TileConfig,
    nx: usize,
    ny: usize,
) -> Result<(), EvalError>
where
    F: Float + CubeElement,
    Fm: PairFormula<F>,
    Rd: Reducer<F> + ReduceShape,
{
    let client = runtime.client();
    let block = config.block_size;
    let kahan = kind.is_kahan();
    let dim_red = Rd::dim_red(dims.vect);
    let nx_u = nx as u32;
    let ny_u = ny as u32;
    let scheme = config.resolve_scheme(nx_u, ny_u);

    let mut timing = EvalTiming::default();
    let t_total = Timer::new("evaluate");

    // Upload inputs. Device buffers cannot be zero-sized, so a
    // parameterless formula still gets a one-scalar buffer.
    let t_upload = Timer::new("upload");
    let params_one = [F::new(0.0)];
    let params_host: &[F] = if params.is_empty() { &params_one } else { params };
    let params_gpu = client.create(F::as_bytes(params_host));
    let x_gpu = client.create(F::as_bytes(x));
    let y_gpu = client.create(F::as_bytes(y));
    let b_gpu = client.create(F::as_bytes(b));
    let out_gpu = client.empty(out.len() * std::mem::size_of::<F>());
    timing.upload_ms = t_upload.elapsed_ms();

    let t_kernel = Timer::new("kernel");
    let cube_dim = CubeDim::new(block, 1, 1);
    let grid_x = nx_u.div_ceil(block);

    if scheme == Scheme::TwoD {
        let num_tiles = ny_u.div_ceil(block);
        let partials_gpu =
            client.empty(num_tiles as usize * nx * dim_red as usize * std::mem::size_of::<F>());

        unsafe {
            tile_reduce_2d_partial_kernel::launch_unchecked::<F, Fm, Rd, CudaRuntime>(
                client,
                CubeCount::Static(grid_x, num_tiles, 1),
                cube_dim,
                ArrayArg::from_raw_parts::<F>(&params_gpu, params_host.len(), 1),
                ArrayArg::from_raw_parts::<F>(&x_gpu, x.len(), 1),
                ArrayArg::from_raw_parts::<F>(&y_gpu, y.len(), 1),
                ArrayArg::from_raw_parts::<F>(&b_gpu, b.len(), 1),
                ArrayArg::from_raw_parts::<F>(
                    &partials_gpu,
                    num_tiles as usize * nx * dim_red as usize,
                    1,
                ),
                ScalarArg::new(nx_u),
                ScalarArg::new(ny_u),
                dims.point,
                dims.vect,
                dim_red,
                block,
                kahan,
            );

            tile_reduce_2d_merge_kernel::launch_unchecked::<F, Rd, CudaRuntime>(
                client,
                CubeCount::Static(grid_x, 1, 1),
                cube_dim,
                ArrayArg::from_raw_parts::<F>(
                    &partials_gpu,
                    num_tiles as usize * nx * dim_red as usize,
                    1,
                ),
                ArrayArg::from_raw_parts::<F>(&out_gpu, out.len(), 1),
                ScalarArg::new(nx_u),
                ScalarArg::new(num_tiles),
                dims.vect,
                dim_red,
            );
        }
    } else {
        unsafe {
            tile_reduce_1d_kernel::launch_unchecked::<F, Fm, Rd, CudaRuntime>(
                client,
                CubeCount::Static(grid_x, 1, 1),
                cube_dim,
                ArrayArg::from_raw_parts::<F>(&params_gpu, params_host.len(), 1),
                ArrayArg::from_raw_parts::<F>(&x_gpu, x.len(), 1),
                ArrayArg::from_raw_parts::<F>(&y_gpu, y.len(), 1),
                ArrayArg::from_raw_parts::<F>(&b_gpu, b.len(), 1),
                ArrayArg::from_raw_parts::<F>(&out_gpu, out.len(), 1),
                ScalarArg::new(nx_u),
                ScalarArg::new(ny_u),
                dims.point,
                dims.vect,
                dim_red,
                block,
                kahan,
            );
        }
    }
    timing.kernel_ms = t_kernel.elapsed_ms();

    // Blocking read; the device queue drains here.
    let t_download = Timer::new("download");
    let out_bytes = client.read_one(out_gpu);
    out.copy_from_slice(F::from_bytes(&out_bytes));
    timing.download_ms = t_download.elapsed_ms();

    timing.total_ms = t_total.elapsed_ms();
    debug!(?kind, ?scheme, nx, ny, block, ?timing, "reduction evaluated");

    Ok(())
}
