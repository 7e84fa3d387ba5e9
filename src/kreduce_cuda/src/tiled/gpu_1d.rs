//! 1D tile-loop kernel: one thread per output row.
//!
//! Each block of `block` threads walks the whole j range tile by tile.
//! A tile is `block` interleaved `[y_j | b_j]` records staged in shared
//! memory, so every y element is fetched from global memory exactly once
//! per block. The shared region is a flat scalar array addressed by the
//! record stride `dim_point + dim_vect`; a typed record layout would
//! break load coalescing.
//!
//! Threads whose row index falls past Nx still participate in the
//! cooperative loads and both barriers of every tile.

use cubecl::prelude::*;

use crate::formula::PairFormula;
use crate::reduction::Reducer;

/// Tiled reduction over all of Y, one output row per thread.
///
/// # Inputs
/// - `params`: [P] broadcast formula parameters
/// - `x`: [Nx * dim_point] query points, row-major
/// - `y`: [Ny * dim_point] source points, row-major
/// - `b`: [Ny * dim_vect] payload rows, row-major
/// - `nx`, `ny`: row counts
///
/// # Outputs
/// - `out`: [Nx * dim_red] finalized accumulator rows
///
/// # Comptime
/// - `dim_point`, `dim_vect`: record geometry
/// - `dim_red`: accumulator width declared by the reduction
/// - `block`: threads per block, also the tile width
/// - `kahan`: select the compensated combine
#[cube(launch_unchecked)]
pub fn tile_reduce_1d_kernel<F: Float, Fm: PairFormula<F>, Rd: Reducer<F>>(
    params: &Array<F>,
    x: &Array<F>,
    y: &Array<F>,
    b: &Array<F>,
    out: &mut Array<F>,
    nx: u32,
    ny: u32,
    #[comptime] dim_point: u32,
    #[comptime] dim_vect: u32,
    #[comptime] dim_red: u32,
    #[comptime] block: u32,
    #[comptime] kahan: bool,
) {
    let record = comptime!(dim_point + dim_vect);
    let tid = UNIT_POS_X;
    let i = CUBE_POS_X * CUBE_DIM_X + tid;

    let mut tile = SharedMemory::<F>::new(comptime!(block * (dim_point + dim_vect)));

    let mut xi = Array::<F>::new(dim_point);
    let mut acc = Array::<F>::new(dim_red);
    let mut comp = Array::<F>::new(dim_vect);

    if i < nx {
        #[unroll]
        for d in 0..dim_point {
            xi[d] = x[i * dim_point + d];
        }
        Rd::init(&mut acc, dim_vect);
        if kahan {
            #[unroll]
            for k in 0..dim_vect {
                comp[k] = F::new(0.0);
            }
        }
    }

    let mut jstart = 0u32;
    while jstart < ny {
        // Cooperative load: thread `tid` stages record `jstart + tid`.
        let j = jstart + tid;
        if j < ny {
            let dst = tid * record;
            #[unroll]
            for d in 0..dim_point {
                tile[dst + d] = y[j * dim_point + d];
            }
            #[unroll]
            for d in 0..dim_vect {
                tile[dst + dim_point + d] = b[j * dim_vect + d];
            }
        }
        sync_cube();

        if i < nx {
            let mut jmax = block.runtime();
            if ny - jstart < jmax {
                jmax = ny - jstart;
            }
            for jrel in 0..jmax {
                let base = jrel * record;
                let fij = Fm::eval(params, &xi, &tile, base, dim_point);
                if kahan {
                    Rd::fold_kahan(&mut acc, &mut comp, fij, &tile, base + dim_point, dim_vect);
                } else {
                    Rd::fold(&mut acc, fij, &tile, base + dim_point, dim_vect);
                }
            }
        }
        // The next tile's load must not overwrite records still in use.
        sync_cube();

        jstart += block.runtime();
    }

    if i < nx {
        Rd::write(&acc, out, i * dim_red, dim_vect);
    }
}
