//! 2D tile-loop kernels: partial accumulators per (i-tile, j-tile).
//!
//! When Nx alone cannot fill the device, the inner j loop is distributed
//! across a second grid dimension: the block at (i-tile, j-tile) streams
//! exactly one tile of `(y_j, b_j)` records and writes one partial
//! accumulator per row. A second kernel then merges the `ceil(Ny/B)`
//! partials of each row in tile order with the descriptor's own combine
//! rather than a bespoke inter-block accumulator, so the result agrees
//! with the 1D scheme up to floating-point reassociation.
//!
//! Partial buffer layout: `[num_j_tiles][Nx][dim_red]`, tile-major so
//! that pass one writes coalesced rows.

use cubecl::prelude::*;

use crate::formula::PairFormula;
use crate::reduction::Reducer;

/// Pass one: each (i-tile, j-tile) block reduces its single tile.
///
/// # Inputs
/// - `params`, `x`, `y`, `b`, `nx`, `ny`: as the 1D kernel
///
/// # Outputs
/// - `partials`: [ceil(ny/block) * nx * dim_red] per-tile accumulators
#[cube(launch_unchecked)]
pub fn tile_reduce_2d_partial_kernel<F: Float, Fm: PairFormula<F>, Rd: Reducer<F>>(
    params: &Array<F>,
    x: &Array<F>,
    y: &Array<F>,
    b: &Array<F>,
    partials: &mut Array<F>,
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
    let jtile = CUBE_POS_Y;
    let jstart = jtile * block.runtime();

    let mut tile = SharedMemory::<F>::new(comptime!(block * (dim_point + dim_vect)));

    let mut xi = Array::<F>::new(dim_point);
    let mut acc = Array::<F>::new(dim_red);
    let mut comp = Array::<F>::new(dim_vect);

    // Cooperative load of this block's one tile.
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

        Rd::write(&acc, partials, (jtile * nx + i) * dim_red, dim_vect);
    }
}

/// Pass two: one thread per row merges its partials in tile order.
///
/// # Inputs
/// - `partials`: [num_tiles * nx * dim_red] from pass one
/// - `nx`, `num_tiles`
///
/// # Outputs
/// - `out`: [nx * dim_red] finalized accumulator rows
#[cube(launch_unchecked)]
pub fn tile_reduce_2d_merge_kernel<F: Float, Rd: Reducer<F>>(
    partials: &Array<F>,
    out: &mut Array<F>,
    nx: u32,
    num_tiles: u32,
    #[comptime] dim_vect: u32,
    #[comptime] dim_red: u32,
) {
    let i = ABSOLUTE_POS;

    if i >= nx {
        terminate!();
    }

    let mut acc = Array::<F>::new(dim_red);
    Rd::init(&mut acc, dim_vect);

    for t in 0..num_tiles {
        Rd::merge(&mut acc, partials, (t * nx + i) * dim_red, dim_vect);
    }

    Rd::write(&acc, out, i * dim_red, dim_vect);
}

#[cfg(test)]
mod tests {
    // Agreement between the 1D and 2D schemes is covered by the ignored
    // GPU tests in the launch module.

    #[test]
    fn test_kernels_compile() {}
}
