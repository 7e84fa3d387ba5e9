//! Block-tiled map-reduce over point clouds.
//!
//! The Nx×Ny interaction matrix is never materialized: x_i stays in
//! per-thread registers while interleaved `(y_j, b_j)` records stream
//! through shared memory one tile of B records at a time. Two launch
//! schemes cover the parallelism range:
//!
//! - 1D ([`gpu_1d`]): one thread per output row; each thread serializes
//!   the whole j loop. The workhorse when Nx is large.
//! - 2D ([`gpu_2d`]): an (i-tile, j-tile) grid producing partial
//!   accumulators, merged per row by a second kernel with the
//!   descriptor's combine. Recovers parallelism when Nx alone cannot
//!   fill the device.
//!
//! [`cpu`] holds the double-precision reference the tests compare
//! against.

pub mod cpu;
pub mod gpu_1d;
pub mod gpu_2d;

use crate::error::EvalError;

/// Dimension pairs the dispatch enumerates. Anything else is rejected
/// with [`EvalError::UnsupportedDims`] before any device work.
pub const SUPPORTED_DIM_PAIRS: &[(u32, u32)] =
    &[(1, 1), (2, 1), (2, 2), (3, 1), (3, 2), (3, 3)];

/// Default threads per block; also the tile width.
pub const DEFAULT_BLOCK_SIZE: u32 = 256;

/// Smallest and largest accepted block sizes.
pub const MIN_BLOCK_SIZE: u32 = 32;
pub const MAX_BLOCK_SIZE: u32 = 1024;

/// Below this many output rows the 1D scheme cannot fill the device and
/// `Auto` switches to the 2D scheme, provided Ny spans several tiles.
const AUTO_2D_MAX_ROWS: u32 = 4096;
const AUTO_2D_MIN_TILES: u32 = 4;

/// Compile-time point/payload widths of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimPair {
    /// DIMPOINT: scalars per point of X and Y.
    pub point: u32,
    /// DIMVECT: scalars per payload row of B.
    pub vect: u32,
}

impl DimPair {
    pub fn new(point: u32, vect: u32) -> Self {
        Self { point, vect }
    }

    /// Whether this pair is in the enumerated set.
    pub fn is_supported(self) -> bool {
        SUPPORTED_DIM_PAIRS.contains(&(self.point, self.vect))
    }
}

/// Launch scheme selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// Pick per call from the problem shape.
    #[default]
    Auto,
    /// One thread per output row.
    OneD,
    /// Partial accumulators per (i-tile, j-tile), merged in a second pass.
    TwoD,
}

/// Per-call tile configuration.
#[derive(Debug, Clone, Copy)]
pub struct TileConfig {
    /// Threads per block; a multiple of the 32-thread warp in
    /// `[MIN_BLOCK_SIZE, MAX_BLOCK_SIZE]`. Neither scheme does a tree
    /// reduction, so no power-of-two restriction applies and the
    /// occupancy sweet spots 192 and 256 are both admissible.
    pub block_size: u32,
    pub scheme: Scheme,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            scheme: Scheme::Auto,
        }
    }
}

impl TileConfig {
    pub fn with_block_size(block_size: u32) -> Self {
        Self {
            block_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EvalError> {
        let b = self.block_size;
        if b % 32 != 0 || !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&b) {
            return Err(EvalError::InvalidConfig(format!(
                "block size {b} must be a multiple of 32 in [{MIN_BLOCK_SIZE}, {MAX_BLOCK_SIZE}]"
            )));
        }
        Ok(())
    }

    /// Resolve `Auto` against the problem shape.
    pub fn resolve_scheme(&self, nx: u32, ny: u32) -> Scheme {
        match self.scheme {
            Scheme::OneD => Scheme::OneD,
            Scheme::TwoD => Scheme::TwoD,
            Scheme::Auto => {
                if nx < AUTO_2D_MAX_ROWS && ny >= AUTO_2D_MIN_TILES * self.block_size {
                    Scheme::TwoD
                } else {
                    Scheme::OneD
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandatory_pairs_are_supported() {
        for (p, v) in [(1, 1), (2, 1), (2, 2), (3, 1), (3, 3)] {
            assert!(DimPair::new(p, v).is_supported(), "({p}, {v})");
        }
    }

    #[test]
    fn test_unsupported_pair_is_rejected() {
        assert!(!DimPair::new(4, 5).is_supported());
        assert!(!DimPair::new(0, 1).is_supported());
    }

    #[test]
    fn test_block_size_validation() {
        assert!(TileConfig::default().validate().is_ok());
        assert!(TileConfig::with_block_size(64).validate().is_ok());
        assert!(TileConfig::with_block_size(192).validate().is_ok());
        assert!(TileConfig::with_block_size(48).validate().is_err());
        assert!(TileConfig::with_block_size(16).validate().is_err());
        assert!(TileConfig::with_block_size(2048).validate().is_err());
    }

    #[test]
    fn test_auto_scheme_resolution() {
        let config = TileConfig::default();
        // Large Nx fills the device on its own.
        assert_eq!(config.resolve_scheme(1_000_000, 1_000_000), Scheme::OneD);
        // Few rows over many tiles benefit from distributing the j loop.
        assert_eq!(config.resolve_scheme(100, 100_000), Scheme::TwoD);
        // Few rows but barely any tiles: the merge pass is not worth it.
        assert_eq!(config.resolve_scheme(100, 100), Scheme::OneD);
    }

    #[test]
    fn test_forced_scheme_wins() {
        let config = TileConfig {
            scheme: Scheme::TwoD,
            ..TileConfig::default()
        };
        assert_eq!(config.resolve_scheme(1_000_000, 32), Scheme::TwoD);
    }
}
