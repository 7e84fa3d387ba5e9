//! Radial kernel functions of the squared distance.
//!
//! All four take a single parameter `p[0]`, the inverse squared
//! bandwidth, and are monotone decreasing in `‖x−y‖²`:
//!
//! - [`GaussKernel`]: `exp(−p₀·r²)`
//! - [`LaplaceKernel`]: `exp(−sqrt(p₀·r²))`
//! - [`CauchyKernel`]: `1 / (1 + p₀·r²)`
//! - [`InvMultiquadricKernel`]: `1 / sqrt(1 + p₀·r²)`

use cubecl::prelude::*;

use super::{squared_distance, squared_distance_cpu, HostFormula, PairFormula};

/// Gaussian (RBF) kernel `exp(−p₀·‖x−y‖²)`.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct GaussKernel;

#[cube]
impl<F: Float> PairFormula<F> for GaussKernel {
    fn eval(
        params: &Array<F>,
        xi: &Array<F>,
        tile: &SharedMemory<F>,
        y_base: u32,
        #[comptime] dim_point: u32,
    ) -> F {
        let r2 = squared_distance::<F>(xi, tile, y_base, dim_point);
        F::exp(F::new(0.0) - params[0] * r2)
    }
}

impl HostFormula for GaussKernel {
    fn eval(params: &[f64], x: &[f64], y: &[f64]) -> f64 {
        (-params[0] * squared_distance_cpu(x, y)).exp()
    }
}

/// Laplace (exponential) kernel `exp(−sqrt(p₀·‖x−y‖²))`.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct LaplaceKernel;

#[cube]
impl<F: Float> PairFormula<F> for LaplaceKernel {
    fn eval(
        params: &Array<F>,
        xi: &Array<F>,
        tile: &SharedMemory<F>,
        y_base: u32,
        #[comptime] dim_point: u32,
    ) -> F {
        let r2 = squared_distance::<F>(xi, tile, y_base, dim_point);
        F::exp(F::new(0.0) - F::sqrt(params[0] * r2))
    }
}

impl HostFormula for LaplaceKernel {
    fn eval(params: &[f64], x: &[f64], y: &[f64]) -> f64 {
        (-(params[0] * squared_distance_cpu(x, y)).sqrt()).exp()
    }
}

/// Cauchy kernel `1 / (1 + p₀·‖x−y‖²)`.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct CauchyKernel;

#[cube]
impl<F: Float> PairFormula<F> for CauchyKernel {
    fn eval(
        params: &Array<F>,
        xi: &Array<F>,
        tile: &SharedMemory<F>,
        y_base: u32,
        #[comptime] dim_point: u32,
    ) -> F {
        let r2 = squared_distance::<F>(xi, tile, y_base, dim_point);
        F::new(1.0) / (F::new(1.0) + params[0] * r2)
    }
}

impl HostFormula for CauchyKernel {
    fn eval(params: &[f64], x: &[f64], y: &[f64]) -> f64 {
        1.0 / (1.0 + params[0] * squared_distance_cpu(x, y))
    }
}

/// Inverse multiquadric kernel `1 / sqrt(1 + p₀·‖x−y‖²)`.
#[derive(Debug, Clone, Copy, CubeType)]
pub struct InvMultiquadricKernel;

#[cube]
impl<F: Float> PairFormula<F> for InvMultiquadricKernel {
    fn eval(
        params: &Array<F>,
        xi: &Array<F>,
        tile: &SharedMemory<F>,
        y_base: u32,
        #[comptime] dim_point: u32,
    ) -> F {
        let r2 = squared_distance::<F>(xi, tile, y_base, dim_point);
        F::new(1.0) / F::sqrt(F::new(1.0) + params[0] * r2)
    }
}

impl HostFormula for InvMultiquadricKernel {
    fn eval(params: &[f64], x: &[f64], y: &[f64]) -> f64 {
        1.0 / (1.0 + params[0] * squared_distance_cpu(x, y)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: [f64; 1] = [0.5];

    #[test]
    fn test_all_radial_kernels_are_one_at_zero_distance() {
        let x = [1.0, 2.0, 3.0];
        assert_eq!(<GaussKernel as HostFormula>::eval(&P, &x, &x), 1.0);
        assert_eq!(<LaplaceKernel as HostFormula>::eval(&P, &x, &x), 1.0);
        assert_eq!(<CauchyKernel as HostFormula>::eval(&P, &x, &x), 1.0);
        assert_eq!(<InvMultiquadricKernel as HostFormula>::eval(&P, &x, &x), 1.0);
    }

    #[test]
    fn test_gauss_kernel_value() {
        // r² = 1, p₀ = 0.5 → exp(−1/2)
        let x = [0.0, 0.0, 0.0];
        let y = [1.0, 0.0, 0.0];
        let v = <GaussKernel as HostFormula>::eval(&P, &x, &y);
        assert!((v - (-0.5f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn test_radial_kernels_decrease_with_distance() {
        let x = [0.0];
        let near = [1.0];
        let far = [2.0];
        fn check<K: HostFormula>(x: &[f64], near: &[f64], far: &[f64]) {
            assert!(K::eval(&P, x, near) > K::eval(&P, x, far));
        }
        check::<GaussKernel>(&x, &near, &far);
        check::<LaplaceKernel>(&x, &near, &far);
        check::<CauchyKernel>(&x, &near, &far);
        check::<InvMultiquadricKernel>(&x, &near, &far);
    }
}
