//! Timing instrumentation for the launch wrapper.
//!
//! With the `profiling` feature enabled, [`Timer`] measures wall-clock
//! milliseconds; without it, every timer compiles to a no-op and the
//! recorded breakdown stays zero.

use serde::{Deserialize, Serialize};
#[cfg(feature = "profiling")]
use std::time::Instant;

/// Timing breakdown for a single reduction evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalTiming {
    /// Host→device uploads and output allocation
    pub upload_ms: f64,
    /// Kernel launches (1D, or 2D partial + merge)
    pub kernel_ms: f64,
    /// Blocking device→host read of the output
    pub download_ms: f64,
    /// Whole call
    pub total_ms: f64,
}

/// Timer that can be disabled at compile time.
#[cfg(feature = "profiling")]
pub struct Timer {
    start: Instant,
    #[allow(dead_code)]
    name: &'static str,
}

#[cfg(feature = "profiling")]
impl Timer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// No-op timer used when the `profiling` feature is disabled.
#[cfg(not(feature = "profiling"))]
pub struct Timer;

#[cfg(not(feature = "profiling"))]
impl Timer {
    #[inline]
    pub fn new(_name: &'static str) -> Self {
        Self
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing_is_zero() {
        let timing = EvalTiming::default();
        assert_eq!(timing.total_ms, 0.0);
        assert_eq!(timing.kernel_ms, 0.0);
    }

    #[test]
    fn test_timer_is_monotonic() {
        let timer = Timer::new("test");
        let a = timer.elapsed_ms();
        let b = timer.elapsed_ms();
        assert!(b >= a);
    }
}
