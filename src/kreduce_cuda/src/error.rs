//! Error surface for reduction evaluation.
//!
//! Every failure is surfaced as a single [`EvalError`] value; the raw
//! entry point flattens it to the negative integer status codes expected
//! by foreign bindings (see [`EvalError::status_code`]).

use thiserror::Error;

/// Errors from reduction evaluation.
#[derive(Error, Debug)]
pub enum EvalError {
    /// A host array length is inconsistent with the declared dimensions.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// The (DIMPOINT, DIMVECT) pair is not in the supported set.
    #[error("unsupported dimension pair (DIMPOINT={point}, DIMVECT={vect})")]
    UnsupportedDims { point: u32, vect: u32 },

    /// The tile configuration is malformed (block size not a power of two, out of range).
    #[error("invalid tile configuration: {0}")]
    InvalidConfig(String),

    /// Device buffer allocation failed.
    #[error("device allocation failed: {0}")]
    Allocation(String),

    /// A host-device or device-host copy failed.
    #[error("device copy failed: {0}")]
    Copy(String),

    /// Kernel launch failed or faulted on the device.
    #[error("kernel launch failed: {0}")]
    Launch(String),

    /// Device synchronization reported an in-kernel fault.
    #[error("device synchronization failed: {0}")]
    Sync(String),
}

impl EvalError {
    /// Flatten to the integer status of the raw boundary.
    ///
    /// `0` is reserved for success. `-1` means the dimension pair is not
    /// enumerated; the remaining codes distinguish validation and device
    /// failures without widening the boundary into a structured error.
    pub fn status_code(&self) -> i32 {
        match self {
            EvalError::UnsupportedDims { .. } => -1,
            EvalError::InvalidShape(_) => -2,
            EvalError::InvalidConfig(_) => -3,
            EvalError::Allocation(_) => -4,
            EvalError::Copy(_) => -5,
            EvalError::Launch(_) => -6,
            EvalError::Sync(_) => -7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_distinct_and_negative() {
        let errors = [
            EvalError::UnsupportedDims { point: 4, vect: 5 },
            EvalError::InvalidShape("x".into()),
            EvalError::InvalidConfig("block".into()),
            EvalError::Allocation("oom".into()),
            EvalError::Copy("h2d".into()),
            EvalError::Launch("grid".into()),
            EvalError::Sync("fault".into()),
        ];

        let codes: Vec<i32> = errors.iter().map(|e| e.status_code()).collect();
        for (i, &a) in codes.iter().enumerate() {
            assert!(a < 0, "status code {a} must be negative");
            for &b in &codes[i + 1..] {
                assert_ne!(a, b, "status codes must be distinguishable");
            }
        }
    }

    #[test]
    fn test_unsupported_dims_is_minus_one() {
        let err = EvalError::UnsupportedDims { point: 4, vect: 5 };
        assert_eq!(err.status_code(), -1);
    }
}
