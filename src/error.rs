//! Provides [`ControlsError`], the error type returned by controller commands.

use thiserror::Error;

/// Everything that can go wrong when commanding an
/// [`OrbitControls`](crate::prelude::OrbitControls).
///
/// None of these are fatal. When a command returns an error, the controller state is exactly as it
/// was before the call.
#[derive(Debug, Error)]
pub enum ControlsError {
    /// The operation needs a perspective lens, but the camera is orthographic.
    #[error("`{operation}` is not available for an orthographic camera")]
    UnsupportedOperation {
        /// Name of the rejected command.
        operation: &'static str,
    },
    /// A serialized state could not be parsed.
    #[error("malformed controller state: {0}")]
    MalformedState(#[from] serde_json::Error),
    /// A lower bound is greater than its upper bound, or one of them is NaN.
    #[error("invalid {bound} bounds: min {min} > max {max}")]
    InvalidBounds {
        /// Which pair of limits is inconsistent.
        bound: &'static str,
        /// The lower limit.
        min: f64,
        /// The upper limit.
        max: f64,
    },
    /// A command argument was NaN or infinite.
    #[error("{what} must be finite")]
    NonFinite {
        /// Which argument was rejected.
        what: &'static str,
    },
    /// A tuning value such as a damping factor or speed was zero or negative.
    #[error("{what} must be positive, got {value}")]
    NonPositive {
        /// Which value was rejected.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The camera's view basis could not be built, e.g. it looks straight along its up axis.
    #[error("camera view basis is degenerate")]
    DegenerateBasis,
}

impl ControlsError {
    /// Reject a NaN or infinite argument.
    pub(crate) fn check_finite(what: &'static str, value: f64) -> Result<(), Self> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Self::NonFinite { what })
        }
    }

    /// Reject a tuning value that is not a finite number above zero.
    pub(crate) fn check_positive(what: &'static str, value: f64) -> Result<(), Self> {
        Self::check_finite(what, value)?;
        if value > 0.0 {
            Ok(())
        } else {
            Err(Self::NonPositive { what, value })
        }
    }

    /// Same as [`ControlsError::check_finite`], for vectors.
    pub(crate) fn check_finite_vec(
        what: &'static str,
        value: bevy_math::DVec3,
    ) -> Result<(), Self> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Self::NonFinite { what })
        }
    }
}
