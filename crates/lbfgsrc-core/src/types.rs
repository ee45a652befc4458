//! Type definitions and aliases for limited-memory quasi-Newton minimization.
//!
//! This module provides the scalar trait shared by every component of the
//! minimizer together with the dense vector alias used for parameter,
//! gradient, preconditioner and correction vectors.

use nalgebra::{Dyn, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in optimization (f32 or f64).
///
/// This trait combines all the necessary numeric traits required by the
/// line search and the L-BFGS recursion.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Default relative tolerance on the gradient norm, `||g|| / max(1, ||x||)`.
    const DEFAULT_GRADIENT_TOLERANCE: Self;

    /// Default estimate of the machine precision used as the line search `xtol`.
    const DEFAULT_XTOL: Self;

    /// Default lower bound for a line search step.
    const MIN_STEP_SIZE: Self;

    /// Default upper bound for a line search step.
    const MAX_STEP_SIZE: Self;

    /// Convert from f64 (for constants).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_from_f64` for a non-panicking version.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Try to convert from f64.
    ///
    /// Returns None if the conversion fails.
    fn try_from_f64(v: f64) -> Option<Self> {
        <Self as FromPrimitive>::from_f64(v)
    }

    /// Convert to f64 (for logging/display).
    ///
    /// Values that cannot be represented come back as NaN.
    fn to_f64(self) -> f64 {
        num_traits::cast(self).unwrap_or(f64::NAN)
    }
}

impl Scalar for f32 {
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-5;
    const DEFAULT_XTOL: Self = f32::EPSILON;
    const MIN_STEP_SIZE: Self = 1e-20;
    const MAX_STEP_SIZE: Self = 1e20;
}

impl Scalar for f64 {
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-5;
    const DEFAULT_XTOL: Self = 1e-16;
    const MIN_STEP_SIZE: Self = 1e-20;
    const MAX_STEP_SIZE: Self = 1e20;
}

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;
