//! Safeguarded line search for quasi-Newton minimization.
//!
//! This module implements the Moré–Thuente line search used by the L-BFGS
//! minimizer. Given a base point x, its objective value f(x), its gradient
//! g(x) and a search direction d, it looks for a step α > 0 such that
//!
//! ## Sufficient Decrease (Armijo)
//! f(x + α d) ≤ f(x) + ftol · α · ⟨g(x), d⟩
//!
//! ## Curvature (strong Wolfe)
//! |⟨g(x + α d), d⟩| ≤ gtol · |⟨g(x), d⟩|
//!
//! If `ftol < gtol` and f is bounded below along d, such a step exists.
//!
//! # Algorithm
//!
//! The search maintains an interval of uncertainty with endpoints `best`
//! (least function value so far) and `other`. Each trial is consumed by
//! [`safeguarded_step`], which updates the interval and predicts the next
//! trial with cubic or quadratic interpolation. Until a step is found for
//! which the shifted function ψ(α) = f(x + α d) − f(x) − ftol · α · ⟨g(x), d⟩
//! has a non-positive value and a non-negative derivative, interpolation uses
//! ψ instead of f (the "first stage").
//!
//! # Reverse Communication
//!
//! [`MoreThuente`] never evaluates the objective. [`MoreThuente::start`]
//! writes the first trial point into `x` and returns
//! [`LineSearchStatus::NeedEvaluation`]; the caller evaluates f and g at `x`
//! and hands them back through [`MoreThuente::resume`], until a terminal
//! status is returned.
//!
//! # References
//!
//! - Moré & Thuente, "Line search algorithms with guaranteed sufficient
//!   decrease", ACM TOMS 20 (1994)
//! - Liu & Nocedal, "On the limited memory BFGS method for large scale
//!   optimization", Mathematical Programming B 45 (1989)

mod more_thuente;
mod step;

pub use more_thuente::MoreThuente;
pub use step::{safeguarded_step, Endpoint, StepCase, StepUpdate};

use crate::types::Scalar;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerances and bounds controlling the line search.
///
/// # Parameter Guidelines
///
/// - **ftol**: sufficient decrease tolerance, typically 10⁻⁴
/// - **gtol**: curvature tolerance; 0.9 suits quasi-Newton directions.
///   Smaller values (e.g. 0.1) give more accurate steps at the price of
///   more evaluations.
/// - **xtol**: the search stops when the relative width of the interval of
///   uncertainty is at most `xtol`; an estimate of the machine precision
/// - **stpmin / stpmax**: absolute bounds for the step. The defaults only need
///   changing for extremely badly scaled problems.
/// - **max_evaluations**: function evaluations allowed per search
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineSearchParams<T>
where
    T: Scalar,
{
    /// Sufficient decrease tolerance
    pub ftol: T,
    /// Curvature tolerance
    pub gtol: T,
    /// Relative interval width at which the search gives up
    pub xtol: T,
    /// Lower bound for the step
    pub stpmin: T,
    /// Upper bound for the step
    pub stpmax: T,
    /// Maximum number of function evaluations per search
    pub max_evaluations: usize,
}

impl<T> Default for LineSearchParams<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            ftol: <T as Scalar>::from_f64(1e-4),
            gtol: <T as Scalar>::from_f64(0.9),
            xtol: T::DEFAULT_XTOL,
            stpmin: T::MIN_STEP_SIZE,
            stpmax: T::MAX_STEP_SIZE,
            max_evaluations: 20,
        }
    }
}

impl<T> LineSearchParams<T>
where
    T: Scalar,
{
    /// Creates parameters with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sufficient decrease tolerance.
    pub fn with_ftol(mut self, ftol: T) -> Self {
        self.ftol = ftol;
        self
    }

    /// Sets the curvature tolerance.
    pub fn with_gtol(mut self, gtol: T) -> Self {
        self.gtol = gtol;
        self
    }

    /// Sets the relative interval width tolerance.
    pub fn with_xtol(mut self, xtol: T) -> Self {
        self.xtol = xtol;
        self
    }

    /// Sets the step bounds.
    pub fn with_step_bounds(mut self, stpmin: T, stpmax: T) -> Self {
        self.stpmin = stpmin;
        self.stpmax = stpmax;
        self
    }

    /// Sets the evaluation budget per search.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    /// Whether the search will accept these parameters.
    ///
    /// All tolerances must be non-negative, `stpmax ≥ stpmin ≥ 0` and at
    /// least one evaluation must be allowed. The same test is applied by
    /// [`MoreThuente::start`], which answers
    /// [`LineSearchStatus::ImproperInput`] when it fails.
    pub fn is_valid(&self) -> bool {
        let zero = T::zero();
        self.ftol >= zero
            && self.gtol >= zero
            && self.xtol >= zero
            && self.stpmin >= zero
            && self.stpmax >= self.stpmin
            && self.max_evaluations > 0
    }
}

/// Outcome of a line search call.
///
/// The numeric codes returned by [`LineSearchStatus::code`] follow the
/// MINPACK `info` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LineSearchStatus {
    /// The caller must evaluate f and g at the trial point and resume
    NeedEvaluation,
    /// Improper input parameters; no search was performed
    ImproperInput,
    /// Sufficient decrease and curvature conditions both hold
    Converged,
    /// Relative width of the interval of uncertainty is at most `xtol`
    IntervalTooSmall,
    /// The evaluation budget was exhausted
    MaxEvaluations,
    /// The step is at `stpmin` and the conditions do not hold
    AtMinStep,
    /// The step is at `stpmax` and the conditions do not hold
    AtMaxStep,
    /// Rounding errors prevent further progress
    RoundingErrors,
    /// The direction is not a descent direction; no search was performed
    NotDescentDirection,
}

impl LineSearchStatus {
    /// Numeric status code.
    pub fn code(self) -> i32 {
        match self {
            Self::NeedEvaluation => -1,
            Self::ImproperInput => 0,
            Self::Converged => 1,
            Self::IntervalTooSmall => 2,
            Self::MaxEvaluations => 3,
            Self::AtMinStep => 4,
            Self::AtMaxStep => 5,
            Self::RoundingErrors => 6,
            Self::NotDescentDirection => 7,
        }
    }

    /// True once the search has stopped, successfully or not.
    pub fn is_terminal(self) -> bool {
        self != Self::NeedEvaluation
    }

    /// True for a step satisfying both Wolfe conditions.
    pub fn is_success(self) -> bool {
        self == Self::Converged
    }
}

impl fmt::Display for LineSearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NeedEvaluation => "function and gradient evaluation requested",
            Self::ImproperInput => "improper input parameters",
            Self::Converged => "sufficient decrease and curvature conditions hold",
            Self::IntervalTooSmall => {
                "relative width of the interval of uncertainty is at most xtol"
            }
            Self::MaxEvaluations => "maximum number of function evaluations reached",
            Self::AtMinStep => "the step is too small",
            Self::AtMaxStep => "the step is too large",
            Self::RoundingErrors => "rounding errors prevent further progress",
            Self::NotDescentDirection => "the search direction is not a descent direction",
        };
        f.write_str(text)
    }
}
