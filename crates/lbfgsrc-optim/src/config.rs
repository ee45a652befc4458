//! Configuration of the L-BFGS minimizer.

use lbfgsrc_core::{line_search::LineSearchParams, types::Scalar};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the L-BFGS minimizer.
///
/// Building a configuration never fails. The problem size and history depth
/// are validated on the first call to [`Lbfgs::step`](crate::Lbfgs::step), so
/// that an invalid configuration surfaces as an error from the optimizer
/// rather than from a constructor.
///
/// # Examples
///
/// ```rust
/// use lbfgsrc_optim::LbfgsConfig;
///
/// let config = LbfgsConfig::<f64>::new(100)
///     .with_memory_size(7)
///     .with_eps(1e-8)
///     .with_gtol(0.5);
///
/// assert_eq!(config.memory_size, 7);
/// assert_eq!(config.gtol(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LbfgsConfig<T>
where
    T: Scalar,
{
    /// Number of variables
    pub n: usize,
    /// Number of correction pairs retained (3 to 7 is usual)
    pub memory_size: usize,
    /// Convergence tolerance on `||g|| / max(1, ||x||)`
    pub eps: T,
    /// Line search tolerances and bounds
    pub line_search: LineSearchParams<T>,
}

impl<T> Default for LbfgsConfig<T>
where
    T: Scalar,
{
    fn default() -> Self {
        Self {
            n: 0,
            memory_size: 5,
            eps: T::DEFAULT_GRADIENT_TOLERANCE,
            line_search: LineSearchParams::default(),
        }
    }
}

impl<T> LbfgsConfig<T>
where
    T: Scalar,
{
    /// Creates a configuration for `n` variables with default parameters.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            ..Self::default()
        }
    }

    /// Sets the number of variables.
    pub fn with_dimension(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    /// Sets the number of retained correction pairs.
    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    /// Sets the convergence tolerance.
    pub fn with_eps(mut self, eps: T) -> Self {
        self.eps = eps;
        self
    }

    /// Sets the line search curvature tolerance.
    ///
    /// Values not above 10⁻⁴ are replaced by 0.9 when the optimizer starts.
    pub fn with_gtol(mut self, gtol: T) -> Self {
        self.line_search.gtol = gtol;
        self
    }

    /// Sets the line search interval tolerance.
    pub fn with_xtol(mut self, xtol: T) -> Self {
        self.line_search.xtol = xtol;
        self
    }

    /// Sets the line search step bounds.
    pub fn with_step_bounds(mut self, stpmin: T, stpmax: T) -> Self {
        self.line_search = self.line_search.with_step_bounds(stpmin, stpmax);
        self
    }

    /// Replaces all line search parameters.
    pub fn with_line_search(mut self, params: LineSearchParams<T>) -> Self {
        self.line_search = params;
        self
    }

    /// Curvature tolerance of the line search.
    pub fn gtol(&self) -> T {
        self.line_search.gtol
    }

    /// Interval tolerance of the line search.
    pub fn xtol(&self) -> T {
        self.line_search.xtol
    }
}
