//! Objective function interface for the convenience driver.
//!
//! The L-BFGS state machine itself never calls an objective: it receives
//! values and gradients from its caller. This trait exists for callers that
//! prefer to hand over a function object and let a driver loop perform the
//! reverse-communication round-trips.

#[cfg(any(test, feature = "test-utils"))]
use crate::error::LbfgsError;
use crate::{
    error::Result,
    types::{DVector, Scalar},
};
#[cfg(any(test, feature = "test-utils"))]
use num_traits::Float;
use std::cell::RefCell;
use std::fmt::Debug;

/// A differentiable objective `f: Rⁿ → R`.
pub trait CostFunction<T>: Debug
where
    T: Scalar,
{
    /// Number of variables.
    fn dimension(&self) -> usize;

    /// Evaluates f at `x` and writes ∇f(x) into `gradient`.
    fn cost_and_gradient(&self, x: &DVector<T>, gradient: &mut DVector<T>) -> Result<T>;

    /// Evaluates f only.
    ///
    /// # Default Implementation
    ///
    /// Calls `cost_and_gradient` with a scratch gradient.
    fn cost(&self, x: &DVector<T>) -> Result<T> {
        let mut gradient = DVector::zeros(x.len());
        self.cost_and_gradient(x, &mut gradient)
    }

    /// Whether [`diagonal`](Self::diagonal) provides a preconditioner the
    /// optimizer should use instead of its own scaling.
    fn supplies_diagonal(&self) -> bool {
        false
    }

    /// Writes a positive diagonal approximation of the inverse Hessian at `x`.
    ///
    /// The default is the identity.
    fn diagonal(&self, _x: &DVector<T>, diag: &mut DVector<T>) -> Result<()> {
        diag.fill(T::one());
        Ok(())
    }

    /// Central finite-difference approximation of the gradient.
    #[cfg(any(test, feature = "test-utils"))]
    fn gradient_fd(&self, x: &DVector<T>) -> Result<DVector<T>> {
        let h = <T as Float>::sqrt(T::epsilon());
        let mut gradient = DVector::zeros(x.len());
        let mut perturbed = x.clone();

        for i in 0..x.len() {
            let original = perturbed[i];
            perturbed[i] = original + h;
            let f_plus = self.cost(&perturbed)?;
            perturbed[i] = original - h;
            let f_minus = self.cost(&perturbed)?;
            perturbed[i] = original;
            gradient[i] = (f_plus - f_minus) / (h + h);
        }

        Ok(gradient)
    }
}

impl<T, F> CostFunction<T> for &F
where
    T: Scalar,
    F: CostFunction<T> + ?Sized,
{
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn cost_and_gradient(&self, x: &DVector<T>, gradient: &mut DVector<T>) -> Result<T> {
        (**self).cost_and_gradient(x, gradient)
    }

    fn cost(&self, x: &DVector<T>) -> Result<T> {
        (**self).cost(x)
    }

    fn supplies_diagonal(&self) -> bool {
        (**self).supplies_diagonal()
    }

    fn diagonal(&self, x: &DVector<T>, diag: &mut DVector<T>) -> Result<()> {
        (**self).diagonal(x, diag)
    }
}

/// Wrapper to count evaluations for testing and debugging.
#[derive(Debug)]
pub struct CountingCostFunction<F> {
    /// The underlying objective
    pub inner: F,
    /// Number of value evaluations (with or without gradient)
    pub cost_count: RefCell<usize>,
    /// Number of gradient evaluations
    pub gradient_count: RefCell<usize>,
    /// Number of preconditioner evaluations
    pub diagonal_count: RefCell<usize>,
}

impl<F> CountingCostFunction<F> {
    /// Creates a new counting wrapper around an objective.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            cost_count: RefCell::new(0),
            gradient_count: RefCell::new(0),
            diagonal_count: RefCell::new(0),
        }
    }

    /// Resets all counters to zero.
    pub fn reset_counts(&self) {
        *self.cost_count.borrow_mut() = 0;
        *self.gradient_count.borrow_mut() = 0;
        *self.diagonal_count.borrow_mut() = 0;
    }

    /// Returns `(cost, gradient, diagonal)` counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            *self.cost_count.borrow(),
            *self.gradient_count.borrow(),
            *self.diagonal_count.borrow(),
        )
    }
}

impl<T, F> CostFunction<T> for CountingCostFunction<F>
where
    T: Scalar,
    F: CostFunction<T>,
{
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn cost_and_gradient(&self, x: &DVector<T>, gradient: &mut DVector<T>) -> Result<T> {
        *self.cost_count.borrow_mut() += 1;
        *self.gradient_count.borrow_mut() += 1;
        self.inner.cost_and_gradient(x, gradient)
    }

    fn cost(&self, x: &DVector<T>) -> Result<T> {
        *self.cost_count.borrow_mut() += 1;
        self.inner.cost(x)
    }

    fn supplies_diagonal(&self) -> bool {
        self.inner.supplies_diagonal()
    }

    fn diagonal(&self, x: &DVector<T>, diag: &mut DVector<T>) -> Result<()> {
        *self.diagonal_count.borrow_mut() += 1;
        self.inner.diagonal(x, diag)
    }
}

/// Compares analytic gradients against finite differences.
#[cfg(any(test, feature = "test-utils"))]
pub struct DerivativeChecker;

#[cfg(any(test, feature = "test-utils"))]
impl DerivativeChecker {
    /// Returns `(passes, max_error)` where `max_error` is the largest
    /// component-wise deviation from the central-difference gradient.
    pub fn check_gradient<T, F>(cost_fn: &F, x: &DVector<T>, tol: T) -> Result<(bool, T)>
    where
        T: Scalar,
        F: CostFunction<T> + ?Sized,
    {
        if x.len() != cost_fn.dimension() {
            return Err(LbfgsError::dimension_mismatch(
                "point",
                cost_fn.dimension(),
                x.len(),
            ));
        }

        let mut analytic = DVector::zeros(x.len());
        cost_fn.cost_and_gradient(x, &mut analytic)?;
        let numeric = cost_fn.gradient_fd(x)?;

        let max_error = (&analytic - &numeric)
            .iter()
            .map(|v| <T as Float>::abs(*v))
            .fold(T::zero(), |a, b| <T as Float>::max(a, b));

        Ok((max_error < tol, max_error))
    }
}
