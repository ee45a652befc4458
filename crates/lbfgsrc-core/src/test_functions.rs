//! Standard objectives for tests and benchmarks.

use crate::{
    cost_function::CostFunction,
    error::{LbfgsError, Result},
    types::{DVector, Scalar},
};
use nalgebra::DMatrix;

fn check_dimension<T: Scalar>(what: &str, expected: usize, x: &DVector<T>) -> Result<()> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(LbfgsError::dimension_mismatch(what, expected, x.len()))
    }
}

/// f(x) = ½ xᵀAx − bᵀx with symmetric positive-definite A.
#[derive(Debug, Clone)]
pub struct QuadraticCost<T: Scalar> {
    /// Hessian
    pub a: DMatrix<T>,
    /// Linear term
    pub b: DVector<T>,
}

impl<T: Scalar> QuadraticCost<T> {
    /// Creates a quadratic from its Hessian and linear term.
    pub fn new(a: DMatrix<T>, b: DVector<T>) -> Result<Self> {
        if !a.is_square() {
            return Err(LbfgsError::dimension_mismatch("hessian columns", a.nrows(), a.ncols()));
        }
        if b.len() != a.nrows() {
            return Err(LbfgsError::dimension_mismatch("linear term", a.nrows(), b.len()));
        }
        Ok(Self { a, b })
    }

    /// The unique minimizer A⁻¹b, or `None` if A is not positive definite.
    pub fn minimizer(&self) -> Option<DVector<T>> {
        self.a.clone().cholesky().map(|chol| chol.solve(&self.b))
    }
}

impl<T: Scalar> CostFunction<T> for QuadraticCost<T> {
    fn dimension(&self) -> usize {
        self.b.len()
    }

    fn cost_and_gradient(&self, x: &DVector<T>, gradient: &mut DVector<T>) -> Result<T> {
        check_dimension("point", self.dimension(), x)?;
        let ax = &self.a * x;
        let value = <T as Scalar>::from_f64(0.5) * x.dot(&ax) - self.b.dot(x);
        gradient.copy_from(&(ax - &self.b));
        Ok(value)
    }
}

/// f(x) = Σ wᵢ xᵢ², with an optional exact inverse-Hessian preconditioner.
#[derive(Debug, Clone)]
pub struct DiagonalQuadratic<T: Scalar> {
    /// Positive weights
    pub weights: DVector<T>,
    /// Whether the preconditioner `1 / (2 wᵢ)` is offered to the optimizer
    pub precondition: bool,
}

impl<T: Scalar> DiagonalQuadratic<T> {
    /// Creates the objective from its weights.
    pub fn new(weights: DVector<T>) -> Self {
        Self {
            weights,
            precondition: false,
        }
    }

    /// Offers the exact inverse Hessian diagonal to the optimizer.
    pub fn with_preconditioner(mut self) -> Self {
        self.precondition = true;
        self
    }
}

impl<T: Scalar> CostFunction<T> for DiagonalQuadratic<T> {
    fn dimension(&self) -> usize {
        self.weights.len()
    }

    fn cost_and_gradient(&self, x: &DVector<T>, gradient: &mut DVector<T>) -> Result<T> {
        check_dimension("point", self.dimension(), x)?;
        let two = <T as Scalar>::from_f64(2.0);
        let mut value = T::zero();
        for i in 0..x.len() {
            value += self.weights[i] * x[i] * x[i];
            gradient[i] = two * self.weights[i] * x[i];
        }
        Ok(value)
    }

    fn supplies_diagonal(&self) -> bool {
        self.precondition
    }

    fn diagonal(&self, _x: &DVector<T>, diag: &mut DVector<T>) -> Result<()> {
        let two = <T as Scalar>::from_f64(2.0);
        for (d, &w) in diag.iter_mut().zip(self.weights.iter()) {
            *d = T::one() / (two * w);
        }
        Ok(())
    }
}

/// Chained Rosenbrock function Σ 100 (xᵢ₊₁ − xᵢ²)² + (1 − xᵢ)², minimized at (1, …, 1).
#[derive(Debug, Clone, Copy)]
pub struct Rosenbrock {
    /// Number of variables (at least 2)
    pub dim: usize,
}

impl Rosenbrock {
    /// Creates the function in `dim` variables.
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl<T: Scalar> CostFunction<T> for Rosenbrock {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn cost_and_gradient(&self, x: &DVector<T>, gradient: &mut DVector<T>) -> Result<T> {
        check_dimension("point", self.dim, x)?;
        let hundred = <T as Scalar>::from_f64(100.0);
        let two = <T as Scalar>::from_f64(2.0);

        gradient.fill(T::zero());
        let mut value = T::zero();
        for i in 0..self.dim.saturating_sub(1) {
            let t1 = x[i + 1] - x[i] * x[i];
            let t2 = T::one() - x[i];
            value += hundred * t1 * t1 + t2 * t2;
            gradient[i] -= two * two * hundred * x[i] * t1 + two * t2;
            gradient[i + 1] += two * hundred * t1;
        }
        Ok(value)
    }
}
