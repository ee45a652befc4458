//! Convenience driver that runs the reverse-communication loop.
//!
//! [`minimize`] owns the round-trips between [`Lbfgs`] and a
//! [`CostFunction`]: it evaluates the objective whenever the minimizer asks
//! for it, supplies the diagonal preconditioner when the objective provides
//! one, and enforces caller-side budgets the minimizer itself does not have.

use crate::{config::LbfgsConfig, lbfgs::Lbfgs, status::Status};
use lbfgsrc_core::{
    cost_function::CostFunction,
    diagnostics::DiagnosticLog,
    error::{LbfgsError, Result},
    types::{DVector, Scalar},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Budgets enforced by the driver.
///
/// The minimizer runs until its gradient criterion is met; these limits stop
/// the loop earlier. `None` disables a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoppingCriterion {
    /// Maximum number of completed outer iterations
    pub max_iterations: Option<usize>,
    /// Maximum number of objective evaluations, the initial one included
    pub max_function_evaluations: Option<usize>,
}

impl Default for StoppingCriterion {
    fn default() -> Self {
        Self {
            max_iterations: Some(1000),
            max_function_evaluations: None,
        }
    }
}

impl StoppingCriterion {
    /// Creates a criterion with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Sets the maximum number of objective evaluations.
    pub fn with_max_function_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_function_evaluations = Some(max_evaluations);
        self
    }

    /// Removes every limit.
    pub fn unlimited() -> Self {
        Self {
            max_iterations: None,
            max_function_evaluations: None,
        }
    }
}

/// Why [`minimize`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerminationReason {
    /// `||g|| / max(1, ||x||) ≤ eps`
    Converged,
    /// Iteration budget exhausted
    MaxIterations,
    /// Evaluation budget exhausted
    MaxFunctionEvaluations,
    /// The search direction was not downhill, typically a zero gradient at
    /// the starting point
    DescentRejected,
}

/// Outcome of [`minimize`].
#[derive(Debug, Clone)]
pub struct OptimizationResult<T>
where
    T: Scalar,
{
    /// Last accepted iterate
    pub point: DVector<T>,
    /// Objective value at `point`
    pub value: T,
    /// Gradient norm at `point`
    pub gradient_norm: T,
    /// Completed outer iterations
    pub iterations: usize,
    /// Objective evaluations performed by the driver
    pub function_evaluations: usize,
    /// Wall-clock time spent
    pub duration: Duration,
    /// Why the loop stopped
    pub termination_reason: TerminationReason,
    /// True if the gradient criterion was met
    pub converged: bool,
    /// Warnings recorded by the minimizer
    pub diagnostics: DiagnosticLog,
}

/// Minimizes `cost_fn` from `x0`.
///
/// `config.n` is set to the length of `x0`. If the objective
/// [supplies a diagonal](CostFunction::supplies_diagonal), it is evaluated at
/// the starting point and at every accepted iterate and handed to the
/// minimizer; otherwise the minimizer scales its own.
///
/// When a budget runs out in the middle of a line search, the returned point
/// is the last accepted iterate, never the trial point.
///
/// # Errors
///
/// Propagates the minimizer's fatal errors and any error returned by the
/// objective. Fails with [`LbfgsError::DimensionMismatch`] if `x0` does not
/// match the objective's dimension.
///
/// # Example
///
/// ```rust
/// use lbfgsrc_core::{cost_function::CostFunction, error::Result, types::DVector};
/// use lbfgsrc_optim::{minimize, LbfgsConfig, StoppingCriterion};
///
/// #[derive(Debug)]
/// struct Shifted;
///
/// impl CostFunction<f64> for Shifted {
///     fn dimension(&self) -> usize {
///         2
///     }
///
///     fn cost_and_gradient(&self, x: &DVector<f64>, g: &mut DVector<f64>) -> Result<f64> {
///         g[0] = 2.0 * (x[0] - 1.0);
///         g[1] = 4.0 * (x[1] + 2.0);
///         Ok((x[0] - 1.0).powi(2) + 2.0 * (x[1] + 2.0).powi(2))
///     }
/// }
///
/// let x0 = DVector::zeros(2);
/// let config = LbfgsConfig::default().with_eps(1e-9);
/// let result = minimize(&Shifted, &x0, config, &StoppingCriterion::new()).unwrap();
///
/// assert!(result.converged);
/// assert!((result.point[0] - 1.0).abs() < 1e-6);
/// assert!((result.point[1] + 2.0).abs() < 1e-6);
/// ```
pub fn minimize<T, F>(
    cost_fn: &F,
    x0: &DVector<T>,
    config: LbfgsConfig<T>,
    criterion: &StoppingCriterion,
) -> Result<OptimizationResult<T>>
where
    T: Scalar,
    F: CostFunction<T> + ?Sized,
{
    let start_time = Instant::now();
    let n = x0.len();
    if cost_fn.dimension() != n {
        return Err(LbfgsError::dimension_mismatch(
            "initial point",
            cost_fn.dimension(),
            n,
        ));
    }

    let diagco = cost_fn.supplies_diagonal();
    let mut lbfgs = Lbfgs::new(config.with_dimension(n));
    let mut x = x0.clone();
    let mut gradient = DVector::zeros(n);
    let mut diag = DVector::from_element(n, T::one());

    let mut value = cost_fn.cost_and_gradient(&x, &mut gradient)?;
    let mut evaluations = 1;
    if diagco {
        cost_fn.diagonal(&x, &mut diag)?;
    }

    let mut accepted_value = value;
    let mut iterations = 0;

    let termination_reason = loop {
        let accepted_before = lbfgs.function_evaluations();
        let status = lbfgs.step(&mut x, value, &gradient, diagco, &mut diag)?;

        // The minimizer accepts the point it was called with whenever its
        // evaluation count moves.
        if lbfgs.function_evaluations() != accepted_before {
            accepted_value = value;
            if accepted_before > 0 {
                iterations += 1;
            }
        }

        match status {
            Status::Converged => break TerminationReason::Converged,
            Status::DescentRejected => break TerminationReason::DescentRejected,
            Status::NeedEvaluation | Status::NeedDiagonal => {
                if criterion
                    .max_iterations
                    .is_some_and(|max| iterations >= max)
                {
                    break TerminationReason::MaxIterations;
                }
                if status == Status::NeedDiagonal {
                    cost_fn.diagonal(&x, &mut diag)?;
                    continue;
                }
                if criterion
                    .max_function_evaluations
                    .is_some_and(|max| evaluations >= max)
                {
                    break TerminationReason::MaxFunctionEvaluations;
                }
                value = cost_fn.cost_and_gradient(&x, &mut gradient)?;
                evaluations += 1;
            }
            Status::NotStarted | Status::Failed(_) => {
                return Err(LbfgsError::Halted {
                    code: status.code(),
                })
            }
        }
    };

    let duration = start_time.elapsed();
    log::debug!(
        "minimize finished: {:?} after {} iterations, {} evaluations, {:?}",
        termination_reason,
        iterations,
        evaluations,
        duration
    );

    Ok(OptimizationResult {
        point: lbfgs.x_cache().clone(),
        value: accepted_value,
        gradient_norm: lbfgs.gradient_norm(),
        iterations,
        function_evaluations: evaluations,
        duration,
        termination_reason,
        converged: termination_reason == TerminationReason::Converged,
        diagnostics: lbfgs.log().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lbfgsrc_core::{
        cost_function::CountingCostFunction,
        test_functions::{DiagonalQuadratic, Rosenbrock},
    };

    #[test]
    fn test_criterion_defaults() {
        let criterion = StoppingCriterion::new();
        assert_eq!(criterion.max_iterations, Some(1000));
        assert_eq!(criterion.max_function_evaluations, None);

        let criterion = StoppingCriterion::unlimited().with_max_function_evaluations(7);
        assert_eq!(criterion.max_iterations, None);
        assert_eq!(criterion.max_function_evaluations, Some(7));
    }

    #[test]
    fn test_counts_match_objective_calls() {
        let cost = CountingCostFunction::new(DiagonalQuadratic::new(DVector::from_vec(vec![
            1.0, 3.0, 10.0,
        ])));
        let x0 = DVector::from_vec(vec![1.0, -1.0, 0.5]);

        let result = minimize(&cost, &x0, LbfgsConfig::default(), &StoppingCriterion::new())
            .unwrap();

        assert!(result.converged);
        let (costs, gradients, diagonals) = cost.counts();
        assert_eq!(costs, result.function_evaluations);
        assert_eq!(gradients, result.function_evaluations);
        assert_eq!(diagonals, 0);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_iteration_budget_returns_accepted_point() {
        let x0 = DVector::from_vec(vec![-1.2, 1.0]);
        let result = minimize(
            &Rosenbrock::new(2),
            &x0,
            LbfgsConfig::default(),
            &StoppingCriterion::new().with_max_iterations(3),
        )
        .unwrap();

        assert_eq!(result.termination_reason, TerminationReason::MaxIterations);
        assert!(!result.converged);
        assert_eq!(result.iterations, 3);

        let mut g = DVector::zeros(2);
        let value = Rosenbrock::new(2).cost_and_gradient(&result.point, &mut g).unwrap();
        assert_relative_eq!(result.value, value);
        assert_relative_eq!(result.gradient_norm, g.norm());
        assert!(result.value < 24.2);
    }

    #[test]
    fn test_dimension_mismatch() {
        let x0 = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let err = minimize(
            &Rosenbrock::new(2),
            &x0,
            LbfgsConfig::default(),
            &StoppingCriterion::new(),
        )
        .unwrap_err();
        assert!(matches!(err, LbfgsError::DimensionMismatch { .. }));
    }
}
