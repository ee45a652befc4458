//! End-to-end scenarios for the reverse-communication minimizer.
//!
//! Each test drives `Lbfgs::step` by hand, the way a caller embedding the
//! minimizer in its own evaluation loop would.

use approx::assert_relative_eq;
use lbfgsrc_core::{
    cost_function::CostFunction,
    test_functions::{DiagonalQuadratic, Rosenbrock},
};
use lbfgsrc_optim::{Failure, Lbfgs, LbfgsConfig, LbfgsError, Result, Status};
use nalgebra::DVector;
use pretty_assertions::assert_eq;

/// Guard against a runaway loop in a failing test.
const MAX_CALLS: usize = 10_000;

/// Outcome of a hand-driven run.
struct Run {
    outcome: Result<Status>,
    /// Objective values at the accepted iterates, starting point first
    accepted_values: Vec<f64>,
}

/// Runs `lbfgs` on `cost` from `x`, supplying the objective's diagonal when
/// it offers one.
fn drive<F>(lbfgs: &mut Lbfgs<f64>, cost: &F, x: &mut DVector<f64>) -> Run
where
    F: CostFunction<f64>,
{
    let n = x.len();
    let diagco = cost.supplies_diagonal();
    let mut g = DVector::zeros(n);
    let mut diag = DVector::from_element(n, 1.0);
    if diagco {
        cost.diagonal(x, &mut diag).unwrap();
    }
    let mut f = cost.cost_and_gradient(x, &mut g).unwrap();
    let mut accepted_values = Vec::new();

    for _ in 0..MAX_CALLS {
        let before = lbfgs.function_evaluations();
        let outcome = lbfgs.step(x, f, &g, diagco, &mut diag);
        if lbfgs.function_evaluations() != before {
            accepted_values.push(f);
        }
        match outcome {
            Ok(Status::NeedEvaluation) => f = cost.cost_and_gradient(x, &mut g).unwrap(),
            Ok(Status::NeedDiagonal) => cost.diagonal(x, &mut diag).unwrap(),
            outcome => {
                return Run {
                    outcome,
                    accepted_values,
                }
            }
        }
    }
    panic!("minimizer did not terminate within {MAX_CALLS} calls");
}

#[derive(Debug)]
struct Elongated;

impl CostFunction<f64> for Elongated {
    fn dimension(&self) -> usize {
        2
    }

    fn cost_and_gradient(&self, x: &DVector<f64>, g: &mut DVector<f64>) -> Result<f64> {
        g[0] = 2.0 * x[0];
        g[1] = 20.0 * x[1];
        Ok(x[0] * x[0] + 10.0 * x[1] * x[1])
    }
}

#[test]
fn test_elongated_quadratic_converges() {
    let mut lbfgs = Lbfgs::new(LbfgsConfig::new(2).with_eps(1e-8));
    let mut x = DVector::from_vec(vec![1.0, 1.0]);

    let run = drive(&mut lbfgs, &Elongated, &mut x);

    assert_eq!(run.outcome.unwrap(), Status::Converged);
    assert_eq!(lbfgs.iflag(), 0);
    assert!(lbfgs.iteration() >= 1 && lbfgs.iteration() <= 20);
    assert!(lbfgs.x_cache()[0].abs() < 1e-7);
    assert!(lbfgs.x_cache()[1].abs() < 1e-7);

    let x_norm = lbfgs.x_cache().norm().max(1.0);
    assert!(lbfgs.gradient_norm() / x_norm <= 1e-8);
    // nfun counts the starting point plus every line search evaluation.
    assert!(lbfgs.function_evaluations() > lbfgs.iteration());
}

#[test]
fn test_rosenbrock_decreases_monotonically() {
    let mut lbfgs = Lbfgs::with_dimension(2);
    let mut x = DVector::from_vec(vec![-1.2, 1.0]);

    let run = drive(&mut lbfgs, &Rosenbrock::new(2), &mut x);

    assert_eq!(run.outcome.unwrap(), Status::Converged);
    assert_relative_eq!(lbfgs.x_cache()[0], 1.0, epsilon = 1e-3);
    assert_relative_eq!(lbfgs.x_cache()[1], 1.0, epsilon = 1e-3);

    assert_relative_eq!(run.accepted_values[0], 24.2, epsilon = 1e-12);
    assert_eq!(run.accepted_values.len(), lbfgs.iteration() + 1);
    for pair in run.accepted_values.windows(2) {
        assert!(pair[1] <= pair[0], "{} increased to {}", pair[0], pair[1]);
    }
}

#[test]
fn test_rerun_is_deterministic() {
    let start = DVector::from_vec(vec![-1.2, 1.0, -0.5, 0.8]);
    let cost = Rosenbrock::new(4);

    let mut first = Lbfgs::with_dimension(4);
    let mut x = start.clone();
    assert_eq!(drive(&mut first, &cost, &mut x).outcome.unwrap(), Status::Converged);

    let mut second = Lbfgs::with_dimension(4);
    let mut x = start.clone();
    assert_eq!(drive(&mut second, &cost, &mut x).outcome.unwrap(), Status::Converged);

    assert_eq!(first.x_cache(), second.x_cache());
    assert_eq!(first.iteration(), second.iteration());
    assert_eq!(first.function_evaluations(), second.function_evaluations());

    // A converged instance starts over when called again.
    let mut x = start;
    assert_eq!(drive(&mut first, &cost, &mut x).outcome.unwrap(), Status::Converged);
    assert_eq!(first.x_cache(), second.x_cache());
    assert_eq!(first.iteration(), second.iteration());
}

#[test]
fn test_zero_variables_rejected_without_mutation() {
    let mut lbfgs = Lbfgs::<f64>::with_dimension(0);
    let mut x = DVector::zeros(0);
    let mut diag = DVector::zeros(0);
    let g = DVector::zeros(0);

    let err = lbfgs.step(&mut x, 0.0, &g, false, &mut diag).unwrap_err();
    match err {
        LbfgsError::InvalidConfiguration { parameter, .. } => assert_eq!(parameter, "n"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(lbfgs.status(), Status::Failed(Failure::InvalidInput));
    assert_eq!(lbfgs.iflag(), -3);
    assert_eq!(lbfgs.iteration(), 0);
    assert_eq!(lbfgs.function_evaluations(), 0);
    assert!(lbfgs.log().is_empty());
}

#[test]
fn test_zero_corrections_rejected_without_mutation() {
    let mut lbfgs = Lbfgs::new(LbfgsConfig::new(2).with_memory_size(0));
    let mut x = DVector::from_vec(vec![1.0, -1.0]);
    let mut diag = DVector::from_vec(vec![7.0, 7.0]);
    let g = DVector::from_vec(vec![2.0, -2.0]);

    let err = lbfgs.step(&mut x, 2.0, &g, false, &mut diag).unwrap_err();
    match err {
        LbfgsError::InvalidConfiguration { parameter, .. } => assert_eq!(parameter, "m"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(x, DVector::from_vec(vec![1.0, -1.0]));
    assert_eq!(diag, DVector::from_vec(vec![7.0, 7.0]));
    assert_eq!(lbfgs.function_evaluations(), 0);

    let err = lbfgs.step(&mut x, 2.0, &g, false, &mut diag).unwrap_err();
    assert!(matches!(err, LbfgsError::Halted { code: -3 }));
}

#[test]
fn test_non_positive_diagonal_on_first_call() {
    let mut lbfgs = Lbfgs::with_dimension(3);
    let mut x = DVector::from_vec(vec![1.0, 1.0, 1.0]);
    let mut diag = DVector::from_vec(vec![1.0, 0.0, 2.0]);
    let g = DVector::from_vec(vec![2.0, 2.0, 2.0]);

    let err = lbfgs.step(&mut x, 3.0, &g, true, &mut diag).unwrap_err();
    match err {
        LbfgsError::DiagonalNotPositive { index, value } => {
            assert_eq!(index, 1);
            assert_eq!(value, 0.0);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(lbfgs.status(), Status::Failed(Failure::NonPositiveDiagonal));
    assert_eq!(lbfgs.iflag(), -2);
    assert_eq!(x, DVector::from_vec(vec![1.0, 1.0, 1.0]));
}

#[test]
fn test_non_positive_diagonal_on_request() {
    let cost = DiagonalQuadratic::new(DVector::from_vec(vec![1.0, 2.0, 3.0])).with_preconditioner();
    let mut lbfgs = Lbfgs::with_dimension(3);
    let mut x = DVector::from_vec(vec![1.0, 1.0, 1.0]);
    let mut g = DVector::zeros(3);
    let mut diag = DVector::zeros(3);
    cost.diagonal(&x, &mut diag).unwrap();
    let mut f = cost.cost_and_gradient(&x, &mut g).unwrap();

    let mut status = lbfgs.step(&mut x, f, &g, true, &mut diag).unwrap();
    let mut calls = 0;
    while status == Status::NeedEvaluation && calls < 100 {
        f = cost.cost_and_gradient(&x, &mut g).unwrap();
        status = lbfgs.step(&mut x, f, &g, true, &mut diag).unwrap();
        calls += 1;
    }
    assert_eq!(status, Status::NeedDiagonal);
    assert_eq!(lbfgs.iflag(), 2);
    assert_eq!(lbfgs.iteration(), 2);

    diag[2] = -1.0;
    let err = lbfgs.step(&mut x, f, &g, true, &mut diag).unwrap_err();
    assert!(matches!(
        err,
        LbfgsError::DiagonalNotPositive { index: 2, .. }
    ));
    assert_eq!(lbfgs.iflag(), -2);
}

#[test]
fn test_preconditioned_run_converges() {
    let cost =
        DiagonalQuadratic::new(DVector::from_vec(vec![1.0, 10.0, 100.0])).with_preconditioner();
    let mut lbfgs = Lbfgs::new(LbfgsConfig::new(3).with_eps(1e-9));
    let mut x = DVector::from_vec(vec![1.0, -2.0, 0.5]);

    let run = drive(&mut lbfgs, &cost, &mut x);

    assert_eq!(run.outcome.unwrap(), Status::Converged);
    assert!(lbfgs.x_cache().norm() < 1e-8);
}

#[test]
fn test_small_gtol_is_reset() {
    for gtol in [1e-5, 1e-4] {
        let mut lbfgs = Lbfgs::new(LbfgsConfig::new(2).with_gtol(gtol));
        let mut x = DVector::from_vec(vec![1.0, 1.0]);

        let run = drive(&mut lbfgs, &Elongated, &mut x);

        assert_eq!(run.outcome.unwrap(), Status::Converged);
        assert_eq!(lbfgs.config().gtol(), 0.9);
        assert_eq!(lbfgs.log().len(), 1);
        assert_eq!(
            lbfgs.log().last(),
            Some("gtol is less than or equal to 0.0001. It has been reset to 0.9.")
        );
    }

    let lbfgs_kept = {
        let mut lbfgs = Lbfgs::new(LbfgsConfig::new(2).with_gtol(0.5));
        let mut x = DVector::from_vec(vec![1.0, 1.0]);
        drive(&mut lbfgs, &Elongated, &mut x);
        lbfgs
    };
    assert_eq!(lbfgs_kept.config().gtol(), 0.5);
    assert!(lbfgs_kept.log().is_empty());
}

#[test]
fn test_wrong_gradient_sign_does_not_succeed() {
    // The first gradient points uphill; every later one is correct.
    let mut lbfgs = Lbfgs::with_dimension(1);
    let mut x = DVector::from_vec(vec![1.0]);
    let mut diag = DVector::zeros(1);
    let wrong = DVector::from_vec(vec![-2.0]);

    let mut outcome = lbfgs.step(&mut x, 1.0, &wrong, false, &mut diag);
    let mut calls = 0;
    while let Ok(Status::NeedEvaluation) = outcome {
        assert!(calls < 100);
        let f = x[0] * x[0];
        let g = DVector::from_vec(vec![2.0 * x[0]]);
        outcome = lbfgs.step(&mut x, f, &g, false, &mut diag);
        calls += 1;
    }

    assert!(matches!(outcome, Err(LbfgsError::LineSearchFailed { .. })));
    assert_eq!(lbfgs.status(), Status::Failed(Failure::LineSearch));
    assert_eq!(lbfgs.iflag(), -1);
    assert_eq!(lbfgs.x_cache(), &DVector::from_vec(vec![1.0]));
}

#[test]
fn test_zero_gradient_rejects_direction() {
    let mut lbfgs = Lbfgs::with_dimension(2);
    let mut x = DVector::from_vec(vec![0.5, -0.5]);
    let mut diag = DVector::zeros(2);
    let g = DVector::zeros(2);

    let status = lbfgs.step(&mut x, 0.0, &g, false, &mut diag).unwrap();

    assert_eq!(status, Status::DescentRejected);
    assert_eq!(lbfgs.iflag(), 3);
    assert_eq!(x, DVector::from_vec(vec![0.5, -0.5]));
    assert!(lbfgs
        .log()
        .contains("The search direction is not a descent direction."));

    // Not fatal: a later call starts a fresh run.
    let g = DVector::from_vec(vec![1.0, -1.0]);
    assert_eq!(
        lbfgs.step(&mut x, 0.5, &g, false, &mut diag).unwrap(),
        Status::NeedEvaluation
    );
}

#[test]
fn test_wrong_length_mid_search_is_recoverable() {
    let mut lbfgs = Lbfgs::with_dimension(2);
    let mut x = DVector::from_vec(vec![1.0, 1.0]);
    let mut diag = DVector::zeros(2);
    let mut g = DVector::zeros(2);
    let f = Elongated.cost_and_gradient(&x, &mut g).unwrap();
    assert_eq!(
        lbfgs.step(&mut x, f, &g, false, &mut diag).unwrap(),
        Status::NeedEvaluation
    );

    let trial = x.clone();
    let short = DVector::from_vec(vec![0.0]);
    let err = lbfgs.step(&mut x, f, &short, false, &mut diag).unwrap_err();
    assert!(matches!(
        err,
        LbfgsError::DimensionMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
    assert_eq!(x, trial);
    assert_eq!(lbfgs.status(), Status::NeedEvaluation);

    let run = drive(&mut lbfgs, &Elongated, &mut x);
    assert_eq!(run.outcome.unwrap(), Status::Converged);
}

#[test]
fn test_summary_reports_run() {
    let mut lbfgs = Lbfgs::new(LbfgsConfig::new(4).with_memory_size(2));
    let mut x = DVector::from_vec(vec![-1.2, 1.0, -1.2, 1.0]);
    drive(&mut lbfgs, &Rosenbrock::new(4), &mut x);

    let summary = lbfgs.summary();
    assert_eq!(summary["memory_size"], "2");
    assert_eq!(summary["stored_pairs"], "2");
    assert_eq!(summary["iteration"], lbfgs.iteration().to_string());
    assert_eq!(
        summary["function_evaluations"],
        lbfgs.function_evaluations().to_string()
    );
    assert_eq!(summary["status"], "converged");
}
