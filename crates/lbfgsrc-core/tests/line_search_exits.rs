//! Integration tests driving the line search to each of its exit codes.

use approx::assert_relative_eq;
use lbfgsrc_core::prelude::*;

/// Runs a search on a one-dimensional objective `phi(t) -> (value, slope)`
/// starting from the origin along +1.
fn search_1d<F>(params: &LineSearchParams<f64>, step: f64, phi: F) -> (LineSearchStatus, MoreThuente<f64>, f64)
where
    F: Fn(f64) -> (f64, f64),
{
    let direction = DVector::from_vec(vec![1.0]);
    let mut x = DVector::from_vec(vec![0.0]);
    let mut search = MoreThuente::new();

    let (f0, d0) = phi(0.0);
    let mut status = search.start(params, &mut x, f0, &DVector::from_vec(vec![d0]), &direction, step);
    while status == LineSearchStatus::NeedEvaluation {
        let (f, d) = phi(x[0]);
        status = search.resume(params, &mut x, f, &DVector::from_vec(vec![d]), &direction);
    }
    (status, search, x[0])
}

fn parabola(t: f64) -> (f64, f64) {
    ((t - 2.0).powi(2), 2.0 * (t - 2.0))
}

#[test]
fn test_converged() {
    let (status, search, t) = search_1d(&LineSearchParams::default(), 1.0, parabola);
    assert_eq!(status, LineSearchStatus::Converged);
    assert_eq!(status.code(), 1);
    assert_eq!(search.evaluations(), 1);
    assert_relative_eq!(t, 1.0);
}

#[test]
fn test_interval_too_small() {
    // Overshooting to 10 brackets [0, 10]; with xtol = 1 the bracket is
    // already "small", so the search falls back to the best step.
    let params = LineSearchParams::default().with_xtol(1.0);
    let (status, search, t) = search_1d(&params, 10.0, parabola);
    assert_eq!(status, LineSearchStatus::IntervalTooSmall);
    assert_eq!(status.code(), 2);
    assert_eq!(search.evaluations(), 2);
    assert_eq!(t, 0.0);
}

#[test]
fn test_max_evaluations() {
    let params = LineSearchParams::default().with_max_evaluations(4);
    let (status, search, _) = search_1d(&params, 1.0, |t| (-t, -1.0));
    assert_eq!(status, LineSearchStatus::MaxEvaluations);
    assert_eq!(status.code(), 3);
    assert_eq!(search.evaluations(), 4);
}

#[test]
fn test_at_min_step() {
    let params = LineSearchParams::default().with_step_bounds(10.0, 20.0);
    let (status, search, t) = search_1d(&params, 1.0, parabola);
    assert_eq!(status, LineSearchStatus::AtMinStep);
    assert_eq!(status.code(), 4);
    assert_eq!(search.step(), 10.0);
    assert_eq!(t, 10.0);
}

#[test]
fn test_at_max_step() {
    let params = LineSearchParams::default()
        .with_gtol(0.1)
        .with_step_bounds(1e-20, 0.5);
    let (status, search, _) = search_1d(&params, 1.0, parabola);
    assert_eq!(status, LineSearchStatus::AtMaxStep);
    assert_eq!(status.code(), 5);
    assert_eq!(search.step(), 0.5);
}

#[test]
fn test_rounding_errors_on_non_finite_values() {
    let phi = |t: f64| if t == 0.0 { (0.0, -1.0) } else { (f64::NAN, 0.5) };
    let (status, search, _) = search_1d(&LineSearchParams::default(), 1.0, phi);
    assert_eq!(status, LineSearchStatus::RoundingErrors);
    assert_eq!(status.code(), 6);
    assert!(search.evaluations() < 20);
}

#[test]
fn test_rejections_do_not_search() {
    let (status, search, t) = search_1d(&LineSearchParams::default(), 1.0, |t| (t, 1.0));
    assert_eq!(status, LineSearchStatus::NotDescentDirection);
    assert_eq!(status.code(), 7);
    assert_eq!(search.evaluations(), 0);
    assert_eq!(t, 0.0);

    let params = LineSearchParams::default().with_ftol(-1.0);
    let (status, _, t) = search_1d(&params, 1.0, parabola);
    assert_eq!(status, LineSearchStatus::ImproperInput);
    assert_eq!(status.code(), 0);
    assert_eq!(t, 0.0);
}

#[test]
fn test_wolfe_conditions_on_rosenbrock() {
    // Steepest descent from the classic starting point.
    let rosenbrock = |x: &DVector<f64>| {
        let (a, b) = (x[0], x[1]);
        let value = 100.0 * (b - a * a).powi(2) + (1.0 - a).powi(2);
        let grad = DVector::from_vec(vec![
            -400.0 * a * (b - a * a) - 2.0 * (1.0 - a),
            200.0 * (b - a * a),
        ]);
        (value, grad)
    };

    let params = LineSearchParams::default();
    let mut x = DVector::from_vec(vec![-1.2, 1.0]);
    let (f0, g0) = rosenbrock(&x);
    let direction = -&g0;
    let mut search = MoreThuente::new();

    let mut status = search.start(&params, &mut x, f0, &g0, &direction, 1.0 / g0.norm());
    while status == LineSearchStatus::NeedEvaluation {
        let (f, g) = rosenbrock(&x);
        status = search.resume(&params, &mut x, f, &g, &direction);
    }

    assert_eq!(status, LineSearchStatus::Converged);
    let (f, g) = rosenbrock(&x);
    let slope0 = g0.dot(&direction);
    assert!(f <= f0 + params.ftol * search.step() * slope0);
    assert!(g.dot(&direction).abs() <= params.gtol * slope0.abs());
    assert!(search.step() >= params.stpmin && search.step() <= params.stpmax);
}
