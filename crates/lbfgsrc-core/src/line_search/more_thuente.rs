//! Reverse-communicating Moré–Thuente line search.

use super::step::{safeguarded_step, Endpoint};
use super::{LineSearchParams, LineSearchStatus};
use crate::types::{DVector, Scalar};
use num_traits::Float;

/// State of one Moré–Thuente line search.
///
/// The search is driven from outside: [`start`](Self::start) proposes the
/// first trial point by overwriting `x`, and every call to
/// [`resume`](Self::resume) consumes f and g evaluated at the last proposal.
/// The instance can be reused for any number of searches.
#[derive(Debug, Clone)]
pub struct MoreThuente<T>
where
    T: Scalar,
{
    /// Point the search started from
    base: DVector<T>,
    /// Step with the least function value so far
    best: Endpoint<T>,
    /// Other end of the interval of uncertainty
    other: Endpoint<T>,
    /// Current trial step
    step: T,
    initial_value: T,
    initial_slope: T,
    /// `ftol` times the initial slope
    slope_test: T,
    /// Current admissible step range
    stmin: T,
    stmax: T,
    width: T,
    previous_width: T,
    bracketed: bool,
    first_stage: bool,
    /// Cleared when the step computation rejected its input
    step_consistent: bool,
    evaluations: usize,
    awaiting_evaluation: bool,
}

impl<T> Default for MoreThuente<T>
where
    T: Scalar,
{
    fn default() -> Self {
        let origin = Endpoint::new(T::zero(), T::zero(), T::zero());
        Self {
            base: DVector::zeros(0),
            best: origin,
            other: origin,
            step: T::zero(),
            initial_value: T::zero(),
            initial_slope: T::zero(),
            slope_test: T::zero(),
            stmin: T::zero(),
            stmax: T::zero(),
            width: T::zero(),
            previous_width: T::zero(),
            bracketed: false,
            first_stage: true,
            step_consistent: true,
            evaluations: 0,
            awaiting_evaluation: false,
        }
    }
}

impl<T> MoreThuente<T>
where
    T: Scalar,
{
    /// Creates an idle line search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current trial step (the accepted step once the search has converged).
    pub fn step(&self) -> T {
        self.step
    }

    /// Function evaluations consumed by the current search.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Whether the last call asked for an evaluation that has not arrived.
    pub fn is_active(&self) -> bool {
        self.awaiting_evaluation
    }

    /// Directional derivative at the start of the current search.
    pub fn initial_slope(&self) -> T {
        self.initial_slope
    }

    /// Starts a search from `x` along `direction` with initial trial `step`.
    ///
    /// `f` and `g` are the objective value and gradient at `x`. On
    /// [`LineSearchStatus::NeedEvaluation`], `x` has been overwritten with the
    /// first trial point. [`LineSearchStatus::ImproperInput`] and
    /// [`LineSearchStatus::NotDescentDirection`] leave `x` untouched.
    pub fn start(
        &mut self,
        params: &LineSearchParams<T>,
        x: &mut DVector<T>,
        f: T,
        g: &DVector<T>,
        direction: &DVector<T>,
        step: T,
    ) -> LineSearchStatus {
        self.awaiting_evaluation = false;
        self.step_consistent = true;

        let n = x.len();
        if n == 0 || g.len() != n || direction.len() != n || !params.is_valid() {
            return LineSearchStatus::ImproperInput;
        }

        let slope = g.dot(direction);
        // Written so that a NaN slope is rejected as well.
        if !(slope < T::zero()) {
            return LineSearchStatus::NotDescentDirection;
        }
        if !(step > T::zero()) {
            return LineSearchStatus::ImproperInput;
        }

        self.bracketed = false;
        self.first_stage = true;
        self.evaluations = 0;
        self.initial_value = f;
        self.initial_slope = slope;
        self.slope_test = params.ftol * slope;
        self.width = params.stpmax - params.stpmin;
        self.previous_width = self.width + self.width;
        if self.base.len() == n {
            self.base.copy_from(x);
        } else {
            self.base = x.clone();
        }
        self.best = Endpoint::new(T::zero(), f, slope);
        self.other = self.best;
        self.step = step;

        log::trace!(
            "line search started: f = {:e}, slope = {:e}, step = {:e}",
            Scalar::to_f64(f),
            Scalar::to_f64(slope),
            Scalar::to_f64(step)
        );

        self.propose(params, x, direction)
    }

    /// Consumes `f` and `g` evaluated at the point proposed by the previous
    /// call and either proposes a new trial point or terminates.
    ///
    /// When a terminal status is returned, `x` holds the last evaluated
    /// point, which for [`LineSearchStatus::Converged`] is the accepted one.
    pub fn resume(
        &mut self,
        params: &LineSearchParams<T>,
        x: &mut DVector<T>,
        f: T,
        g: &DVector<T>,
        direction: &DVector<T>,
    ) -> LineSearchStatus {
        if !self.awaiting_evaluation || g.len() != self.base.len() {
            self.awaiting_evaluation = false;
            return LineSearchStatus::ImproperInput;
        }

        self.evaluations += 1;
        let dg = g.dot(direction);
        let ftest = self.initial_value + self.step * self.slope_test;

        log::trace!(
            "line search evaluation {}: step = {:e}, f = {:e}, slope = {:e}",
            self.evaluations,
            Scalar::to_f64(self.step),
            Scalar::to_f64(f),
            Scalar::to_f64(dg)
        );

        if let Some(status) = self.termination(params, f, dg, ftest) {
            self.awaiting_evaluation = false;
            log::trace!("line search finished: {status}");
            return status;
        }

        let first_stage_min_slope = <T as Float>::min(params.ftol, params.gtol) * self.initial_slope;
        if self.first_stage && f <= ftest && dg >= first_stage_min_slope {
            self.first_stage = false;
        }

        let trial = Endpoint::new(self.step, f, dg);
        // Interpolate the shifted function while a lower value has been found
        // but the decrease is not yet sufficient.
        let shift = if self.first_stage && f <= self.best.value && f > ftest {
            self.slope_test
        } else {
            T::zero()
        };

        match safeguarded_step(
            self.best.shifted(shift),
            self.other.shifted(shift),
            trial.shifted(shift),
            self.bracketed,
            self.stmin,
            self.stmax,
        ) {
            Some(update) => {
                self.best = update.best.unshifted(shift);
                self.other = update.other.unshifted(shift);
                self.step = update.step;
                self.bracketed = update.bracketed;
            }
            None => self.step_consistent = false,
        }

        // Force a sufficient decrease in the width of the interval.
        if self.bracketed {
            let span = <T as Float>::abs(self.other.step - self.best.step);
            if span >= <T as Scalar>::from_f64(0.66) * self.previous_width {
                self.step = self.best.step
                    + <T as Scalar>::from_f64(0.5) * (self.other.step - self.best.step);
            }
            self.previous_width = self.width;
            self.width = span;
        }

        self.propose(params, x, direction)
    }

    /// Checks the stopping tests after an evaluation. Later tests take
    /// precedence, so a step satisfying both Wolfe conditions always wins.
    #[allow(clippy::float_cmp)]
    fn termination(
        &self,
        params: &LineSearchParams<T>,
        f: T,
        dg: T,
        ftest: T,
    ) -> Option<LineSearchStatus> {
        let mut status = None;

        if (self.bracketed && (self.step <= self.stmin || self.step >= self.stmax))
            || !self.step_consistent
        {
            status = Some(LineSearchStatus::RoundingErrors);
        }
        if self.step == params.stpmax && f <= ftest && dg <= self.slope_test {
            status = Some(LineSearchStatus::AtMaxStep);
        }
        if self.step == params.stpmin && (f > ftest || dg >= self.slope_test) {
            status = Some(LineSearchStatus::AtMinStep);
        }
        if self.evaluations >= params.max_evaluations {
            status = Some(LineSearchStatus::MaxEvaluations);
        }
        if self.bracketed && self.stmax - self.stmin <= params.xtol * self.stmax {
            status = Some(LineSearchStatus::IntervalTooSmall);
        }
        if f <= ftest && <T as Float>::abs(dg) <= params.gtol * (-self.initial_slope) {
            status = Some(LineSearchStatus::Converged);
        }

        status
    }

    /// Clamps the trial step and writes `base + step * direction` into `x`.
    fn propose(
        &mut self,
        params: &LineSearchParams<T>,
        x: &mut DVector<T>,
        direction: &DVector<T>,
    ) -> LineSearchStatus {
        if self.bracketed {
            self.stmin = <T as Float>::min(self.best.step, self.other.step);
            self.stmax = <T as Float>::max(self.best.step, self.other.step);
        } else {
            self.stmin = self.best.step;
            self.stmax =
                self.step + <T as Scalar>::from_f64(4.0) * (self.step - self.best.step);
        }

        self.step = <T as Float>::max(self.step, params.stpmin);
        self.step = <T as Float>::min(self.step, params.stpmax);

        // On an unusual termination the last evaluation happens at the best step.
        if (self.bracketed && (self.step <= self.stmin || self.step >= self.stmax))
            || self.evaluations + 1 >= params.max_evaluations
            || !self.step_consistent
            || (self.bracketed && self.stmax - self.stmin <= params.xtol * self.stmax)
        {
            self.step = self.best.step;
        }

        x.copy_from(&self.base);
        x.axpy(self.step, direction, T::one());
        self.awaiting_evaluation = true;
        LineSearchStatus::NeedEvaluation
    }
}
