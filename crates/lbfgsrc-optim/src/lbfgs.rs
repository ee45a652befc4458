//! Reverse-communication L-BFGS minimizer.
//!
//! L-BFGS (Limited-memory Broyden-Fletcher-Goldfarb-Shanno) is a quasi-Newton
//! method that approximates the inverse Hessian from the `m` most recent
//! step and gradient-change pairs, never storing an n×n matrix.
//!
//! # Algorithm Overview
//!
//! 1. Start from the direction `d = −D g` (D the diagonal preconditioner) and
//!    the initial step `1 / ||g||`
//! 2. Run the Moré–Thuente line search along `d`
//! 3. Store `s = α d` and `y = g_new − g_old` in the correction history
//! 4. Stop if `||g|| / max(1, ||x||) ≤ eps`
//! 5. Rescale the diagonal to `⟨y, s⟩ / ⟨y, y⟩` (or ask the caller for one),
//!    form the next direction with the two-loop recursion and go to 2 with
//!    a unit initial step
//!
//! # Reverse Communication
//!
//! The minimizer never evaluates the objective. Each call to
//! [`Lbfgs::step`] either finishes or returns a [`Status`] telling the
//! caller what to supply next:
//!
//! ```rust
//! use lbfgsrc_optim::{Lbfgs, LbfgsConfig, Status};
//! use nalgebra::DVector;
//!
//! // f(x) = x₀² + 10 x₁²
//! let evaluate = |x: &DVector<f64>| {
//!     let f = x[0] * x[0] + 10.0 * x[1] * x[1];
//!     (f, DVector::from_vec(vec![2.0 * x[0], 20.0 * x[1]]))
//! };
//!
//! let mut lbfgs = Lbfgs::new(LbfgsConfig::new(2).with_eps(1e-8));
//! let mut x = DVector::from_vec(vec![1.0, 1.0]);
//! let mut diag = DVector::zeros(2);
//!
//! loop {
//!     let (f, g) = evaluate(&x);
//!     match lbfgs.step(&mut x, f, &g, false, &mut diag).unwrap() {
//!         Status::NeedEvaluation => continue,
//!         status => {
//!             assert_eq!(status, Status::Converged);
//!             break;
//!         }
//!     }
//! }
//! assert!(lbfgs.x_cache().norm() < 1e-6);
//! ```
//!
//! # References
//!
//! - Liu & Nocedal, "On the limited memory BFGS method for large scale
//!   optimization", Mathematical Programming B 45 (1989)
//! - Nocedal & Wright, "Numerical Optimization" (2006)

use crate::{
    config::LbfgsConfig,
    history::CorrectionHistory,
    status::{Failure, Status},
};
use lbfgsrc_core::{
    diagnostics::DiagnosticLog,
    error::{LbfgsError, Result},
    line_search::{LineSearchStatus, MoreThuente},
    types::{DVector, Scalar},
};
use num_traits::Float;
use std::collections::HashMap;

/// Where the next call to [`Lbfgs::step`] resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Next call starts a new run
    Idle,
    /// Waiting for a caller-supplied diagonal
    AwaitingDiagonal,
    /// Waiting for f and g at a line search trial point
    Searching,
    /// A fatal error occurred
    Halted,
}

/// Reverse-communication L-BFGS minimizer.
///
/// One instance serves one minimization problem at a time. All iteration
/// state (correction history, line search bracket, counters) lives here and
/// persists between calls.
#[derive(Debug, Clone)]
pub struct Lbfgs<T>
where
    T: Scalar,
{
    config: LbfgsConfig<T>,
    status: Status,
    phase: Phase,
    history: CorrectionHistory<T>,
    search: MoreThuente<T>,
    /// Current search direction
    direction: DVector<T>,
    /// Gradient at the start of the current line search
    previous_gradient: DVector<T>,
    /// Point accepted by the most recent completed line search
    x_cache: DVector<T>,
    iteration: usize,
    function_evaluations: usize,
    gradient_norm: T,
    /// Initial trial step of the first line search
    initial_step: T,
    step_length: T,
    log: DiagnosticLog,
}

impl<T> Lbfgs<T>
where
    T: Scalar,
{
    /// Creates a minimizer. The configuration is validated on the first call
    /// to [`step`](Self::step).
    pub fn new(config: LbfgsConfig<T>) -> Self {
        Self {
            config,
            status: Status::NotStarted,
            phase: Phase::Idle,
            history: CorrectionHistory::new(0, 0),
            search: MoreThuente::new(),
            direction: DVector::zeros(0),
            previous_gradient: DVector::zeros(0),
            x_cache: DVector::zeros(0),
            iteration: 0,
            function_evaluations: 0,
            gradient_norm: T::zero(),
            initial_step: T::zero(),
            step_length: T::zero(),
            log: DiagnosticLog::new(),
        }
    }

    /// Creates a minimizer for `n` variables with default parameters.
    pub fn with_dimension(n: usize) -> Self {
        Self::new(LbfgsConfig::new(n))
    }

    /// Advances the minimization with the caller's latest data.
    ///
    /// On the first call (and on any call after [`Status::Converged`] or
    /// [`Status::DescentRejected`]) `x` is the starting point and `f`, `g`
    /// are the objective value and gradient there. If `diagco` is true,
    /// `diag` must hold a positive diagonal approximation of the inverse
    /// Hessian; otherwise it is overwritten with the optimizer's own scaling.
    ///
    /// The returned status says what to do next:
    ///
    /// - [`Status::NeedEvaluation`]: `x` was moved to a trial point; evaluate
    ///   f and g there and call again
    /// - [`Status::NeedDiagonal`]: fill `diag` (only when `diagco` is true)
    ///   and call again with the same `x`, `f` and `g`
    /// - [`Status::Converged`]: [`x_cache`](Self::x_cache) holds the solution
    /// - [`Status::DescentRejected`]: the direction at `x` is not downhill
    ///   (zero or non-finite gradient); `x` is left unchanged
    ///
    /// # Errors
    ///
    /// - [`LbfgsError::InvalidConfiguration`] if `n` or `m` is zero or the
    ///   line search parameters are improper
    /// - [`LbfgsError::DiagonalNotPositive`] for a non-positive `diag` entry
    /// - [`LbfgsError::LineSearchFailed`] if the line search stops without an
    ///   acceptable step
    /// - [`LbfgsError::DimensionMismatch`] if a vector length differs from
    ///   `n`; this one leaves the optimizer untouched, so the call can be
    ///   repeated with correct data
    /// - [`LbfgsError::Halted`] on any call after one of the fatal errors
    pub fn step(
        &mut self,
        x: &mut DVector<T>,
        f: T,
        g: &DVector<T>,
        diagco: bool,
        diag: &mut DVector<T>,
    ) -> Result<Status> {
        match self.phase {
            Phase::Halted => Err(LbfgsError::Halted {
                code: self.status.code(),
            }),
            Phase::Idle => {
                self.validate_sizes()?;
                self.check_dimensions(x, g, diag)?;
                self.initialize(x, f, g, diagco, diag)
            }
            Phase::AwaitingDiagonal => {
                self.check_dimensions(x, g, diag)?;
                if let Err(err) = Self::validate_diagonal(diag) {
                    return self.fail(Failure::NonPositiveDiagonal, err);
                }
                self.search_from(x, f, g, diagco, diag)
            }
            Phase::Searching => {
                self.check_dimensions(x, g, diag)?;
                let status = self
                    .search
                    .resume(&self.config.line_search, x, f, g, &self.direction);
                self.after_search(status, x, f, g, diagco, diag)
            }
        }
    }

    fn validate_sizes(&mut self) -> Result<()> {
        if self.config.n == 0 {
            self.fail(
                Failure::InvalidInput,
                LbfgsError::invalid_configuration("number of variables must be positive", "n", "0"),
            )?;
        }
        if self.config.memory_size == 0 {
            self.fail(
                Failure::InvalidInput,
                LbfgsError::invalid_configuration(
                    "number of corrections must be positive",
                    "m",
                    "0",
                ),
            )?;
        }
        Ok(())
    }

    fn check_dimensions(&self, x: &DVector<T>, g: &DVector<T>, diag: &DVector<T>) -> Result<()> {
        let n = self.config.n;
        for (what, len) in [("x", x.len()), ("gradient", g.len()), ("diag", diag.len())] {
            if len != n {
                return Err(LbfgsError::dimension_mismatch(what, n, len));
            }
        }
        Ok(())
    }

    fn validate_diagonal(diag: &DVector<T>) -> Result<()> {
        // Written so that NaN entries are rejected as well.
        match diag.iter().position(|&d| !(d > T::zero())) {
            Some(index) => Err(LbfgsError::diagonal_not_positive(
                index,
                Scalar::to_f64(diag[index]),
            )),
            None => Ok(()),
        }
    }

    /// Records a fatal condition and returns it as an error.
    fn fail(&mut self, failure: Failure, error: LbfgsError) -> Result<Status> {
        self.status = Status::Failed(failure);
        self.phase = Phase::Halted;
        Err(error)
    }

    fn initialize(
        &mut self,
        x: &mut DVector<T>,
        f: T,
        g: &DVector<T>,
        diagco: bool,
        diag: &mut DVector<T>,
    ) -> Result<Status> {
        let n = self.config.n;
        let m = self.config.memory_size;

        if self.config.line_search.gtol <= <T as Scalar>::from_f64(1e-4) {
            self.log
                .warn("gtol is less than or equal to 0.0001. It has been reset to 0.9.");
            self.config.line_search.gtol = <T as Scalar>::from_f64(0.9);
        }
        if !self.config.line_search.is_valid() {
            let params = format!("{:?}", self.config.line_search);
            return self.fail(
                Failure::InvalidInput,
                LbfgsError::invalid_configuration(
                    "tolerances must be non-negative, stpmax >= stpmin >= 0 and max_evaluations > 0",
                    "line_search",
                    params,
                ),
            );
        }

        if diagco {
            if let Err(err) = Self::validate_diagonal(diag) {
                return self.fail(Failure::NonPositiveDiagonal, err);
            }
        } else {
            diag.fill(T::one());
        }

        if self.history.capacity() == m && self.direction.len() == n {
            self.history.clear();
        } else {
            self.history = CorrectionHistory::new(n, m);
            self.direction = DVector::zeros(n);
            self.previous_gradient = DVector::zeros(n);
        }
        self.x_cache = x.clone();
        self.iteration = 0;
        self.function_evaluations = 1;
        self.gradient_norm = g.norm();
        self.initial_step = T::one() / self.gradient_norm;
        self.step_length = T::zero();

        log::debug!(
            "L-BFGS started: n = {}, m = {}, f = {:e}, |g| = {:e}",
            n,
            m,
            Scalar::to_f64(f),
            Scalar::to_f64(self.gradient_norm)
        );

        self.begin_iteration(x, f, g, diagco, diag)
    }

    /// Starts a new outer iteration at the accepted point `x`.
    fn begin_iteration(
        &mut self,
        x: &mut DVector<T>,
        f: T,
        g: &DVector<T>,
        diagco: bool,
        diag: &mut DVector<T>,
    ) -> Result<Status> {
        self.iteration += 1;

        let curvature = self
            .history
            .latest()
            .map(|(s, y)| (y.dot(s), y.norm_squared()));
        if let Some((ys, yy)) = curvature {
            if diagco {
                self.phase = Phase::AwaitingDiagonal;
                self.status = Status::NeedDiagonal;
                return Ok(Status::NeedDiagonal);
            }
            diag.fill(ys / yy);
        }

        self.search_from(x, f, g, diagco, diag)
    }

    /// Forms the search direction and starts the line search along it.
    fn search_from(
        &mut self,
        x: &mut DVector<T>,
        f: T,
        g: &DVector<T>,
        diagco: bool,
        diag: &mut DVector<T>,
    ) -> Result<Status> {
        self.history.two_loop(g, diag, &mut self.direction);
        self.previous_gradient.copy_from(g);

        let step = if self.iteration == 1 {
            self.initial_step
        } else {
            T::one()
        };
        let status = self
            .search
            .start(&self.config.line_search, x, f, g, &self.direction, step);
        self.after_search(status, x, f, g, diagco, diag)
    }

    fn after_search(
        &mut self,
        status: LineSearchStatus,
        x: &mut DVector<T>,
        f: T,
        g: &DVector<T>,
        diagco: bool,
        diag: &mut DVector<T>,
    ) -> Result<Status> {
        self.step_length = self.search.step();

        match status {
            LineSearchStatus::NeedEvaluation => {
                self.phase = Phase::Searching;
                self.status = Status::NeedEvaluation;
                Ok(Status::NeedEvaluation)
            }
            LineSearchStatus::Converged => self.complete_iteration(x, f, g, diagco, diag),
            LineSearchStatus::NotDescentDirection => {
                self.log
                    .warn("The search direction is not a descent direction.");
                self.phase = Phase::Idle;
                self.status = Status::DescentRejected;
                Ok(Status::DescentRejected)
            }
            LineSearchStatus::ImproperInput => {
                let step = format!("{:e}", Scalar::to_f64(self.step_length));
                self.fail(
                    Failure::InvalidInput,
                    LbfgsError::invalid_configuration(
                        "the line search rejected its initial step",
                        "step",
                        step,
                    ),
                )
            }
            failed => self.fail(Failure::LineSearch, LbfgsError::line_search_failed(failed)),
        }
    }

    /// Stores the new correction pair and tests for convergence.
    fn complete_iteration(
        &mut self,
        x: &mut DVector<T>,
        f: T,
        g: &DVector<T>,
        diagco: bool,
        diag: &mut DVector<T>,
    ) -> Result<Status> {
        self.function_evaluations += self.search.evaluations();
        self.history
            .push_step(self.step_length, &self.direction, g, &self.previous_gradient);
        self.x_cache.copy_from(x);
        self.gradient_norm = g.norm();
        let x_norm = <T as Float>::max(T::one(), x.norm());

        log::debug!(
            "iteration {}: nfun = {}, f = {:e}, |g| = {:e}, step = {:e}",
            self.iteration,
            self.function_evaluations,
            Scalar::to_f64(f),
            Scalar::to_f64(self.gradient_norm),
            Scalar::to_f64(self.step_length)
        );

        if self.gradient_norm / x_norm <= self.config.eps {
            self.phase = Phase::Idle;
            self.status = Status::Converged;
            return Ok(Status::Converged);
        }

        self.begin_iteration(x, f, g, diagco, diag)
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Current status as an integer code (see [`Status::code`]).
    pub fn iflag(&self) -> i32 {
        self.status.code()
    }

    /// Outer iterations started in the current run.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Function evaluations: 1 for the starting point plus those of every
    /// completed line search.
    pub fn function_evaluations(&self) -> usize {
        self.function_evaluations
    }

    /// Gradient norm at the last accepted point.
    pub fn gradient_norm(&self) -> T {
        self.gradient_norm
    }

    /// Current line search step.
    pub fn step_length(&self) -> T {
        self.step_length
    }

    /// Point accepted by the most recent completed line search.
    ///
    /// Unlike the caller's `x`, which moves to trial points while a line
    /// search is in progress, this is always an accepted iterate (or the
    /// starting point before the first line search completes).
    pub fn x_cache(&self) -> &DVector<T> {
        &self.x_cache
    }

    /// Warnings recorded so far.
    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    /// Number of variables.
    pub fn n(&self) -> usize {
        self.config.n
    }

    /// Number of retained correction pairs.
    pub fn m(&self) -> usize {
        self.config.memory_size
    }

    /// Convergence tolerance.
    pub fn eps(&self) -> T {
        self.config.eps
    }

    /// Line search interval tolerance.
    pub fn xtol(&self) -> T {
        self.config.xtol()
    }

    /// The configuration in effect, including a reset `gtol`.
    pub fn config(&self) -> &LbfgsConfig<T> {
        &self.config
    }

    /// Euclidean norm of `g`.
    pub fn gradient_norm_of(g: &DVector<T>) -> T {
        g.norm()
    }

    /// Key figures of the current run for reporting.
    pub fn summary(&self) -> HashMap<String, String> {
        let mut summary = HashMap::new();
        summary.insert("memory_size".to_string(), self.config.memory_size.to_string());
        summary.insert("stored_pairs".to_string(), self.history.len().to_string());
        summary.insert("iteration".to_string(), self.iteration.to_string());
        summary.insert(
            "function_evaluations".to_string(),
            self.function_evaluations.to_string(),
        );
        summary.insert(
            "gradient_norm".to_string(),
            format!("{:e}", Scalar::to_f64(self.gradient_norm)),
        );
        summary.insert("status".to_string(), self.status.to_string());
        summary
    }
}
