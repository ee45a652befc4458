//! Reverse-communication limited-memory BFGS minimization.
//!
//! This crate provides the L-BFGS minimizer built on the Moré–Thuente line
//! search of `lbfgsrc-core`. The minimizer never calls the objective: the
//! caller evaluates it wherever [`Lbfgs::step`] asks and calls again.
//!
//! # Components
//!
//! - **Lbfgs**: the resumable minimizer state machine
//! - **CorrectionHistory**: fixed-capacity circular buffer of correction
//!   pairs and the two-loop recursion
//! - **minimize**: a driver loop over a [`CostFunction`](lbfgsrc_core::cost_function::CostFunction)
//!   with iteration and evaluation budgets
//!
//! # Examples
//!
//! ```rust
//! use lbfgsrc_optim::{Lbfgs, LbfgsConfig, Status};
//! use nalgebra::DVector;
//!
//! // f(x) = Σ (xᵢ − 3)²
//! let mut lbfgs = Lbfgs::new(LbfgsConfig::new(3));
//! let mut x = DVector::<f64>::zeros(3);
//! let mut diag = DVector::zeros(3);
//!
//! let status = loop {
//!     let g = x.map(|v: f64| 2.0 * (v - 3.0));
//!     let f = x.map(|v: f64| (v - 3.0).powi(2)).sum();
//!     match lbfgs.step(&mut x, f, &g, false, &mut diag)? {
//!         Status::NeedEvaluation => continue,
//!         status => break status,
//!     }
//! };
//! assert_eq!(status, Status::Converged);
//! assert!((lbfgs.x_cache()[0] - 3.0).abs() < 1e-4);
//! # Ok::<(), lbfgsrc_optim::LbfgsError>(())
//! ```

pub mod config;
pub mod driver;
pub mod history;
pub mod lbfgs;
pub mod status;

pub use config::LbfgsConfig;
pub use driver::{minimize, OptimizationResult, StoppingCriterion, TerminationReason};
pub use history::CorrectionHistory;
pub use lbfgs::Lbfgs;
pub use status::{Failure, Status};

// Re-export commonly used items from core
pub use lbfgsrc_core::{
    error::{LbfgsError, Result},
    line_search::{LineSearchParams, LineSearchStatus},
};
