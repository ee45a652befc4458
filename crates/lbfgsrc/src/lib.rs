//! # lbfgsrc
//!
//! Unconstrained minimization with the limited-memory BFGS method, driven by
//! reverse communication: the minimizer never calls your objective. It tells
//! you where to evaluate, you hand back the value and gradient, and it
//! resumes where it left off. This makes it easy to embed in code that owns
//! its own evaluation loop (simulations, remote evaluations, refinement
//! programs).
//!
//! The line search is a safeguarded cubic/quadratic interpolation scheme in
//! the style of Moré and Thuente, enforcing the sufficient decrease and
//! curvature conditions.
//!
//! ## Crates
//!
//! - [`lbfgsrc_core`]: scalar trait, errors, diagnostics, the objective trait and
//!   the line search
//! - [`lbfgsrc_optim`]: the `Lbfgs` state machine, its configuration and the
//!   `minimize` driver
//!
//! ## Quick Start
//!
//! ```rust
//! use lbfgsrc::prelude::*;
//!
//! #[derive(Debug)]
//! struct Booth;
//!
//! impl CostFunction<f64> for Booth {
//!     fn dimension(&self) -> usize {
//!         2
//!     }
//!
//!     fn cost_and_gradient(&self, x: &DVector<f64>, g: &mut DVector<f64>) -> Result<f64> {
//!         let a = x[0] + 2.0 * x[1] - 7.0;
//!         let b = 2.0 * x[0] + x[1] - 5.0;
//!         g[0] = 2.0 * a + 4.0 * b;
//!         g[1] = 4.0 * a + 2.0 * b;
//!         Ok(a * a + b * b)
//!     }
//! }
//!
//! let x0 = DVector::zeros(2);
//! let result = minimize(&Booth, &x0, LbfgsConfig::default(), &StoppingCriterion::new())?;
//!
//! assert!(result.converged);
//! assert!((result.point[0] - 1.0).abs() < 1e-4);
//! assert!((result.point[1] - 3.0).abs() < 1e-4);
//! # Ok::<(), LbfgsError>(())
//! ```

pub use lbfgsrc_core;
pub use lbfgsrc_optim;
pub use nalgebra;

pub use lbfgsrc_core::{LbfgsError, Result};
pub use lbfgsrc_optim::{minimize, Lbfgs, LbfgsConfig, Status};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use lbfgsrc_core::prelude::*;
    pub use lbfgsrc_optim::{
        minimize, Failure, Lbfgs, LbfgsConfig, OptimizationResult, Status, StoppingCriterion,
        TerminationReason,
    };
}
