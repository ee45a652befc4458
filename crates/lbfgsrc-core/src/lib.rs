//! Core types and the line search for reverse-communication L-BFGS.
//!
//! This crate provides the building blocks shared by the limited-memory
//! quasi-Newton minimizer: the scalar abstraction, the error taxonomy, the
//! diagnostic log, the objective trait used by convenience drivers and a
//! Moré–Thuente line search that never evaluates the objective itself.
//!
//! # Modules
//!
//! - [`types`]: Scalar trait and vector alias
//! - [`error`]: Error types for the minimizer and its line search
//! - [`diagnostics`]: Append-only log of recoverable conditions
//! - [`cost_function`]: Objective interface and evaluation counting
//! - [`line_search`]: Safeguarded step computation and the reverse-communicating search

pub mod cost_function;
pub mod diagnostics;
pub mod error;
pub mod line_search;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_functions;

// Re-export commonly used items at the crate root
pub use error::{LbfgsError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use lbfgsrc_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cost_function::{CostFunction, CountingCostFunction};
    #[cfg(any(test, feature = "test-utils"))]
    pub use crate::cost_function::DerivativeChecker;
    pub use crate::diagnostics::DiagnosticLog;
    pub use crate::error::{LbfgsError, Result};
    pub use crate::line_search::{
        safeguarded_step, Endpoint, LineSearchParams, LineSearchStatus, MoreThuente, StepCase,
        StepUpdate,
    };
    pub use crate::types::{DVector, Scalar};
}
