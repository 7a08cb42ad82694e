//! penalty::errors — shared error types and Python bridges.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias for the penalty-bounds solver,
//! together with a conversion layer to Python exceptions for PyO3-based
//! bindings. Shape validation, invalid-argument combinations, and
//! gradient-evaluation failures are all surfaced through one type so the
//! solver's entry points propagate with `?`.
//!
//! Key behaviors
//! -------------
//! - Define [`PenaltyResult`] and [`PenaltyError`] as the canonical result
//!   and error types for the penalty solver and its validation helpers.
//! - Attach human-readable `Display` messages to each error variant,
//!   including the actionable out-of-memory message advising `grad_splits`.
//! - Implement `From<PenaltyError> for PyErr` to map Rust-side failures
//!   into `PyValueError` values visible to Python callers.
//!
//! Invariants & assumptions
//! ------------------------
//! - Penalty modules which use this error type validate their inputs
//!   (matrix shapes, treated-pair combinations, penalty positivity) and
//!   return [`PenaltyResult<T>`] instead of panicking.
//! - Gradient-evaluation failures arrive as
//!   [`GradientError`](crate::penalty::gradient::GradientError) values and
//!   are translated here into strategy-aware variants; the translation is
//!   the solver's, not the evaluator's, responsibility.
//!
//! Conventions
//! -----------
//! - This module is focused on penalty-solver errors; placebo-inference
//!   error types live in their own `errors` module under `placebo`.
//! - Error messages are phrased in terms of domain constraints (e.g.,
//!   "X and Y must have the same number of rows") rather than low-level
//!   details.
//!
//! Downstream usage
//! ----------------
//! - The solver entry points (`max_tensor_penalty`, `max_weight_penalty`)
//!   and the validation helpers return [`PenaltyResult<T>`].
//! - Higher-level Rust code may match on [`PenaltyError`] variants to
//!   distinguish recoverable memory pressure
//!   ([`PenaltyError::InsufficientMemory`]) from hard validation failures.
//!
//! Testing notes
//! -------------
//! - Unit tests in this module verify `Display` payload embedding and the
//!   wording of the memory-pressure advice.
//! - The validation and bounds modules exercise these errors indirectly
//!   through their own branch tests.

use crate::penalty::gradient::GradientStrategy;
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for penalty-solver operations.
pub type PenaltyResult<T> = Result<T, PenaltyError>;

/// PenaltyError — error conditions for the penalty-bounds solver.
///
/// Purpose
/// -------
/// Represent all validation and evaluation failures that can occur while
/// searching for the regularization boundary: malformed design matrices,
/// inconsistent treated-block arguments, non-positive penalties, and
/// gradient-evaluation breakdowns.
///
/// Variants
/// --------
/// - `EmptyColumns { name: &'static str }`
///   The named matrix (`"X"`, `"Y"`, `"X_treat"`, or `"Y_treat"`) has zero
///   columns; every design matrix must carry at least one column.
/// - `RowCountMismatch { x_rows: usize, y_rows: usize }`
///   The covariate and outcome matrices disagree on the number of units.
/// - `TreatedPairMismatch`
///   Exactly one of the treated-block matrices was supplied; they must be
///   given together or not at all.
/// - `TreatedRowCountMismatch { x_rows: usize, y_rows: usize }`
///   The treated covariate and outcome matrices disagree on the number of
///   treated units.
/// - `TreatedColumnMismatch { name: &'static str, expected: usize, found: usize }`
///   A treated-block matrix disagrees with its control-block counterpart
///   on the number of columns.
/// - `InvalidVPen(v_pen: f64)`
///   The covariate penalty used to rescale the weight-penalty boundary is
///   not strictly positive.
/// - `Gradient { text: String }`
///   The gradient evaluator reported a numeric failure; the evaluator's
///   message is preserved verbatim.
/// - `StrategyContract { text: String }`
///   The gradient evaluator violated its output contract (e.g., returned
///   a fitted tensor when a boundary scalar was requested).
/// - `InsufficientMemory { strategy: GradientStrategy }`
///   The evaluator ran out of memory under a strategy that supports
///   partitioned evaluation; the message advises setting `grad_splits`.
///
/// Invariants
/// ----------
/// - Each variant carries just enough information (matrix name, shape
///   counts, offending value) for downstream logging and debugging.
/// - `InsufficientMemory` is only constructed for strategies where
///   partitioning is available (leave-one-out and cross-fold).
///
/// Notes
/// -----
/// - This enum implements [`std::error::Error`] and [`std::fmt::Display`]
///   so it can be used with idiomatic `?`-based error propagation.
/// - A blanket [`From<PenaltyError> for PyErr`] implementation maps all of
///   these cases to `PyValueError` at the Python boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum PenaltyError {
    //------ Input validation errors ------
    EmptyColumns { name: &'static str },
    RowCountMismatch { x_rows: usize, y_rows: usize },
    TreatedPairMismatch,
    TreatedRowCountMismatch { x_rows: usize, y_rows: usize },
    TreatedColumnMismatch { name: &'static str, expected: usize, found: usize },
    InvalidVPen(f64),
    //------ Gradient evaluation errors ------
    Gradient { text: String },
    StrategyContract { text: String },
    InsufficientMemory { strategy: GradientStrategy },
}

impl std::error::Error for PenaltyError {}

impl std::fmt::Display for PenaltyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PenaltyError::EmptyColumns { name } => {
                write!(f, "{name} must have at least one column.")
            }
            PenaltyError::RowCountMismatch { x_rows, y_rows } => {
                write!(
                    f,
                    "X and Y must have the same number of rows ({x_rows} and {y_rows})."
                )
            }
            PenaltyError::TreatedPairMismatch => {
                write!(
                    f,
                    "Invalid parameter combination: X_treat and Y_treat must both be present or both be absent."
                )
            }
            PenaltyError::TreatedRowCountMismatch { x_rows, y_rows } => {
                write!(
                    f,
                    "X_treat and Y_treat must have the same number of rows ({x_rows} and {y_rows})."
                )
            }
            PenaltyError::TreatedColumnMismatch { name, expected, found } => {
                write!(
                    f,
                    "{name} must have the same number of columns as its control block ({expected} expected, {found} found)."
                )
            }
            PenaltyError::InvalidVPen(v_pen) => {
                write!(f, "Invalid covariate penalty: {v_pen}. Must be strictly positive.")
            }
            PenaltyError::Gradient { text } => {
                write!(f, "Gradient evaluation failed: {text}")
            }
            PenaltyError::StrategyContract { text } => {
                write!(f, "Gradient evaluator violated its contract: {text}")
            }
            PenaltyError::InsufficientMemory { strategy } => {
                write!(
                    f,
                    "A memory error was encountered while evaluating the {strategy} gradient. \
                     Try setting `grad_splits` to evaluate the gradient over partitions of the data."
                )
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<PenaltyError> for PyErr {
    fn from(err: PenaltyError) -> PyErr {
        PyValueError::new_err(format!("PenaltyError: {err}"))
    }
}
