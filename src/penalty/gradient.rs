//! penalty::gradient — the gradient-evaluation seam.
//!
//! Purpose
//! -------
//! Define the interface between the penalty-bounds solver and the
//! synthetic-control fitting machinery: the solver decides WHICH
//! cross-validation strategy applies and WHAT question to ask (a fitted
//! tensor or the penalty boundary), while a [`GradientEvaluator`]
//! implementation answers it. Keeping the seam as a trait lets the
//! solver be tested against lightweight mock evaluators and lets
//! alternative fitting backends plug in without touching the solver.
//!
//! Key behaviors
//! -------------
//! - Enumerate the three cross-validation strategies as
//!   [`GradientStrategy`], with stable human-readable names used in
//!   error messages.
//! - Describe one evaluation as a [`GradientRequest`] — borrowed design
//!   matrices, the weight penalty, the evaluation mode, a progress
//!   label, and the optional partitioning controls.
//! - Type the answer as [`GradientOutput`] so a boundary request cannot
//!   silently receive a tensor (the solver rejects the mismatch as a
//!   contract violation).
//! - Separate evaluator-side failures ([`GradientError`]) from the
//!   solver's error taxonomy; translating out-of-memory conditions into
//!   actionable advice is the solver's job.
//!
//! Invariants & assumptions
//! ------------------------
//! - Requests reference validated matrices; evaluators may assume
//!   matching row counts and at least one column.
//! - `control_units`/`treated_units` are set together and only under the
//!   held-out-treated strategy, where they partition the rows of the
//!   stacked design matrices.
//! - `grad_splits` is meaningful only for the cross-fold strategy.
//!
//! Conventions
//! -----------
//! - Strategy `Display` names are lowercase and hyphenated; error
//!   messages interpolate them directly.
//!
//! Downstream usage
//! ----------------
//! - `penalty::bounds` builds requests and dispatches on the argument
//!   shape; production evaluators live with the fitting machinery, and
//!   the test suites substitute mocks.
//!
//! Testing notes
//! -------------
//! - Unit tests here pin the strategy `Display` names; the dispatch and
//!   translation logic is tested in `penalty::bounds` against mock
//!   evaluators.

use ndarray::{Array2, ArrayView2};

/// GradientStrategy — which cross-validation scheme evaluates the
/// gradient.
///
/// Variants
/// --------
/// - `LeaveOneOut`
///   Each control unit is held out in turn; the default when no treated
///   block and no partition count are supplied.
/// - `CrossFold`
///   The controls are split into `grad_splits` folds.
/// - `HeldOutTreated`
///   The treated block is held out as a whole; selected whenever a
///   treated pair is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientStrategy {
    LeaveOneOut,
    CrossFold,
    HeldOutTreated,
}

impl std::fmt::Display for GradientStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradientStrategy::LeaveOneOut => write!(f, "leave-one-out"),
            GradientStrategy::CrossFold => write!(f, "cross-fold"),
            GradientStrategy::HeldOutTreated => write!(f, "held-out-treated"),
        }
    }
}

/// EvaluationMode — what the solver is asking the evaluator for.
///
/// Variants
/// --------
/// - `FittedTensor`
///   Fit and return the full covariate-weight tensor at the given
///   penalties.
/// - `PenaltyBoundary`
///   Return only the smallest covariate penalty at which the fitted
///   tensor collapses to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    FittedTensor,
    PenaltyBoundary,
}

/// GradientRequest — one gradient evaluation, fully described.
///
/// Fields
/// ------
/// - `x`, `y`: `ArrayView2<f64>`
///   Borrowed covariate and outcome matrices. Under the
///   held-out-treated strategy these are the STACKED control + treated
///   blocks; otherwise the control blocks alone.
/// - `w_pen`: `f64`
///   The weight penalty at which to evaluate.
/// - `mode`: [`EvaluationMode`]
///   Fitted tensor or penalty boundary.
/// - `progress_label`: `&'static str`
///   A short label evaluators may surface in their own progress
///   reporting.
/// - `grad_splits`: `Option<usize>`
///   Fold count; set only under the cross-fold strategy.
/// - `control_units`, `treated_units`: `Option<&[usize]>`
///   Row-index partitions of the stacked matrices; set together and only
///   under the held-out-treated strategy.
#[derive(Debug, Clone)]
pub struct GradientRequest<'a> {
    pub x: ArrayView2<'a, f64>,
    pub y: ArrayView2<'a, f64>,
    pub w_pen: f64,
    pub mode: EvaluationMode,
    pub progress_label: &'static str,
    pub grad_splits: Option<usize>,
    pub control_units: Option<&'a [usize]>,
    pub treated_units: Option<&'a [usize]>,
}

/// GradientOutput — the evaluator's typed answer.
///
/// Variants
/// --------
/// - `Tensor(Array2<f64>)`
///   The fitted covariate-weight tensor (for `FittedTensor` requests).
/// - `Boundary(f64)`
///   The smallest zeroing covariate penalty (for `PenaltyBoundary`
///   requests).
#[derive(Debug, Clone, PartialEq)]
pub enum GradientOutput {
    Tensor(Array2<f64>),
    Boundary(f64),
}

/// GradientError — failures on the evaluator's side of the seam.
///
/// Variants
/// --------
/// - `Numeric(message: String)`
///   A numeric failure (singular systems, non-convergence); the message
///   is preserved for the solver's error surface.
/// - `OutOfMemory`
///   The evaluation exceeded available memory; the solver translates
///   this into partitioning advice where partitioning exists.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientError {
    Numeric(String),
    OutOfMemory,
}

impl std::error::Error for GradientError {}

impl std::fmt::Display for GradientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradientError::Numeric(message) => write!(f, "{message}"),
            GradientError::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

/// GradientEvaluator — the fitting backend the solver drives.
///
/// Notes
/// -----
/// - Implementations must honor `request.mode`: a `PenaltyBoundary`
///   request answered with `GradientOutput::Tensor` is rejected by the
///   solver as a contract violation.
pub trait GradientEvaluator {
    fn evaluate(
        &self, strategy: GradientStrategy, request: &GradientRequest<'_>,
    ) -> Result<GradientOutput, GradientError>;
}
