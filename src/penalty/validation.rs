//! penalty::validation — input guards for the penalty-bounds solver.
//!
//! Purpose
//! -------
//! Centralize the shape and argument-combination checks shared by the
//! solver entry points so each constraint is enforced once, with a named
//! error cause, before any gradient evaluation starts.
//!
//! Key behaviors
//! -------------
//! - [`validate_penalty_inputs`] checks the treated-pair combination
//!   first, then the control blocks, then the treated blocks against
//!   their control counterparts.
//! - [`validate_v_pen`] guards the covariate penalty used to rescale the
//!   weight-penalty boundary; non-finite values fail the same check as
//!   non-positive ones.
//!
//! Invariants & assumptions
//! ------------------------
//! - On `Ok(())` from [`validate_penalty_inputs`], the solver may stack
//!   treated blocks under their control counterparts without further
//!   shape checks.
//! - Guards never panic; every user-facing failure is a
//!   [`PenaltyError`](crate::penalty::errors::PenaltyError) value.
//!
//! Conventions
//! -----------
//! - Matrix names in error payloads are the caller-facing argument names
//!   (`"X"`, `"Y"`, `"X_treat"`, `"Y_treat"`).
//!
//! Downstream usage
//! ----------------
//! - `penalty::bounds` calls these guards at the top of every entry
//!   point.
//!
//! Testing notes
//! -------------
//! - Unit tests cover every guard branch, including the accept path with
//!   and without a treated pair.

use crate::penalty::errors::{PenaltyError, PenaltyResult};
use ndarray::Array2;

/// Validate the design matrices and treated-block combination for a
/// penalty-boundary search.
///
/// Parameters
/// ----------
/// - `x`, `y`: `&Array2<f64>`
///   Control-block covariate and outcome matrices; must share a row
///   count and each carry at least one column.
/// - `x_treat`, `y_treat`: `Option<&Array2<f64>>`
///   Optional treated blocks; must be supplied together, share a row
///   count with each other, and match their control counterparts'
///   column counts.
///
/// Returns
/// -------
/// `PenaltyResult<()>`
///   - `Ok(())` when every constraint holds.
///   - `Err(PenaltyError)` naming the first violated constraint.
///
/// Errors
/// ------
/// - `PenaltyError::TreatedPairMismatch`
///   Exactly one treated block was supplied.
/// - `PenaltyError::EmptyColumns`
///   A matrix has zero columns.
/// - `PenaltyError::RowCountMismatch` / `TreatedRowCountMismatch`
///   Covariates and outcomes disagree on unit counts.
/// - `PenaltyError::TreatedColumnMismatch`
///   A treated block disagrees with its control counterpart on columns.
pub fn validate_penalty_inputs(
    x: &Array2<f64>, y: &Array2<f64>, x_treat: Option<&Array2<f64>>,
    y_treat: Option<&Array2<f64>>,
) -> PenaltyResult<()> {
    if x_treat.is_some() != y_treat.is_some() {
        return Err(PenaltyError::TreatedPairMismatch);
    }
    if x.ncols() == 0 {
        return Err(PenaltyError::EmptyColumns { name: "X" });
    }
    if y.ncols() == 0 {
        return Err(PenaltyError::EmptyColumns { name: "Y" });
    }
    if x.nrows() != y.nrows() {
        return Err(PenaltyError::RowCountMismatch { x_rows: x.nrows(), y_rows: y.nrows() });
    }
    if let (Some(xt), Some(yt)) = (x_treat, y_treat) {
        if xt.ncols() == 0 {
            return Err(PenaltyError::EmptyColumns { name: "X_treat" });
        }
        if yt.ncols() == 0 {
            return Err(PenaltyError::EmptyColumns { name: "Y_treat" });
        }
        if xt.nrows() != yt.nrows() {
            return Err(PenaltyError::TreatedRowCountMismatch {
                x_rows: xt.nrows(),
                y_rows: yt.nrows(),
            });
        }
        if xt.ncols() != x.ncols() {
            return Err(PenaltyError::TreatedColumnMismatch {
                name: "X_treat",
                expected: x.ncols(),
                found: xt.ncols(),
            });
        }
        if yt.ncols() != y.ncols() {
            return Err(PenaltyError::TreatedColumnMismatch {
                name: "Y_treat",
                expected: y.ncols(),
                found: yt.ncols(),
            });
        }
    }
    Ok(())
}

/// Validate the covariate penalty used to rescale the weight-penalty
/// boundary.
///
/// Parameters
/// ----------
/// - `v_pen`: `f64`
///   Must be finite and strictly positive; NaN and infinities fail.
///
/// Returns
/// -------
/// `PenaltyResult<()>`
///   - `Ok(())` when `v_pen` is finite and `> 0`.
///   - `Err(PenaltyError::InvalidVPen)` otherwise.
pub fn validate_v_pen(v_pen: f64) -> PenaltyResult<()> {
    if !v_pen.is_finite() || v_pen <= 0.0 {
        return Err(PenaltyError::InvalidVPen(v_pen));
    }
    Ok(())
}
