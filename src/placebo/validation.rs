//! placebo::validation — shared input guards for the placebo engine.
//!
//! Purpose
//! -------
//! Centralize basic input validation for the placebo inference engine.
//! This avoids duplicating checks on effect-matrix shapes, data
//! finiteness, and the confidence level across the engine and result
//! modules.
//!
//! Key behaviors
//! -------------
//! - Enforce shape preconditions on effect matrices before expensive
//!   combinatorial work is performed.
//! - Map invalid inputs into structured `PlaceboError` values for
//!   consistent error handling in Rust and Python bindings.
//!
//! Invariants & assumptions
//! ------------------------
//! - Effect matrices have rows = units and columns = post-treatment
//!   periods; both matrices must agree on the period count.
//! - The control pool must be at least as large as the treated group so
//!   that size-N1 combinations can be drawn.
//! - All effect values must be finite (`!NaN`, not ±∞).
//! - The confidence level, when checked, must satisfy `0 < level < 1`.
//!
//! Conventions
//! -----------
//! - This module is purely about *validation*; it performs no I/O and does
//!   not allocate beyond what is required for error construction.
//! - Errors are reported via the crate-local `PlaceboError` enum, which is
//!   also convertible to `PyErr` in Python-facing layers.
//! - Shape failures are raised explicitly here; the engine never relies on
//!   a container library raising incidentally.
//!
//! Downstream usage
//! ----------------
//! - Call [`validate_effect_matrices`] at the top of
//!   `PlaceboOutcome::run` before computing per-unit aggregates.
//! - Call [`validate_level`] only when confidence intervals are requested;
//!   the level is ignored otherwise.
//! - Treat a successful return (`Ok(())`) as a guarantee that basic shape
//!   and finiteness constraints are satisfied.
//!
//! Testing notes
//! -------------
//! - Unit tests in this module cover all error branches of
//!   [`validate_effect_matrices`] and [`validate_level`] plus simple
//!   success paths.

use crate::placebo::errors::{PlaceboError, PlaceboResult};
use ndarray::Array2;

/// Validate shape and finiteness constraints for placebo effect matrices.
///
/// Parameters
/// ----------
/// - `control_effects`: `&Array2<f64>`
///   Control-unit effects with shape (N0, T1). Must have at least as many
///   rows as `treated_effects` and the same period count.
/// - `treated_effects`: `&Array2<f64>`
///   Treated-unit effects with shape (N1, T1). Must have at least one row
///   and at least one period.
///
/// Returns
/// -------
/// `PlaceboResult<()>`
///   - `Ok(())` if all shape and finiteness constraints are satisfied.
///   - `Err(PlaceboError)` if any constraint is violated, with a variant
///     that encodes which condition failed.
///
/// Errors
/// ------
/// - `PlaceboError::EmptyPeriods`
///   Returned when `treated_effects` has zero columns (T1 = 0).
/// - `PlaceboError::PeriodMismatch`
///   Returned when the matrices disagree on the period count.
/// - `PlaceboError::NoTreatedUnits`
///   Returned when `treated_effects` has zero rows.
/// - `PlaceboError::NotEnoughControls`
///   Returned when N0 < N1, so no size-N1 control combination exists.
/// - `PlaceboError::NonFiniteEffect(value)`
///   Returned when any entry of either matrix is not finite, with `value`
///   set to the offending entry.
///
/// Panics
/// ------
/// - Never panics. All failures are reported via `PlaceboError`.
///
/// Notes
/// -----
/// - Checks are ordered so that structural problems (shapes) surface
///   before data problems (finiteness).
/// - Validation is O(N0·T1 + N1·T1) due to the finiteness scan; this is
///   negligible next to the combinatorial aggregation that follows.
pub fn validate_effect_matrices(
    control_effects: &Array2<f64>, treated_effects: &Array2<f64>,
) -> PlaceboResult<()> {
    let t1 = treated_effects.ncols();
    if t1 == 0 {
        return Err(PlaceboError::EmptyPeriods);
    }
    if control_effects.ncols() != t1 {
        return Err(PlaceboError::PeriodMismatch {
            control: control_effects.ncols(),
            treated: t1,
        });
    }
    if treated_effects.nrows() == 0 {
        return Err(PlaceboError::NoTreatedUnits);
    }
    if control_effects.nrows() < treated_effects.nrows() {
        return Err(PlaceboError::NotEnoughControls {
            controls: control_effects.nrows(),
            treated: treated_effects.nrows(),
        });
    }

    for &value in treated_effects.iter().chain(control_effects.iter()) {
        if !value.is_finite() {
            return Err(PlaceboError::NonFiniteEffect(value));
        }
    }

    Ok(())
}

/// Validate that a confidence level lies strictly between 0 and 1.
///
/// Parameters
/// ----------
/// - `level`: `f64`
///   Requested confidence level (1 − α), e.g. `0.95`.
///
/// Returns
/// -------
/// `PlaceboResult<()>`
///   - `Ok(())` when `0.0 < level < 1.0`.
///   - `Err(PlaceboError::InvalidLevel(level))` otherwise, including for
///     non-finite values.
///
/// Panics
/// ------
/// - Never panics.
///
/// Notes
/// -----
/// - Only invoked when confidence intervals are requested; a placebo run
///   without intervals ignores the level entirely.
pub fn validate_level(level: f64) -> PlaceboResult<()> {
    if !(level > 0.0 && level < 1.0) {
        return Err(PlaceboError::InvalidLevel(level));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Successful validation of well-formed effect matrices and levels.
    // - Each error branch in `validate_effect_matrices`:
    //   * zero periods,
    //   * period mismatch,
    //   * zero treated units,
    //   * fewer controls than treated units,
    //   * non-finite effect values.
    // - Rejection of out-of-range and non-finite levels.
    //
    // They intentionally DO NOT cover:
    // - The engine's use of these guards, which is exercised by the
    //   engine's own tests and the integration suite.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `validate_effect_matrices` succeeds on conforming
    // matrices (N0 ≥ N1, equal T1, finite entries).
    //
    // Given
    // -----
    // - A 4×3 control matrix and a 2×3 treated matrix of finite values.
    //
    // Expect
    // ------
    // - `validate_effect_matrices` returns `Ok(())`.
    fn validate_effect_matrices_valid_shapes_succeeds() {
        // Arrange
        let control = Array2::from_elem((4, 3), 0.5);
        let treated = Array2::from_elem((2, 3), -0.25);

        // Act
        let result = validate_effect_matrices(&control, &treated);

        // Assert
        assert!(result.is_ok(), "Expected Ok(()) for valid matrices, got {result:?}");
    }

    #[test]
    // Purpose
    // -------
    // Ensure that matrices with zero post-treatment periods are rejected
    // with `PlaceboError::EmptyPeriods`.
    //
    // Given
    // -----
    // - A 4×0 control matrix and a 2×0 treated matrix.
    //
    // Expect
    // ------
    // - `validate_effect_matrices` returns `Err(PlaceboError::EmptyPeriods)`.
    fn validate_effect_matrices_zero_periods_returns_empty_periods() {
        // Arrange
        let control = Array2::<f64>::zeros((4, 0));
        let treated = Array2::<f64>::zeros((2, 0));

        // Act
        let result = validate_effect_matrices(&control, &treated);

        // Assert
        match result {
            Err(PlaceboError::EmptyPeriods) => (),
            other => panic!("expected EmptyPeriods error, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that disagreeing period counts are rejected with
    // `PlaceboError::PeriodMismatch` carrying both counts.
    //
    // Given
    // -----
    // - A 4×3 control matrix and a 2×2 treated matrix.
    //
    // Expect
    // ------
    // - `validate_effect_matrices` returns
    //   `Err(PlaceboError::PeriodMismatch { control: 3, treated: 2 })`.
    fn validate_effect_matrices_period_mismatch_returns_period_mismatch() {
        // Arrange
        let control = Array2::<f64>::zeros((4, 3));
        let treated = Array2::<f64>::zeros((2, 2));

        // Act
        let result = validate_effect_matrices(&control, &treated);

        // Assert
        match result {
            Err(PlaceboError::PeriodMismatch { control: c, treated: t }) => {
                assert_eq!((c, t), (3, 2), "Payload should carry both period counts.");
            }
            other => panic!("expected PeriodMismatch error, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure that a treated matrix with zero rows is rejected with
    // `PlaceboError::NoTreatedUnits`.
    //
    // Given
    // -----
    // - A 4×3 control matrix and a 0×3 treated matrix.
    //
    // Expect
    // ------
    // - `validate_effect_matrices` returns `Err(PlaceboError::NoTreatedUnits)`.
    fn validate_effect_matrices_zero_treated_returns_no_treated_units() {
        // Arrange
        let control = Array2::<f64>::zeros((4, 3));
        let treated = Array2::<f64>::zeros((0, 3));

        // Act
        let result = validate_effect_matrices(&control, &treated);

        // Assert
        match result {
            Err(PlaceboError::NoTreatedUnits) => (),
            other => panic!("expected NoTreatedUnits error, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that a control pool smaller than the treated group is
    // rejected with `PlaceboError::NotEnoughControls`.
    //
    // Given
    // -----
    // - A 3×4 control matrix and a 5×4 treated matrix (N0 = 3 < N1 = 5).
    //
    // Expect
    // ------
    // - `validate_effect_matrices` returns
    //   `Err(PlaceboError::NotEnoughControls { controls: 3, treated: 5 })`.
    fn validate_effect_matrices_fewer_controls_returns_not_enough_controls() {
        // Arrange
        let control = Array2::<f64>::zeros((3, 4));
        let treated = Array2::<f64>::zeros((5, 4));

        // Act
        let result = validate_effect_matrices(&control, &treated);

        // Assert
        match result {
            Err(PlaceboError::NotEnoughControls { controls, treated: t }) => {
                assert_eq!((controls, t), (3, 5), "Payload should carry both unit counts.");
            }
            other => panic!("expected NotEnoughControls error, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that any non-finite value (e.g., NaN) in either matrix
    // triggers `PlaceboError::NonFiniteEffect` with the offending payload.
    //
    // Given
    // -----
    // - A control matrix containing a `NaN` and a conforming treated
    //   matrix.
    //
    // Expect
    // ------
    // - `validate_effect_matrices` returns
    //   `Err(PlaceboError::NonFiniteEffect(value))` with a non-finite
    //   payload.
    fn validate_effect_matrices_non_finite_value_returns_non_finite_effect() {
        // Arrange
        let mut control = Array2::<f64>::zeros((4, 2));
        control[[1, 0]] = f64::NAN;
        let treated = Array2::<f64>::zeros((2, 2));

        // Act
        let result = validate_effect_matrices(&control, &treated);

        // Assert
        match result {
            Err(PlaceboError::NonFiniteEffect(v)) => {
                assert!(!v.is_finite(), "NonFiniteEffect payload should be non-finite. Got: {v}");
            }
            other => panic!("expected NonFiniteEffect error, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that `validate_level` accepts interior levels and rejects
    // boundary, exterior, and non-finite levels.
    //
    // Given
    // -----
    // - Levels 0.95 (valid), 0.0, 1.0, -0.1, and NaN (all invalid).
    //
    // Expect
    // ------
    // - `Ok(())` for 0.95; `Err(PlaceboError::InvalidLevel(..))` for the
    //   rest.
    fn validate_level_boundary_and_exterior_levels_are_rejected() {
        // Arrange
        let invalid = [0.0_f64, 1.0, -0.1, f64::NAN];

        // Act & Assert
        assert!(validate_level(0.95).is_ok());
        for level in invalid {
            match validate_level(level) {
                Err(PlaceboError::InvalidLevel(_)) => (),
                other => panic!("expected InvalidLevel error for {level}, got {other:?}"),
            }
        }
    }
}
