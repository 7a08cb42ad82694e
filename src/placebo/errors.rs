//! placebo::errors — shared error types and Python bridges.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias for the placebo inference
//! engine, together with a conversion layer to Python exceptions for
//! PyO3-based bindings. This keeps shape validation and interval-usage
//! failures localized while exposing a clean error surface to both Rust
//! and Python.
//!
//! Key behaviors
//! -------------
//! - Define [`PlaceboResult`] and [`PlaceboError`] as the canonical result
//!   and error types for the placebo test and its validation helpers.
//! - Attach human-readable `Display` messages to each error variant so that
//!   diagnostics and logs are meaningful without additional context.
//! - Implement `From<PlaceboError> for PyErr` to map Rust-side validation
//!   and usage errors into `PyValueError` values visible to Python callers.
//!
//! Invariants & assumptions
//! ------------------------
//! - Placebo modules which use this error type validate their inputs
//!   (matrix shapes, finiteness, confidence level) and return
//!   [`PlaceboResult<T>`] instead of panicking.
//! - `PlaceboError` values are small, cheap to clone, and suitable for use
//!   in both unit tests and higher-level orchestration code.
//! - The Python-facing conversion preserves the Rust error message verbatim
//!   inside the `PyValueError` string representation.
//!
//! Conventions
//! -----------
//! - This module is focused on placebo-inference errors; penalty-solver
//!   error types live in their own `errors` module under `penalty`.
//! - Error messages are phrased in terms of domain constraints (e.g.,
//!   "level must lie strictly between 0 and 1") rather than low-level
//!   details.
//! - Misuse of the confidence-interval surface (membership queries on
//!   vector-valued or absent intervals) is a reported usage failure, never
//!   a silent `false`.
//!
//! Downstream usage
//! ----------------
//! - The placebo engine and its validation helpers return
//!   [`PlaceboResult<T>`] to propagate failures cleanly to callers.
//! - Python bindings rely on `From<PlaceboError> for PyErr` to raise
//!   `ValueError` instances instead of returning [`PlaceboResult`]
//!   explicitly.
//! - Higher-level Rust code may match on [`PlaceboError`] variants to
//!   implement custom recovery or reporting behavior.
//!
//! Testing notes
//! -------------
//! - Unit tests in this module verify that each [`PlaceboError`] variant's
//!   `Display` message embeds its payload (offending level, shape counts).
//! - The validation and engine modules exercise these errors indirectly
//!   through their own branch tests.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for placebo-inference operations.
pub type PlaceboResult<T> = Result<T, PlaceboError>;

/// PlaceboError — error conditions for the placebo inference engine.
///
/// Purpose
/// -------
/// Represent all validation and usage failures that can occur when running
/// a placebo test or querying its results, including malformed effect
/// matrices, out-of-range confidence levels, and interval misuse.
///
/// Variants
/// --------
/// - `EmptyPeriods`
///   The effect matrices have zero post-treatment periods (T1 = 0), so no
///   aggregate can be formed.
/// - `PeriodMismatch { control: usize, treated: usize }`
///   The control and treated matrices disagree on the number of
///   post-treatment periods.
/// - `NoTreatedUnits`
///   The treated effect matrix has zero rows; at least one treated unit is
///   required to define an observed effect.
/// - `NotEnoughControls { controls: usize, treated: usize }`
///   Fewer control units than treated units, so no size-N1 combination can
///   be drawn from the control pool.
/// - `NonFiniteEffect(value: f64)`
///   An effect entry is non-finite (NaN or ±∞) and cannot enter the
///   permutation aggregates.
/// - `InvalidLevel(level: f64)`
///   The confidence level does not lie strictly between 0 and 1 while a
///   confidence interval was requested.
/// - `InsufficientDraws { alpha_ind: usize, n_placebo: usize }`
///   The requested level needs the rank-`alpha_ind` order statistic from
///   each tail of the placebo distribution, but fewer draws were retained
///   than the two tails need between them; constructing the interval
///   anyway would cross its bounds. Raising `max_combinations` or
///   lowering the level resolves it.
/// - `LengthMismatch { expected: usize, found: usize }`
///   Aligned per-replication arrays disagree on length.
/// - `MissingInterval`
///   A membership query was issued against an estimate that carries no
///   confidence interval.
/// - `VectorInterval`
///   A scalar membership query was issued against a per-period (vector)
///   confidence interval.
///
/// Invariants
/// ----------
/// - Each variant carries just enough information (offending value or
///   shape counts) to allow downstream logging and debugging without
///   leaking large data structures.
/// - `NotEnoughControls` is only emitted when `controls < treated`.
///
/// Notes
/// -----
/// - This enum implements [`std::error::Error`] and [`std::fmt::Display`]
///   so it can be used with idiomatic `?`-based error propagation in Rust.
/// - A blanket [`From<PlaceboError> for PyErr`] implementation maps all of
///   these cases to `PyValueError` at the Python boundary, with the
///   human-readable message taken from the `Display` implementation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceboError {
    //------ Input validation errors ------
    EmptyPeriods,
    PeriodMismatch { control: usize, treated: usize },
    NoTreatedUnits,
    NotEnoughControls { controls: usize, treated: usize },
    NonFiniteEffect(f64),
    InvalidLevel(f64),
    InsufficientDraws { alpha_ind: usize, n_placebo: usize },
    LengthMismatch { expected: usize, found: usize },
    //------ Result usage errors ------
    MissingInterval,
    VectorInterval,
}

impl std::error::Error for PlaceboError {}

impl std::fmt::Display for PlaceboError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceboError::EmptyPeriods => {
                write!(f, "Effect matrices must have at least one post-treatment period.")
            }
            PlaceboError::PeriodMismatch { control, treated } => {
                write!(
                    f,
                    "Control and treated effects have different period counts ({control} and {treated})."
                )
            }
            PlaceboError::NoTreatedUnits => {
                write!(f, "Treated effect matrix must have at least one unit.")
            }
            PlaceboError::NotEnoughControls { controls, treated } => {
                write!(
                    f,
                    "Need at least as many control units as treated units ({controls} controls, {treated} treated)."
                )
            }
            PlaceboError::NonFiniteEffect(value) => {
                write!(f, "Invalid effect value: {value}. Must be a finite number.")
            }
            PlaceboError::InvalidLevel(level) => {
                write!(f, "Invalid level: {level}. Must lie strictly between 0 and 1.")
            }
            PlaceboError::InsufficientDraws { alpha_ind, n_placebo } => {
                write!(
                    f,
                    "Confidence level requires the rank-{alpha_ind} order statistic from each tail, but only {n_placebo} placebo draws are available. Increase max_combinations or lower the level."
                )
            }
            PlaceboError::LengthMismatch { expected, found } => {
                write!(f, "Aligned arrays have different lengths ({expected} expected, {found} found).")
            }
            PlaceboError::MissingInterval => {
                write!(f, "Estimate does not carry a confidence interval.")
            }
            PlaceboError::VectorInterval => {
                write!(f, "Membership is not defined for a per-period confidence interval.")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<PlaceboError> for PyErr {
    fn from(err: PlaceboError) -> PyErr {
        PyValueError::new_err(format!("PlaceboError: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Basic `Display` formatting for PlaceboError variants.
    // - Embedding of payload values (level, shape counts) into messages.
    //
    // They intentionally DO NOT cover:
    // - The `From<PlaceboError> for PyErr` conversion, since exercising it
    //   requires linking against the Python C API and is better handled
    //   by Python-level tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `PlaceboError::InvalidLevel` includes the offending
    // level in its `Display` representation.
    //
    // Given
    // -----
    // - A `PlaceboError::InvalidLevel` with level = 1.5.
    //
    // Expect
    // ------
    // - `format!("{err}")` contains "1.5".
    fn placebo_error_invalid_level_includes_payload_in_display() {
        // Arrange
        let err = PlaceboError::InvalidLevel(1.5);

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("1.5"), "Display message should include offending level.\nGot: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Verify that `PlaceboError::NotEnoughControls` reports both shape
    // counts in its `Display` representation.
    //
    // Given
    // -----
    // - A `PlaceboError::NotEnoughControls` with 3 controls, 5 treated.
    //
    // Expect
    // ------
    // - `format!("{err}")` contains "3" and "5".
    fn placebo_error_not_enough_controls_includes_counts_in_display() {
        // Arrange
        let err = PlaceboError::NotEnoughControls { controls: 3, treated: 5 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(
            msg.contains('3') && msg.contains('5'),
            "Display message should include both unit counts.\nGot: {msg}"
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify that `PlaceboError::InsufficientDraws` embeds both counts
    // and actionable advice, and `PlaceboError::LengthMismatch` embeds
    // both lengths.
    //
    // Given
    // -----
    // - An `InsufficientDraws` with rank 102 over 50 draws and a
    //   `LengthMismatch` with 8 expected, 7 found.
    //
    // Expect
    // ------
    // - The draw message names both counts and `max_combinations`; the
    //   length message names both lengths.
    fn placebo_error_draw_and_length_variants_include_payloads_in_display() {
        // Arrange
        let draws = PlaceboError::InsufficientDraws { alpha_ind: 102, n_placebo: 50 };
        let lengths = PlaceboError::LengthMismatch { expected: 8, found: 7 };

        // Act
        let draws_msg = draws.to_string();
        let lengths_msg = lengths.to_string();

        // Assert
        assert!(
            draws_msg.contains("102")
                && draws_msg.contains("50")
                && draws_msg.contains("max_combinations"),
            "Got: {draws_msg}"
        );
        assert!(lengths_msg.contains('8') && lengths_msg.contains('7'), "Got: {lengths_msg}");
    }

    #[test]
    // Purpose
    // -------
    // Ensure that the interval-misuse variants format to non-empty,
    // human-readable messages.
    //
    // Given
    // -----
    // - `PlaceboError::MissingInterval` and `PlaceboError::VectorInterval`.
    //
    // Expect
    // ------
    // - Both `Display` messages are non-empty.
    fn placebo_error_interval_misuse_variants_have_nonempty_display() {
        // Arrange
        let missing = PlaceboError::MissingInterval;
        let vector = PlaceboError::VectorInterval;

        // Act & Assert
        assert!(!missing.to_string().trim().is_empty());
        assert!(!vector.to_string().trim().is_empty());
    }
}
