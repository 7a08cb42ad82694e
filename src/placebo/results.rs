//! placebo::results — value types for placebo-test outcomes.
//!
//! Purpose
//! -------
//! Define the read-only result surface of the placebo inference engine:
//! confidence intervals with scalar or per-period bounds, scalar and
//! vector effect estimates bundling p-values and optional placebo
//! distributions, the aggregate [`PlaceboOutcome`], the structured
//! degenerate-interval warning, and a small simulation-evaluation helper
//! operating on interval bounds.
//!
//! Key behaviors
//! -------------
//! - Represent interval bounds as an explicit scalar/per-period variant
//!   ([`IntervalBounds`]) so the membership query can reject vector
//!   intervals as a usage error instead of answering incorrectly.
//! - Bundle each effect view (per-period vector, average joint, RMS joint)
//!   with its p-value(s), optional interval, and optionally retained
//!   placebo distribution.
//! - Record the single domain warning ([`InferenceWarning`]) structurally
//!   on the outcome so callers and tests can observe it without a logger.
//! - Provide [`simulation_eval`] for scoring simulated effects against
//!   interval bounds (treatment-effect MSE, coverage, mean length).
//!
//! Invariants & assumptions
//! ------------------------
//! - Intervals satisfy `0 < level < 1`; per-period bounds have identical
//!   lengths aligned with the effect vector.
//! - Estimates are constructed once by the engine and never mutated
//!   afterwards; placebo arrays are present only when the run requested
//!   intervals or raw placebo output.
//! - `PlaceboOutcome::n_placebo` is the number of combinations actually
//!   processed, which may be smaller than C(N0, N1) in sampled mode.
//!
//! Conventions
//! -----------
//! - Membership uses strict inequalities (`low < x < high`).
//! - Misuse (membership on a vector interval or on an estimate without an
//!   interval) is reported via `PlaceboError`, never as a silent `false`.
//!
//! Downstream usage
//! ----------------
//! - The engine in `placebo::engine` constructs these values; callers
//!   read fields directly or go through [`ScalarEstimate::contains`].
//! - Simulation studies collect per-replication average effects and
//!   interval bounds and hand them to [`simulation_eval`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover scalar membership (inside, outside, boundary), both
//!   misuse error paths, warning `Display` output, and the
//!   `simulation_eval` arithmetic on a hand-checked fixture.

use crate::placebo::errors::{PlaceboError, PlaceboResult};
use ndarray::{Array1, Array2};

/// IntervalBounds — scalar or per-period confidence-interval bounds.
///
/// Variants
/// --------
/// - `Scalar { low, high }`
///   One bound pair for a scalar effect (average or RMS joint effect).
/// - `PerPeriod { low, high }`
///   Bound vectors aligned with the per-period effect vector; both arrays
///   have the same length.
///
/// Notes
/// -----
/// - The variant, not a runtime length check, is what decides whether a
///   membership query is meaningful.
#[derive(Debug, Clone, PartialEq)]
pub enum IntervalBounds {
    Scalar { low: f64, high: f64 },
    PerPeriod { low: Array1<f64>, high: Array1<f64> },
}

/// ConfidenceInterval — a (bounds, level) pair from the placebo
/// permutation distribution.
///
/// Purpose
/// -------
/// Hold the inverted permutation interval for one effect view together
/// with the confidence level it was built for.
///
/// Fields
/// ------
/// - `bounds`: [`IntervalBounds`]
///   Scalar or per-period bound pair, already flipped around the observed
///   effect (an interval for the true effect, not for the null statistic).
/// - `level`: `f64`
///   Nominal confidence level (1 − α), strictly inside (0, 1).
///
/// Invariants
/// ----------
/// - For non-degenerate placebo distributions, `low ≤ high` elementwise.
/// - `level` was validated by the engine before construction.
///
/// Notes
/// -----
/// - The realized level can differ from the nominal one because the
///   permutation distribution has granularity `2 / C(N0, N1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceInterval {
    pub bounds: IntervalBounds,
    pub level: f64,
}

impl ConfidenceInterval {
    /// Test whether a scalar value lies strictly inside the interval.
    ///
    /// Parameters
    /// ----------
    /// - `x`: `f64`
    ///   Candidate value (e.g., a hypothesized true effect).
    ///
    /// Returns
    /// -------
    /// `PlaceboResult<bool>`
    ///   - `Ok(true)` when `low < x < high` for scalar bounds.
    ///   - `Ok(false)` when `x` lies on or outside the bounds.
    ///
    /// Errors
    /// ------
    /// - `PlaceboError::VectorInterval`
    ///   Returned when the bounds are per-period; scalar membership is
    ///   undefined for vector intervals and is a usage error, not `false`.
    pub fn contains(&self, x: f64) -> PlaceboResult<bool> {
        match &self.bounds {
            IntervalBounds::Scalar { low, high } => Ok(*low < x && x < *high),
            IntervalBounds::PerPeriod { .. } => Err(PlaceboError::VectorInterval),
        }
    }
}

/// ScalarEstimate — one scalar effect view with its inference statistics.
///
/// Fields
/// ------
/// - `effect`: `f64`
///   Observed aggregate (average or RMS joint effect).
/// - `p_value`: `f64`
///   Two-sided (average) or one-sided (RMS) permutation p-value.
/// - `interval`: `Option<ConfidenceInterval>`
///   Present only when the run requested confidence intervals.
/// - `placebos`: `Option<Array1<f64>>`
///   Full placebo distribution of this aggregate, retained only when
///   intervals or raw placebo output were requested.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarEstimate {
    pub effect: f64,
    pub p_value: f64,
    pub interval: Option<ConfidenceInterval>,
    pub placebos: Option<Array1<f64>>,
}

impl ScalarEstimate {
    /// Test whether a value lies inside this estimate's interval.
    ///
    /// Errors
    /// ------
    /// - `PlaceboError::MissingInterval`
    ///   Returned when the run did not build a confidence interval.
    /// - `PlaceboError::VectorInterval`
    ///   Propagated from [`ConfidenceInterval::contains`]; cannot occur
    ///   for engine-built scalar estimates but is kept for API symmetry.
    pub fn contains(&self, x: f64) -> PlaceboResult<bool> {
        match &self.interval {
            Some(interval) => interval.contains(x),
            None => Err(PlaceboError::MissingInterval),
        }
    }
}

/// VectorEstimate — the per-period effect view with its inference
/// statistics.
///
/// Fields
/// ------
/// - `effect`: `Array1<f64>`
///   Observed per-period effect vector (column mean over treated units).
/// - `p_values`: `Array1<f64>`
///   Two-sided permutation p-value per period, aligned with `effect`.
/// - `interval`: `Option<ConfidenceInterval>`
///   Per-period interval bounds when intervals were requested.
/// - `placebos`: `Option<Array2<f64>>`
///   Retained placebo effect vectors, one row per processed combination.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorEstimate {
    pub effect: Array1<f64>,
    pub p_values: Array1<f64>,
    pub interval: Option<ConfidenceInterval>,
    pub placebos: Option<Array2<f64>>,
}

/// EffectKind — which aggregate view a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    PerPeriod,
    Average,
    Rms,
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectKind::PerPeriod => write!(f, "per-period effect"),
            EffectKind::Average => write!(f, "average joint effect"),
            EffectKind::Rms => write!(f, "RMS joint effect"),
        }
    }
}

/// InferenceWarning — non-fatal diagnostics raised during a placebo run.
///
/// Variants
/// --------
/// - `IntervalExcludesZero { effect, period }`
///   Both bounds of a zero-null interval are nonzero with the same sign,
///   so the interval cannot contain zero — a symptom of too few placebo
///   draws rather than an error. `period` is `Some(t)` for the per-period
///   view and `None` for the average view; the RMS view is exempt because
///   its null is not zero.
///
/// Notes
/// -----
/// - Warnings are both recorded on the outcome and emitted through
///   `log::warn!`; the caller's display policy is out of scope here.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceWarning {
    IntervalExcludesZero { effect: EffectKind, period: Option<usize> },
}

impl std::fmt::Display for InferenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceWarning::IntervalExcludesZero { effect, period } => match period {
                Some(t) => write!(
                    f,
                    "Confidence interval for the {effect} at period {t} doesn't contain 0. You might not have enough placebo effects."
                ),
                None => write!(
                    f,
                    "Confidence interval for the {effect} doesn't contain 0. You might not have enough placebo effects."
                ),
            },
        }
    }
}

/// PlaceboOutcome — full result of one placebo permutation test.
///
/// Purpose
/// -------
/// Bundle the three effect views with their inference statistics, the
/// number of placebo combinations actually processed, and any
/// degenerate-interval warnings raised during interval construction.
///
/// Fields
/// ------
/// - `effect_vec`: [`VectorEstimate`]
///   Per-period effect vector statistics.
/// - `avg_joint_effect`: [`ScalarEstimate`]
///   Average joint effect statistics (two-sided test).
/// - `rms_joint_effect`: [`ScalarEstimate`]
///   RMS joint effect statistics (one-sided test; RMS is non-negative by
///   construction).
/// - `n_placebo`: `usize`
///   Placebo combinations processed: `min(cap, C(N0, N1))` when the cap
///   is positive, `C(N0, N1)` otherwise.
/// - `warnings`: `Vec<InferenceWarning>`
///   Degenerate-interval warnings, empty when inference is well powered
///   or intervals were not requested.
///
/// Invariants
/// ----------
/// - All three estimates were computed over the same placebo draws.
/// - Interval and placebo fields are `Some` or `None` together with the
///   options the run was given.
///
/// Notes
/// -----
/// - Constructed via `PlaceboOutcome::run` in `placebo::engine`; this
///   module defines only the value shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceboOutcome {
    pub effect_vec: VectorEstimate,
    pub avg_joint_effect: ScalarEstimate,
    pub rms_joint_effect: ScalarEstimate,
    pub n_placebo: usize,
    pub warnings: Vec<InferenceWarning>,
}

/// SimulationEval — summary scores for a simulation study.
///
/// Fields
/// ------
/// - `te_mse`: `f64`
///   Mean squared deviation of the simulated effects from the true
///   effect.
/// - `coverage`: `f64`
///   Fraction of replications whose interval covered the true effect.
/// - `mean_ci_length`: `f64`
///   Average width of the interval across replications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationEval {
    pub te_mse: f64,
    pub coverage: f64,
    pub mean_ci_length: f64,
}

/// Score simulated effects and interval bounds against a known truth.
///
/// Parameters
/// ----------
/// - `effects`: `&Array1<f64>`
///   Estimated average effect per simulation replication.
/// - `ci_lowers`, `ci_uppers`: `&Array1<f64>`
///   Interval bounds per replication, aligned with `effects`.
/// - `true_effect`: `f64`
///   The data-generating effect the estimates are scored against.
///
/// Returns
/// -------
/// `PlaceboResult<SimulationEval>`
///   Treatment-effect MSE, interval coverage (with the closed-bound
///   convention `lower ≤ true ≤ upper`), and mean interval length.
///
/// Errors
/// ------
/// - `PlaceboError::LengthMismatch`
///   Returned when the interval arrays disagree with `effects` on the
///   number of replications.
/// - `PlaceboError::EmptyPeriods`
///   Returned when the arrays are empty, since the averages would be
///   undefined.
pub fn simulation_eval(
    effects: &Array1<f64>, ci_lowers: &Array1<f64>, ci_uppers: &Array1<f64>, true_effect: f64,
) -> PlaceboResult<SimulationEval> {
    let n = effects.len();
    if n == 0 {
        return Err(PlaceboError::EmptyPeriods);
    }
    if ci_lowers.len() != n {
        return Err(PlaceboError::LengthMismatch { expected: n, found: ci_lowers.len() });
    }
    if ci_uppers.len() != n {
        return Err(PlaceboError::LengthMismatch { expected: n, found: ci_uppers.len() });
    }

    let te_mse = effects.iter().map(|e| (e - true_effect).powi(2)).sum::<f64>() / n as f64;
    let covered = ci_lowers
        .iter()
        .zip(ci_uppers.iter())
        .filter(|(lo, hi)| **lo <= true_effect && true_effect <= **hi)
        .count();
    let coverage = covered as f64 / n as f64;
    let mean_ci_length =
        ci_uppers.iter().zip(ci_lowers.iter()).map(|(hi, lo)| hi - lo).sum::<f64>() / n as f64;

    Ok(SimulationEval { te_mse, coverage, mean_ci_length })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Scalar interval membership (inside, outside, boundary exclusion).
    // - Misuse errors: membership on vector intervals and on estimates
    //   without intervals.
    // - Warning Display output for both per-period and average views.
    // - `simulation_eval` arithmetic and its length/empty error branches.
    //
    // They intentionally DO NOT cover:
    // - Construction of these values by the engine, which the engine's
    //   own tests and the integration suite exercise.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify strict-inequality membership for scalar bounds.
    //
    // Given
    // -----
    // - A scalar interval (-1.0, 2.0) at level 0.9.
    //
    // Expect
    // ------
    // - 0.0 is inside; -1.0 and 2.0 (the bounds) and 3.0 are outside.
    fn confidence_interval_scalar_membership_uses_strict_bounds() {
        // Arrange
        let interval = ConfidenceInterval {
            bounds: IntervalBounds::Scalar { low: -1.0, high: 2.0 },
            level: 0.9,
        };

        // Act & Assert
        assert_eq!(interval.contains(0.0), Ok(true));
        assert_eq!(interval.contains(-1.0), Ok(false));
        assert_eq!(interval.contains(2.0), Ok(false));
        assert_eq!(interval.contains(3.0), Ok(false));
    }

    #[test]
    // Purpose
    // -------
    // Ensure that membership on a per-period interval is a usage error,
    // not a silent false.
    //
    // Given
    // -----
    // - An interval with per-period bounds of length 2.
    //
    // Expect
    // ------
    // - `contains` returns `Err(PlaceboError::VectorInterval)`.
    fn confidence_interval_vector_membership_returns_vector_interval_error() {
        // Arrange
        let interval = ConfidenceInterval {
            bounds: IntervalBounds::PerPeriod {
                low: array![-1.0, -2.0],
                high: array![1.0, 2.0],
            },
            level: 0.95,
        };

        // Act
        let result = interval.contains(0.0);

        // Assert
        assert_eq!(result, Err(PlaceboError::VectorInterval));
    }

    #[test]
    // Purpose
    // -------
    // Ensure that membership on an estimate without an interval is a
    // usage error.
    //
    // Given
    // -----
    // - A `ScalarEstimate` whose `interval` is `None`.
    //
    // Expect
    // ------
    // - `contains` returns `Err(PlaceboError::MissingInterval)`.
    fn scalar_estimate_without_interval_returns_missing_interval_error() {
        // Arrange
        let estimate =
            ScalarEstimate { effect: 0.4, p_value: 0.2, interval: None, placebos: None };

        // Act
        let result = estimate.contains(0.0);

        // Assert
        assert_eq!(result, Err(PlaceboError::MissingInterval));
    }

    #[test]
    // Purpose
    // -------
    // Verify that the degenerate-interval warning names the affected
    // view and period in its Display output.
    //
    // Given
    // -----
    // - A per-period warning at period 3 and an average-view warning.
    //
    // Expect
    // ------
    // - The per-period message mentions "period 3"; both messages
    //   mention not containing 0.
    fn inference_warning_display_names_view_and_period() {
        // Arrange
        let per_period = InferenceWarning::IntervalExcludesZero {
            effect: EffectKind::PerPeriod,
            period: Some(3),
        };
        let average =
            InferenceWarning::IntervalExcludesZero { effect: EffectKind::Average, period: None };

        // Act
        let per_period_msg = per_period.to_string();
        let average_msg = average.to_string();

        // Assert
        assert!(per_period_msg.contains("period 3"), "Got: {per_period_msg}");
        assert!(per_period_msg.contains("doesn't contain 0"));
        assert!(average_msg.contains("doesn't contain 0"), "Got: {average_msg}");
    }

    #[test]
    // Purpose
    // -------
    // Verify `simulation_eval` on a hand-checked fixture.
    //
    // Given
    // -----
    // - Effects [1.0, 2.0, 3.0] with true effect 2.0.
    // - Intervals [0,2], [1,3], [2.5,3.5]: the first two cover 2.0, the
    //   third does not; each has length 2, 2, and 1.
    //
    // Expect
    // ------
    // - te_mse = (1 + 0 + 1) / 3, coverage = 2/3, mean length = 5/3.
    fn simulation_eval_matches_hand_computed_scores() {
        // Arrange
        let effects = array![1.0, 2.0, 3.0];
        let lowers = array![0.0, 1.0, 2.5];
        let uppers = array![2.0, 3.0, 3.5];

        // Act
        let eval = simulation_eval(&effects, &lowers, &uppers, 2.0)
            .expect("simulation_eval should succeed on aligned inputs");

        // Assert
        assert!((eval.te_mse - 2.0 / 3.0).abs() < 1e-12);
        assert!((eval.coverage - 2.0 / 3.0).abs() < 1e-12);
        assert!((eval.mean_ci_length - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure `simulation_eval` rejects misaligned and empty inputs.
    //
    // Given
    // -----
    // - Effects of length 3 with bounds of length 2; and empty arrays.
    //
    // Expect
    // ------
    // - A `LengthMismatch` error carrying both lengths for either
    //   misaligned bound array, and an `EmptyPeriods` error for the
    //   empty case.
    fn simulation_eval_rejects_misaligned_and_empty_inputs() {
        // Arrange
        let effects = array![1.0, 2.0, 3.0];
        let short = array![0.0, 1.0];
        let lowers = array![0.0, 1.0, 2.5];
        let uppers = array![2.0, 3.0, 3.5];
        let empty = Array1::<f64>::zeros(0);

        // Act & Assert
        assert_eq!(
            simulation_eval(&effects, &short, &uppers, 0.0),
            Err(PlaceboError::LengthMismatch { expected: 3, found: 2 })
        );
        assert_eq!(
            simulation_eval(&effects, &lowers, &short, 0.0),
            Err(PlaceboError::LengthMismatch { expected: 3, found: 2 })
        );
        match simulation_eval(&empty, &empty, &empty, 0.0) {
            Err(PlaceboError::EmptyPeriods) => (),
            other => panic!("expected EmptyPeriods error, got {other:?}"),
        }
    }
}
