//! penalty::bounds — the regularization-boundary search.
//!
//! Purpose
//! -------
//! Locate the smallest penalties at which synthetic-control fits become
//! fully regularized: the covariate-penalty boundary (above which the
//! fitted tensor collapses to zero) for one or many candidate weight
//! penalties, and the matching weight-penalty boundary obtained by
//! rescaling. The module owns argument validation, strategy dispatch,
//! and evaluator-error translation; the numeric work happens behind the
//! [`GradientEvaluator`] seam.
//!
//! Key behaviors
//! -------------
//! - Dispatch on the argument shape: a treated pair selects the
//!   held-out-treated strategy over the STACKED control + treated
//!   blocks, a fold count selects cross-fold, and neither selects
//!   leave-one-out.
//! - Default the weight penalty to a scale-matched guestimate — the mean
//!   across covariates of the population variance — when the caller
//!   supplies none.
//! - Preserve the caller's ordering when a penalty sequence is supplied:
//!   the i-th boundary answers the i-th candidate.
//! - Translate evaluator failures: out-of-memory becomes actionable
//!   `grad_splits` advice under the partitionable strategies, and a
//!   tensor answered to a boundary request is rejected as a contract
//!   violation.
//! - Derive the weight-penalty boundary from the covariate-penalty
//!   boundary at unit weight penalty, rescaled by the caller's covariate
//!   penalty.
//!
//! Invariants & assumptions
//! ------------------------
//! - All guards run before any evaluation; on the held-out-treated path
//!   the stacking is shape-safe because validation already matched the
//!   column counts.
//! - Evaluation cost and failure modes belong to the evaluator; this
//!   module never retries or partitions on its own.
//!
//! Conventions
//! -----------
//! - Argument names mirror the caller-facing surface (`X`, `Y`,
//!   `X_treat`, `Y_treat`) so error payloads read naturally.
//!
//! Downstream usage
//! ----------------
//! - Fitting pipelines call [`max_tensor_penalty`] to bracket their
//!   covariate-penalty grids and [`max_weight_penalty`] for the weight
//!   direction.
//!
//! Testing notes
//! -------------
//! - Unit tests drive the solver with recording mock evaluators: they
//!   pin the dispatch rules, the stacked-request layout, sequence
//!   ordering, the guestimate default, both error translations, and the
//!   rescaling identity.

use crate::penalty::errors::{PenaltyError, PenaltyResult};
use crate::penalty::gradient::{
    EvaluationMode, GradientError, GradientEvaluator, GradientOutput, GradientRequest,
    GradientStrategy,
};
use crate::penalty::validation::{validate_penalty_inputs, validate_v_pen};
use ndarray::{Array2, Axis, concatenate};

/// Progress label attached to boundary-search evaluations.
pub const GRADIENT_PROGRESS_LABEL: &str =
    "Calculating maximum covariate penalty (i.e. the gradient at zero)";

/// WeightPenalty — one or many candidate weight penalties.
///
/// Variants
/// --------
/// - `Single(f64)`
///   One candidate; the search returns one boundary.
/// - `Sequence(Vec<f64>)`
///   Many candidates; the search returns one boundary per candidate, in
///   the caller's order.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightPenalty {
    Single(f64),
    Sequence(Vec<f64>),
}

/// PenaltyBound — the boundary (or boundaries) found by the search,
/// mirroring the shape of the [`WeightPenalty`] that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum PenaltyBound {
    Single(f64),
    Sequence(Vec<f64>),
}

/// PenaltyOptions — tuning knobs for the boundary search.
///
/// Fields
/// ------
/// - `grad_splits`: `Option<usize>`
///   Fold count for partitioned gradient evaluation. Selects the
///   cross-fold strategy when set (and no treated pair is supplied);
///   also the remedy the solver advises on memory pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PenaltyOptions {
    pub grad_splits: Option<usize>,
}

/// Scale-matched default for the weight penalty: the mean across
/// covariates of the population variance (ddof = 0).
///
/// Parameters
/// ----------
/// - `x`: `&Array2<f64>`
///   Control-block covariate matrix with at least one column.
///
/// Returns
/// -------
/// `f64`
///   The guestimate; 0.0 for a degenerate matrix with no entries.
pub fn weight_penalty_guestimate(x: &Array2<f64>) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0)
}

/// Find the covariate-penalty boundary for each candidate weight
/// penalty.
///
/// Parameters
/// ----------
/// - `x`, `y`: `&Array2<f64>`
///   Control-block covariate and outcome matrices.
/// - `w_pen`: `Option<WeightPenalty>`
///   Candidate weight penalties; defaults to
///   [`weight_penalty_guestimate`] of `x` when `None`.
/// - `x_treat`, `y_treat`: `Option<&Array2<f64>>`
///   Optional treated blocks; supplying them selects the
///   held-out-treated strategy over the stacked matrices.
/// - `opts`: `&PenaltyOptions`
///   Fold count for the cross-fold strategy.
/// - `evaluator`: `&dyn GradientEvaluator`
///   The fitting backend answering boundary requests.
///
/// Returns
/// -------
/// `PenaltyResult<PenaltyBound>`
///   - `Ok(PenaltyBound)` with the same shape as the candidate input.
///   - `Err(PenaltyError)` on validation or evaluation failure.
///
/// Errors
/// ------
/// - Validation errors from
///   [`validate_penalty_inputs`](crate::penalty::validation::validate_penalty_inputs).
/// - `PenaltyError::InsufficientMemory`
///   The evaluator ran out of memory under the leave-one-out or
///   cross-fold strategy; the message advises setting `grad_splits`.
/// - `PenaltyError::Gradient`
///   A numeric evaluator failure, or memory exhaustion under the
///   held-out-treated strategy where no partitioning exists.
/// - `PenaltyError::StrategyContract`
///   The evaluator answered a boundary request with a fitted tensor.
///
/// Notes
/// -----
/// - A sequence input yields a sequence output in the caller's order,
///   one evaluation per candidate.
pub fn max_tensor_penalty(
    x: &Array2<f64>, y: &Array2<f64>, w_pen: Option<WeightPenalty>,
    x_treat: Option<&Array2<f64>>, y_treat: Option<&Array2<f64>>, opts: &PenaltyOptions,
    evaluator: &dyn GradientEvaluator,
) -> PenaltyResult<PenaltyBound> {
    validate_penalty_inputs(x, y, x_treat, y_treat)?;

    let w_pen = w_pen.unwrap_or_else(|| WeightPenalty::Single(weight_penalty_guestimate(x)));

    match (x_treat, y_treat) {
        (Some(xt), Some(yt)) => {
            // Validation matched the column counts, so stacking is
            // shape-safe.
            let stacked_x = concatenate(Axis(0), &[x.view(), xt.view()])
                .expect("validated: X and X_treat share a column count");
            let stacked_y = concatenate(Axis(0), &[y.view(), yt.view()])
                .expect("validated: Y and Y_treat share a column count");
            let control_units: Vec<usize> = (0..x.nrows()).collect();
            let treated_units: Vec<usize> = (x.nrows()..x.nrows() + xt.nrows()).collect();

            solve_boundaries(
                GradientStrategy::HeldOutTreated,
                &stacked_x,
                &stacked_y,
                &w_pen,
                None,
                Some(&control_units),
                Some(&treated_units),
                evaluator,
            )
        }
        _ => {
            let strategy = if opts.grad_splits.is_some() {
                GradientStrategy::CrossFold
            } else {
                GradientStrategy::LeaveOneOut
            };
            solve_boundaries(strategy, x, y, &w_pen, opts.grad_splits, None, None, evaluator)
        }
    }
}

/// Find the weight-penalty boundary by rescaling the covariate-penalty
/// boundary at unit weight penalty.
///
/// Parameters
/// ----------
/// - `x`, `y`, `x_treat`, `y_treat`, `opts`, `evaluator`
///   As for [`max_tensor_penalty`].
/// - `v_pen`: `f64`
///   The covariate penalty in force; must be strictly positive.
///
/// Returns
/// -------
/// `PenaltyResult<f64>`
///   - `Ok(bound)` where `bound = max_tensor_penalty(w_pen = 1) / v_pen`.
///   - `Err(PenaltyError)` on validation or evaluation failure.
///
/// Errors
/// ------
/// - `PenaltyError::InvalidVPen`
///   The covariate penalty is not strictly positive.
/// - All errors of [`max_tensor_penalty`].
pub fn max_weight_penalty(
    x: &Array2<f64>, y: &Array2<f64>, v_pen: f64, x_treat: Option<&Array2<f64>>,
    y_treat: Option<&Array2<f64>>, opts: &PenaltyOptions, evaluator: &dyn GradientEvaluator,
) -> PenaltyResult<f64> {
    validate_v_pen(v_pen)?;

    let bound = max_tensor_penalty(
        x,
        y,
        Some(WeightPenalty::Single(1.0)),
        x_treat,
        y_treat,
        opts,
        evaluator,
    )?;
    match bound {
        PenaltyBound::Single(value) => Ok(value / v_pen),
        PenaltyBound::Sequence(_) => Err(PenaltyError::StrategyContract {
            text: "single-candidate search returned a sequence of boundaries".to_owned(),
        }),
    }
}

//
// ---------- Private helpers (compact docs) ----------
//

/// Evaluate one boundary per candidate weight penalty under a fixed
/// strategy, translating evaluator errors into the solver's taxonomy.
#[allow(clippy::too_many_arguments)]
fn solve_boundaries(
    strategy: GradientStrategy, x: &Array2<f64>, y: &Array2<f64>, w_pen: &WeightPenalty,
    grad_splits: Option<usize>, control_units: Option<&[usize]>, treated_units: Option<&[usize]>,
    evaluator: &dyn GradientEvaluator,
) -> PenaltyResult<PenaltyBound> {
    let solve_one = |w: f64| -> PenaltyResult<f64> {
        let request = GradientRequest {
            x: x.view(),
            y: y.view(),
            w_pen: w,
            mode: EvaluationMode::PenaltyBoundary,
            progress_label: GRADIENT_PROGRESS_LABEL,
            grad_splits,
            control_units,
            treated_units,
        };
        match evaluator.evaluate(strategy, &request) {
            Ok(GradientOutput::Boundary(value)) => Ok(value),
            Ok(GradientOutput::Tensor(_)) => Err(PenaltyError::StrategyContract {
                text: "boundary request answered with a fitted tensor".to_owned(),
            }),
            Err(GradientError::Numeric(text)) => Err(PenaltyError::Gradient { text }),
            Err(GradientError::OutOfMemory) => Err(translate_out_of_memory(strategy)),
        }
    };

    match w_pen {
        WeightPenalty::Single(w) => Ok(PenaltyBound::Single(solve_one(*w)?)),
        WeightPenalty::Sequence(ws) => {
            let mut bounds = Vec::with_capacity(ws.len());
            for &w in ws {
                bounds.push(solve_one(w)?);
            }
            Ok(PenaltyBound::Sequence(bounds))
        }
    }
}

/// Memory exhaustion is actionable only where partitioned evaluation
/// exists; the held-out-treated strategy has no such remedy.
fn translate_out_of_memory(strategy: GradientStrategy) -> PenaltyError {
    match strategy {
        GradientStrategy::LeaveOneOut | GradientStrategy::CrossFold => {
            PenaltyError::InsufficientMemory { strategy }
        }
        GradientStrategy::HeldOutTreated => PenaltyError::Gradient {
            text: format!("out of memory while evaluating the {strategy} gradient"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};
    use std::cell::RefCell;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Strategy dispatch from the argument shape.
    // - The stacked-request layout under the held-out-treated strategy.
    // - The guestimate default for the weight penalty.
    // - Sequence ordering of boundaries.
    // - Error translation (out-of-memory, numeric, contract violation).
    // - The weight-penalty rescaling identity and its v_pen guard.
    //
    // They intentionally DO NOT cover:
    // - Numeric behavior of real gradient evaluators, which live with the
    //   fitting machinery.
    // -------------------------------------------------------------------------

    /// One recorded evaluation: strategy, weight penalty, fold count,
    /// row count of the request matrices, and the index partitions.
    #[derive(Debug, Clone, PartialEq)]
    struct Seen {
        strategy: GradientStrategy,
        w_pen: f64,
        grad_splits: Option<usize>,
        rows: usize,
        control_units: Option<Vec<usize>>,
        treated_units: Option<Vec<usize>>,
    }

    /// Recording evaluator that answers every boundary request with
    /// `scale × w_pen`.
    struct RecordingEvaluator {
        scale: f64,
        seen: RefCell<Vec<Seen>>,
    }

    impl RecordingEvaluator {
        fn new(scale: f64) -> RecordingEvaluator {
            RecordingEvaluator { scale, seen: RefCell::new(Vec::new()) }
        }
    }

    impl GradientEvaluator for RecordingEvaluator {
        fn evaluate(
            &self, strategy: GradientStrategy, request: &GradientRequest<'_>,
        ) -> Result<GradientOutput, GradientError> {
            self.seen.borrow_mut().push(Seen {
                strategy,
                w_pen: request.w_pen,
                grad_splits: request.grad_splits,
                rows: request.x.nrows(),
                control_units: request.control_units.map(<[usize]>::to_vec),
                treated_units: request.treated_units.map(<[usize]>::to_vec),
            });
            Ok(GradientOutput::Boundary(self.scale * request.w_pen))
        }
    }

    /// Evaluator that always fails the same way.
    struct FailingEvaluator {
        error: GradientError,
    }

    impl GradientEvaluator for FailingEvaluator {
        fn evaluate(
            &self, _strategy: GradientStrategy, _request: &GradientRequest<'_>,
        ) -> Result<GradientOutput, GradientError> {
            Err(self.error.clone())
        }
    }

    fn control_blocks() -> (Array2<f64>, Array2<f64>) {
        (Array2::<f64>::zeros((10, 3)), Array2::<f64>::zeros((10, 2)))
    }

    #[test]
    // Purpose
    // -------
    // Verify strategy dispatch: no extras selects leave-one-out, a fold
    // count selects cross-fold, and a treated pair selects
    // held-out-treated.
    //
    // Given
    // -----
    // - The same control blocks under the three argument shapes.
    //
    // Expect
    // ------
    // - The recording evaluator sees the corresponding strategies, with
    //   the fold count forwarded on the cross-fold path.
    fn max_tensor_penalty_dispatches_on_argument_shape() {
        // Arrange
        let (x, y) = control_blocks();
        let xt = Array2::<f64>::zeros((4, 3));
        let yt = Array2::<f64>::zeros((4, 2));
        let evaluator = RecordingEvaluator::new(1.0);
        let w = Some(WeightPenalty::Single(2.0));

        // Act
        max_tensor_penalty(&x, &y, w.clone(), None, None, &PenaltyOptions::default(), &evaluator)
            .expect("leave-one-out run should succeed");
        max_tensor_penalty(
            &x,
            &y,
            w.clone(),
            None,
            None,
            &PenaltyOptions { grad_splits: Some(5) },
            &evaluator,
        )
        .expect("cross-fold run should succeed");
        max_tensor_penalty(
            &x,
            &y,
            w,
            Some(&xt),
            Some(&yt),
            &PenaltyOptions::default(),
            &evaluator,
        )
        .expect("held-out-treated run should succeed");

        // Assert
        let seen = evaluator.seen.borrow();
        assert_eq!(seen[0].strategy, GradientStrategy::LeaveOneOut);
        assert_eq!(seen[0].grad_splits, None);
        assert_eq!(seen[1].strategy, GradientStrategy::CrossFold);
        assert_eq!(seen[1].grad_splits, Some(5));
        assert_eq!(seen[2].strategy, GradientStrategy::HeldOutTreated);
    }

    #[test]
    // Purpose
    // -------
    // Verify the stacked-request layout under the held-out-treated
    // strategy: rows are controls then treated, with matching index
    // partitions.
    //
    // Given
    // -----
    // - 10 control rows and 4 treated rows.
    //
    // Expect
    // ------
    // - A 14-row request with control indices 0..10 and treated indices
    //   10..14.
    fn max_tensor_penalty_stacks_treated_blocks_under_controls() {
        // Arrange
        let (x, y) = control_blocks();
        let xt = Array2::<f64>::zeros((4, 3));
        let yt = Array2::<f64>::zeros((4, 2));
        let evaluator = RecordingEvaluator::new(1.0);

        // Act
        max_tensor_penalty(
            &x,
            &y,
            Some(WeightPenalty::Single(1.0)),
            Some(&xt),
            Some(&yt),
            &PenaltyOptions::default(),
            &evaluator,
        )
        .expect("run should succeed");

        // Assert
        let seen = evaluator.seen.borrow();
        assert_eq!(seen[0].rows, 14);
        assert_eq!(seen[0].control_units, Some((0..10).collect()));
        assert_eq!(seen[0].treated_units, Some((10..14).collect()));
    }

    #[test]
    // Purpose
    // -------
    // Verify the guestimate default: with no weight penalty supplied,
    // the request carries the mean across covariates of the population
    // variance.
    //
    // Given
    // -----
    // - X with columns of variance 0.25 and 1.0 (hand-computed, ddof 0).
    //
    // Expect
    // ------
    // - The evaluator sees w_pen = 0.625.
    fn max_tensor_penalty_defaults_weight_penalty_to_variance_guestimate() {
        // Arrange
        let x = array![[0.0, 0.0], [1.0, 2.0]];
        let y = array![[0.0], [1.0]];
        let evaluator = RecordingEvaluator::new(1.0);

        // Act
        max_tensor_penalty(&x, &y, None, None, None, &PenaltyOptions::default(), &evaluator)
            .expect("run should succeed");

        // Assert
        let seen = evaluator.seen.borrow();
        assert!((seen[0].w_pen - 0.625).abs() < 1e-12, "got w_pen = {}", seen[0].w_pen);
        assert!((weight_penalty_guestimate(&x) - 0.625).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that a candidate sequence yields boundaries in the caller's
    // order, one evaluation per candidate.
    //
    // Given
    // -----
    // - Candidates [0.5, 2.0, 1.0] and an evaluator answering 3 × w_pen.
    //
    // Expect
    // ------
    // - `PenaltyBound::Sequence([1.5, 6.0, 3.0])`.
    fn max_tensor_penalty_preserves_sequence_order() {
        // Arrange
        let (x, y) = control_blocks();
        let evaluator = RecordingEvaluator::new(3.0);

        // Act
        let bound = max_tensor_penalty(
            &x,
            &y,
            Some(WeightPenalty::Sequence(vec![0.5, 2.0, 1.0])),
            None,
            None,
            &PenaltyOptions::default(),
            &evaluator,
        )
        .expect("run should succeed");

        // Assert
        assert_eq!(bound, PenaltyBound::Sequence(vec![1.5, 6.0, 3.0]));
        assert_eq!(evaluator.seen.borrow().len(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Verify error translation: out-of-memory becomes `grad_splits`
    // advice under leave-one-out but a plain gradient failure under
    // held-out-treated, and numeric failures preserve their message.
    //
    // Given
    // -----
    // - Failing evaluators under both strategies.
    //
    // Expect
    // ------
    // - `InsufficientMemory { LeaveOneOut }`, then `Gradient` for the
    //   treated path, then `Gradient` with the numeric message.
    fn max_tensor_penalty_translates_evaluator_failures() {
        // Arrange
        let (x, y) = control_blocks();
        let xt = Array2::<f64>::zeros((4, 3));
        let yt = Array2::<f64>::zeros((4, 2));
        let oom = FailingEvaluator { error: GradientError::OutOfMemory };
        let numeric =
            FailingEvaluator { error: GradientError::Numeric("singular system".to_owned()) };
        let w = Some(WeightPenalty::Single(1.0));

        // Act
        let loo = max_tensor_penalty(&x, &y, w.clone(), None, None, &PenaltyOptions::default(), &oom);
        let treated = max_tensor_penalty(
            &x,
            &y,
            w.clone(),
            Some(&xt),
            Some(&yt),
            &PenaltyOptions::default(),
            &oom,
        );
        let failed = max_tensor_penalty(&x, &y, w, None, None, &PenaltyOptions::default(), &numeric);

        // Assert
        assert_eq!(
            loo,
            Err(PenaltyError::InsufficientMemory { strategy: GradientStrategy::LeaveOneOut })
        );
        match treated {
            Err(PenaltyError::Gradient { text }) => {
                assert!(text.contains("held-out-treated"), "Got: {text}");
            }
            other => panic!("expected Gradient error on the treated path, got {other:?}"),
        }
        assert_eq!(failed, Err(PenaltyError::Gradient { text: "singular system".to_owned() }));
    }

    #[test]
    // Purpose
    // -------
    // Verify that a tensor answered to a boundary request is rejected as
    // a contract violation.
    //
    // Given
    // -----
    // - An evaluator returning `GradientOutput::Tensor`.
    //
    // Expect
    // ------
    // - `PenaltyError::StrategyContract`.
    fn max_tensor_penalty_rejects_tensor_answer_to_boundary_request() {
        // Arrange
        struct TensorEvaluator;
        impl GradientEvaluator for TensorEvaluator {
            fn evaluate(
                &self, _strategy: GradientStrategy, _request: &GradientRequest<'_>,
            ) -> Result<GradientOutput, GradientError> {
                Ok(GradientOutput::Tensor(Array2::<f64>::zeros((2, 2))))
            }
        }
        let (x, y) = control_blocks();

        // Act
        let result = max_tensor_penalty(
            &x,
            &y,
            Some(WeightPenalty::Single(1.0)),
            None,
            None,
            &PenaltyOptions::default(),
            &TensorEvaluator,
        );

        // Assert
        match result {
            Err(PenaltyError::StrategyContract { .. }) => {}
            other => panic!("expected StrategyContract, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the weight-penalty rescaling identity and its v_pen guard:
    // the boundary at unit weight penalty is divided by v_pen, and a
    // non-positive v_pen is rejected before any evaluation.
    //
    // Given
    // -----
    // - An evaluator answering 10 × w_pen and v_pen values 4.0 and 0.0.
    //
    // Expect
    // ------
    // - `Ok(2.5)` for v_pen = 4.0; `InvalidVPen(0.0)` with no recorded
    //   evaluation for v_pen = 0.0.
    fn max_weight_penalty_rescales_unit_boundary_by_v_pen() {
        // Arrange
        let (x, y) = control_blocks();
        let evaluator = RecordingEvaluator::new(10.0);

        // Act
        let bound =
            max_weight_penalty(&x, &y, 4.0, None, None, &PenaltyOptions::default(), &evaluator)
                .expect("rescaled search should succeed");
        let seen_after_ok = evaluator.seen.borrow().len();
        let rejected =
            max_weight_penalty(&x, &y, 0.0, None, None, &PenaltyOptions::default(), &evaluator);

        // Assert
        assert!((bound - 2.5).abs() < 1e-12, "got bound = {bound}");
        assert_eq!(evaluator.seen.borrow()[0].w_pen, 1.0);
        assert_eq!(rejected, Err(PenaltyError::InvalidVPen(0.0)));
        assert_eq!(evaluator.seen.borrow().len(), seen_after_ok, "guard must run first");
    }
}
