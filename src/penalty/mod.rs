//! penalty — regularization-boundary search for synthetic-control fits.
//!
//! Purpose
//! -------
//! Collect the penalty-bounds solver and its shared infrastructure: the
//! boundary-search entry points, the gradient-evaluation seam they
//! drive, and the validation and error handling around both, including
//! Python bridges for PyO3-based bindings.
//!
//! Key behaviors
//! -------------
//! - Expose the boundary search via [`max_tensor_penalty`] (the
//!   covariate-penalty boundary for one or many candidate weight
//!   penalties) and [`max_weight_penalty`] (the rescaled weight-penalty
//!   boundary).
//! - Centralize input guards in [`validate_penalty_inputs`] and
//!   [`validate_v_pen`], ensuring shapes, argument combinations, and
//!   penalty positivity are checked once in a consistent way.
//! - Define the [`GradientEvaluator`] seam so fitting backends plug in
//!   behind a trait and the solver stays testable against mocks.
//! - Provide a dedicated error type [`PenaltyError`] and result alias
//!   [`PenaltyResult`], plus a conversion layer to Python exceptions
//!   when the `python-bindings` feature is enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - Design matrices are finite, real-valued, unit-by-column layouts;
//!   the solver validates shapes and combinations before any gradient
//!   evaluation.
//! - Modules in this subtree report failures via [`PenaltyResult`] and
//!   never panic on user-facing invalid inputs.
//! - Evaluator failures are translated at the solver boundary: memory
//!   pressure becomes actionable `grad_splits` advice where partitioned
//!   evaluation exists.
//!
//! Conventions
//! -----------
//! - This subtree is focused on the *regularization boundary*; placebo
//!   inference lives in its own `placebo` subtree.
//! - Argument and matrix names mirror the caller-facing surface (`X`,
//!   `Y`, `X_treat`, `Y_treat`).
//!
//! Downstream usage
//! ----------------
//! - Typical Rust code imports the main surface as:
//!
//!   ```rust,ignore
//!   use rust_synthcontrol::penalty::{PenaltyOptions, WeightPenalty, max_tensor_penalty};
//!
//!   let bound = max_tensor_penalty(&x, &y, None, None, None, &opts, &evaluator)?;
//!   ```
//!
//!   and implements [`GradientEvaluator`] wherever the fitting machinery
//!   lives.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`errors`] verify `Display` payload embedding and the
//!   memory-pressure advice.
//! - Unit tests in [`validation`] exercise every guard branch.
//! - Unit tests in [`bounds`] drive the solver with recording and
//!   failing mock evaluators, pinning dispatch, stacking, ordering,
//!   translation, and the rescaling identity.

pub mod bounds;
pub mod errors;
pub mod gradient;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bounds::{
    GRADIENT_PROGRESS_LABEL, PenaltyBound, PenaltyOptions, WeightPenalty, max_tensor_penalty,
    max_weight_penalty, weight_penalty_guestimate,
};
pub use self::errors::{PenaltyError, PenaltyResult};
pub use self::gradient::{
    EvaluationMode, GradientError, GradientEvaluator, GradientOutput, GradientRequest,
    GradientStrategy,
};
pub use self::validation::{validate_penalty_inputs, validate_v_pen};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_synthcontrol::penalty::prelude::*;
//
// to import the main boundary-search surface in a single line.

pub mod prelude {
    pub use super::bounds::{
        PenaltyBound, PenaltyOptions, WeightPenalty, max_tensor_penalty, max_weight_penalty,
    };
    pub use super::errors::{PenaltyError, PenaltyResult};
    pub use super::gradient::{GradientEvaluator, GradientStrategy};
}
