//! placebo — permutation inference for synthetic-control estimates.
//!
//! Purpose
//! -------
//! Collect the placebo (in-space permutation) test and its shared
//! infrastructure for synthetic-control effect estimates. This subtree
//! implements the combination enumeration/sampling machinery, the
//! aggregation engine producing p-values and confidence intervals for
//! three effect views, and the result containers callers consume,
//! including Python bridges for PyO3-based bindings.
//!
//! Key behaviors
//! -------------
//! - Expose the placebo permutation test via [`PlaceboOutcome`] and its
//!   constructor [`PlaceboOutcome::run`], driven by a [`PlaceboOptions`]
//!   value with sensible defaults.
//! - Centralize input guards in [`validate_effect_matrices`] and
//!   [`validate_level`], ensuring matrix shapes, finiteness, and the
//!   confidence level are checked once in a consistent way.
//! - Enumerate or sample size-N1 control combinations through
//!   [`CombinationPlan`] and [`CombinationSequence`], with an exact
//!   saturating [`combination_count`].
//! - Provide a dedicated error type [`PlaceboError`] and result alias
//!   [`PlaceboResult`], plus a conversion layer to Python exceptions
//!   when the `python-bindings` feature is enabled.
//!
//! Invariants & assumptions
//! ------------------------
//! - Effect matrices are finite, real-valued, unit-by-period layouts;
//!   the engine calls [`validate_effect_matrices`] before forming any
//!   aggregate.
//! - Modules in this subtree report failures via [`PlaceboResult`] and
//!   never panic on user-facing invalid inputs; panics indicate
//!   programming errors not caught by validation.
//! - Randomness is owned: sampled traversal seeds its own generator from
//!   [`PlaceboOptions::random_seed`](engine::PlaceboOptions), so a fixed
//!   seed reproduces a run exactly.
//!
//! Conventions
//! -----------
//! - This subtree is focused on *placebo inference*; the
//!   regularization-boundary solver lives in its own `penalty` subtree.
//! - Error messages are phrased in terms of domain constraints such as
//!   "at least one post-treatment period" rather than low-level details.
//! - The public entry point ([`PlaceboOutcome::run`]) delegates shape
//!   checks to [`validation`] and propagates [`PlaceboError`] via
//!   [`PlaceboResult`].
//!
//! Downstream usage
//! ----------------
//! - Typical Rust code imports the main surface as:
//!
//!   ```rust,ignore
//!   use rust_synthcontrol::placebo::{PlaceboOptions, PlaceboOutcome};
//!
//!   let outcome = PlaceboOutcome::run(&control_effects, &treated_effects, &opts)?;
//!   ```
//!
//!   and only refers to `placebo::combinations` or `placebo::validation`
//!   directly when reusing the enumeration machinery or the guards.
//! - Simulation studies aggregate many runs with
//!   [`simulation_eval`](results::simulation_eval).
//! - Python bindings expose thin wrappers around the same Rust entry
//!   points; they rely on `From<PlaceboError> for PyErr` to raise
//!   `ValueError` instances instead of returning [`PlaceboResult`]
//!   explicitly.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`errors`] verify `Display` messages and payload
//!   embedding for [`PlaceboError`] variants.
//! - Unit tests in [`validation`] exercise all guard branches, including
//!   shape mismatches and non-finite values.
//! - Unit tests in [`combinations`] cover exact counts, saturation,
//!   plan selection, lexicographic completeness, and seeded sampling.
//! - Unit tests in [`engine`] cover p-value conventions, sidedness,
//!   interval shape, and seed determinism; the end-to-end
//!   dominating-treated scenario lives in the integration suite.

pub mod combinations;
pub mod engine;
pub mod errors;
pub mod results;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::combinations::{CombinationPlan, CombinationSequence, combination_count};
pub use self::engine::{PValuePolicy, PlaceboOptions};
pub use self::errors::{PlaceboError, PlaceboResult};
pub use self::results::{
    ConfidenceInterval, EffectKind, InferenceWarning, IntervalBounds, PlaceboOutcome,
    ScalarEstimate, SimulationEval, VectorEstimate, simulation_eval,
};
pub use self::validation::{validate_effect_matrices, validate_level};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_synthcontrol::placebo::prelude::*;
//
// to import the main placebo-inference surface in a single line.

pub mod prelude {
    pub use super::engine::{PValuePolicy, PlaceboOptions};
    pub use super::errors::{PlaceboError, PlaceboResult};
    pub use super::results::{ConfidenceInterval, InferenceWarning, PlaceboOutcome};
}
