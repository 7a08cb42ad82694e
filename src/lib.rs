//! rust_synthcontrol — synthetic-control inference utilities with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the placebo permutation test to Python via the `_rust_synthcontrol`
//! extension module. When the `python-bindings` feature is enabled, this module
//! defines the Python-facing classes and submodules used by the
//! `rust_synthcontrol` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`placebo` and `penalty`) as the public
//!   crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_synthcontrol` Python extension.
//! - Create and register the Python submodule (`inference`) under
//!   `rust_synthcontrol` so that dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work is implemented in the inner Rust modules; this
//!   file performs only FFI glue, input conversion, and error mapping.
//! - When `python-bindings` is enabled, the Python-visible types mirror the
//!   invariants and signatures of their Rust counterparts (e.g.
//!   `PlaceboOutcome`).
//! - On successful conversion from Python objects to Rust types, the
//!   invariants documented in the core modules are assumed to hold.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_rust_synthcontrol.<submodule>` and are
//!   typically wrapped by thin pure-Python facades in the top-level
//!   `rust_synthcontrol` package.
//! - Matrix layout and statistical conventions follow the documentation of the
//!   underlying Rust modules (`placebo`, `penalty`).
//! - Errors from core Rust code are propagated as rich error types internally
//!   and converted to `PyErr` values at the PyO3 boundary.
//! - The penalty-bounds solver is a Rust-only surface: its entry points are
//!   parameterized over a `GradientEvaluator` implementation supplied by the
//!   fitting machinery, which has no Python-facing counterpart here.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should usually depend directly on the inner modules and
//!   can ignore the PyO3 items guarded by the `python-bindings` feature.
//! - The Python packaging layer imports the `_rust_synthcontrol` module defined
//!   here and wraps its classes in user-facing Python APIs.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules and
//!   by the integration suite under `tests/`.
//! - Smoke tests for the PyO3 bindings verify that classes can be constructed,
//!   called, and round-tripped correctly from Python.

pub mod penalty;
pub mod placebo;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    placebo::{
        engine::{PValuePolicy, PlaceboOptions},
        results::{IntervalBounds, PlaceboOutcome},
    },
    utils::{extract_f64_matrix, matrix_to_rows},
};

/// PlaceboTest — Python-facing wrapper for the placebo permutation test.
///
/// Purpose
/// -------
/// Represent the result of a placebo (in-space permutation) test when called
/// from Python and forward all computation to [`PlaceboOutcome::run`].
///
/// Key behaviors
/// -------------
/// - Validate and convert Python inputs into contiguous `f64` matrices.
/// - Run the placebo test via [`PlaceboOutcome::run`] and store the outcome
///   internally.
/// - Expose the three effect views, their p-values, optional interval bounds,
///   optional placebo distributions, and any warnings as Python properties.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `PlaceboTest(control_effects, treated_effects, max_combinations=1000000,
/// keep_placebos=False, confidence_intervals=False, level=0.95,
/// exclude_observed=False, random_seed=None)`:
/// - `control_effects`, `treated_effects`: `&PyAny`
///   Two-dimensional array-likes of `f64` values (units × post-treatment
///   periods) with matching column counts and no non-finite entries.
/// - `max_combinations`: `Option<usize>`
///   Sampling cap; 0 disables it. Defaults to 1 000 000.
/// - `keep_placebos`, `confidence_intervals`: `Option<bool>`
///   Retention and interval flags, both off by default.
/// - `level`: `Option<f64>`
///   Confidence level, strictly in (0, 1) when intervals are requested.
/// - `exclude_observed`: `Option<bool>`
///   Switch to the exclusive p-value convention.
/// - `random_seed`: `Option<u64>`
///   Seed for the sampled traversal.
///
/// Fields
/// ------
/// - `inner`: [`PlaceboOutcome`]
///   Rust-side container holding the full test outcome used by the accessors.
///
/// Invariants
/// ----------
/// - `inner` satisfies all invariants documented on [`PlaceboOutcome`].
///
/// Performance
/// -----------
/// - At most one allocation per matrix is performed to copy Python data into
///   Rust buffers when needed; property access allocates only when converting
///   `ndarray` containers into Python-owned lists.
///
/// Notes
/// -----
/// - This type is primarily intended to be used from Python; native Rust code
///   should prefer calling [`PlaceboOutcome::run`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_synthcontrol.inference")]
pub struct PlaceboTest {
    /// The placebo test result struct.
    inner: PlaceboOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PlaceboTest {
    /// Result of the placebo permutation test for synthetic-control effects.
    ///
    /// P-values are permutation-based; intervals invert the placebo
    /// distribution around the observed effect.
    #[new]
    #[pyo3(
        text_signature = "(control_effects, treated_effects, /, max_combinations=1000000, \
                          keep_placebos=False, confidence_intervals=False, level=0.95, \
                          exclude_observed=False, random_seed=None)",
        signature = (
            control_effects,
            treated_effects,
            max_combinations = None,
            keep_placebos = None,
            confidence_intervals = None,
            level = None,
            exclude_observed = None,
            random_seed = None,
        )
    )]
    pub fn new<'py>(
        py: Python<'py>, control_effects: &Bound<'py, PyAny>, treated_effects: &Bound<'py, PyAny>,
        max_combinations: Option<usize>, keep_placebos: Option<bool>,
        confidence_intervals: Option<bool>, level: Option<f64>, exclude_observed: Option<bool>,
        random_seed: Option<u64>,
    ) -> PyResult<PlaceboTest> {
        let control_ro = extract_f64_matrix(py, control_effects)?;
        let treated_ro = extract_f64_matrix(py, treated_effects)?;
        let control = control_ro.as_array().to_owned();
        let treated = treated_ro.as_array().to_owned();

        let defaults = PlaceboOptions::default();
        let opts = PlaceboOptions {
            max_combinations: max_combinations.unwrap_or(defaults.max_combinations),
            keep_placebos: keep_placebos.unwrap_or(defaults.keep_placebos),
            confidence_intervals: confidence_intervals.unwrap_or(defaults.confidence_intervals),
            level: level.unwrap_or(defaults.level),
            p_value_policy: if exclude_observed.unwrap_or(false) {
                PValuePolicy::ExcludeObserved
            } else {
                PValuePolicy::IncludeObserved
            },
            random_seed,
        };

        let inner = PlaceboOutcome::run(&control, &treated, &opts)?;
        Ok(PlaceboTest { inner })
    }

    /// Per-period average treated effect.
    #[getter]
    pub fn effect_vec(&self) -> Vec<f64> {
        self.inner.effect_vec.effect.to_vec()
    }

    /// Per-period permutation p-values.
    #[getter]
    pub fn p_values(&self) -> Vec<f64> {
        self.inner.effect_vec.p_values.to_vec()
    }

    /// Average joint effect across treated units and periods.
    #[getter]
    pub fn avg_joint_effect(&self) -> f64 {
        self.inner.avg_joint_effect.effect
    }

    /// Permutation p-value of the average joint effect.
    #[getter]
    pub fn avg_joint_p_value(&self) -> f64 {
        self.inner.avg_joint_effect.p_value
    }

    /// RMS joint effect across treated units.
    #[getter]
    pub fn rms_joint_effect(&self) -> f64 {
        self.inner.rms_joint_effect.effect
    }

    /// Permutation p-value of the RMS joint effect.
    #[getter]
    pub fn rms_joint_p_value(&self) -> f64 {
        self.inner.rms_joint_effect.p_value
    }

    /// Number of placebo combinations processed.
    #[getter]
    pub fn n_placebo(&self) -> usize {
        self.inner.n_placebo
    }

    /// Degenerate-interval warnings, rendered as strings.
    #[getter]
    pub fn warnings(&self) -> Vec<String> {
        self.inner.warnings.iter().map(ToString::to_string).collect()
    }

    /// Interval bounds for the average joint effect, if requested.
    #[getter]
    pub fn avg_joint_interval(&self) -> PyResult<Option<(f64, f64)>> {
        scalar_interval(self.inner.avg_joint_effect.interval.as_ref())
    }

    /// Interval bounds for the RMS joint effect, if requested.
    #[getter]
    pub fn rms_joint_interval(&self) -> PyResult<Option<(f64, f64)>> {
        scalar_interval(self.inner.rms_joint_effect.interval.as_ref())
    }

    /// Per-period interval bounds (lows, highs), if requested.
    #[getter]
    pub fn effect_vec_interval(&self) -> PyResult<Option<(Vec<f64>, Vec<f64>)>> {
        match self.inner.effect_vec.interval.as_ref() {
            None => Ok(None),
            Some(interval) => match &interval.bounds {
                IntervalBounds::PerPeriod { low, high } => {
                    Ok(Some((low.to_vec(), high.to_vec())))
                }
                IntervalBounds::Scalar { .. } => Err(PyValueError::new_err(
                    "per-period estimate unexpectedly carries scalar interval bounds",
                )),
            },
        }
    }

    /// Retained placebo effect vectors (row-major), if requested.
    #[getter]
    pub fn placebo_effect_vecs(&self) -> Option<Vec<Vec<f64>>> {
        self.inner.effect_vec.placebos.as_ref().map(matrix_to_rows)
    }

    /// Retained placebo average joint effects, if requested.
    #[getter]
    pub fn placebo_avg_joint_effects(&self) -> Option<Vec<f64>> {
        self.inner.avg_joint_effect.placebos.as_ref().map(|p| p.to_vec())
    }

    /// Retained placebo RMS joint effects, if requested.
    #[getter]
    pub fn placebo_rms_joint_effects(&self) -> Option<Vec<f64>> {
        self.inner.rms_joint_effect.placebos.as_ref().map(|p| p.to_vec())
    }
}

#[cfg(feature = "python-bindings")]
fn scalar_interval(
    interval: Option<&crate::placebo::results::ConfidenceInterval>,
) -> PyResult<Option<(f64, f64)>> {
    match interval {
        None => Ok(None),
        Some(interval) => match interval.bounds {
            IntervalBounds::Scalar { low, high } => Ok(Some((low, high))),
            IntervalBounds::PerPeriod { .. } => Err(PyValueError::new_err(
                "scalar estimate unexpectedly carries per-period interval bounds",
            )),
        },
    }
}

/// _rust_synthcontrol — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_synthcontrol` Python module and register its submodule
/// used by the public `rust_synthcontrol` package.
///
/// Key behaviors
/// -------------
/// - Create the `inference` submodule and attach it to the parent
///   `_rust_synthcontrol` module.
/// - Register the submodule in `sys.modules` so it is importable via dotted
///   paths from Python.
///
/// Parameters
/// ----------
/// - `_py`: [`Python`]
///   GIL token provided by PyO3 during module initialization.
/// - `m`: `&Bound<PyModule>`
///   Module object representing `_rust_synthcontrol`.
///
/// Returns
/// -------
/// `PyResult<()>`
///   `Ok(())` on success, or a Python exception if registration fails.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating the submodule or manipulating `sys.modules` fails.
///
/// Panics
/// ------
/// - Never panics under normal operation; all failures are mapped into
///   `PyErr`.
///
/// Notes
/// -----
/// - This function is invoked automatically by Python when importing the
///   compiled extension; it is not called directly by user code.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_synthcontrol<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let inference_mod = PyModule::new(_py, "inference")?;
    inference(_py, m, &inference_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_synthcontrol.inference", inference_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn inference<'py>(
    _py: Python, rust_synthcontrol: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PlaceboTest>()?;
    rust_synthcontrol.add_submodule(m)?;
    Ok(())
}
