//! placebo::engine — the placebo permutation test.
//!
//! Purpose
//! -------
//! Implement the placebo (in-space permutation) test for synthetic-control
//! effect estimates: build a null distribution of aggregated effects from
//! combinations of control units matching the treated-group size, and
//! derive permutation p-values and percentile confidence intervals for
//! three effect views (per-period vector, average joint, RMS joint).
//!
//! Key behaviors
//! -------------
//! - Compute observed aggregates from the treated effect matrix and the
//!   matching placebo aggregates for every control combination yielded by
//!   a [`CombinationSequence`], in one aggregation loop shared by the
//!   exact and sampled traversal modes.
//! - Accumulate two-sided counts (`|placebo| ≥ |observed|`) for the
//!   per-period and average views and a one-sided count
//!   (`placebo ≥ observed`) for the RMS view, whose statistic is
//!   non-negative by construction.
//! - Convert counts to p-values under a configurable convention
//!   ([`PValuePolicy`]) for including the observed statistic in its own
//!   reference set.
//! - When requested, invert the permutation distribution into confidence
//!   intervals by flipping its order-statistic bounds around the observed
//!   effect, and raise the degenerate-interval warning for zero-null
//!   views whose distribution bounds share a sign.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are validated by `placebo::validation` before any aggregate
//!   is formed; the engine never relies on a container library raising
//!   incidentally.
//! - The interval granularity `2 / n_pl` uses the EXACT combination
//!   count, not the sampled draw count, so nominal levels are honest
//!   about what the full permutation distribution could resolve. When a
//!   sampling cap retains fewer draws than the resulting tail ranks need
//!   between them, the run fails with `InsufficientDraws` instead of
//!   returning a crossed interval.
//! - Order statistics use 1-indexed semantics (`alpha_ind` low,
//!   `npl + 1 − alpha_ind` high) mapped to 0-indexed positions and
//!   clamped into `[0, npl − 1]`, so `alpha_ind == 1` cannot index past
//!   the end.
//! - Randomness is confined to the combination sequence, which owns a
//!   generator seeded from [`PlaceboOptions::random_seed`]; a fixed seed
//!   makes the whole run deterministic.
//!
//! Conventions
//! -----------
//! - Rows index units, columns index post-treatment periods.
//! - Per-unit aggregates are taken across the time axis; joint aggregates
//!   average the per-unit values across units.
//! - The returned interval is `(observed − high, observed − low)` — an
//!   interval for the true effect, not for the null statistic.
//!
//! Downstream usage
//! ----------------
//! - Call [`PlaceboOutcome::run`] with borrowed effect matrices and a
//!   [`PlaceboOptions`]; the estimation pipeline that produced the effect
//!   matrices owns them and is free to drop them afterwards.
//! - Simulation studies combine many runs with
//!   `placebo::results::simulation_eval`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the draw-count property, p-value ranges and
//!   extremes under both conventions, the two-sided vs one-sided
//!   comparisons, interval shape on a symmetric distribution, lazy level
//!   validation, and seed determinism in sampled mode.
//! - The integration suite exercises the dominating-treated end-to-end
//!   scenario, including the degenerate-interval warning.

use crate::placebo::combinations::{CombinationPlan, CombinationSequence, combination_count};
use crate::placebo::results::{
    ConfidenceInterval, EffectKind, InferenceWarning, IntervalBounds, PlaceboOutcome,
    ScalarEstimate, VectorEstimate,
};
use crate::placebo::validation::{validate_effect_matrices, validate_level};
use crate::placebo::errors::{PlaceboError, PlaceboResult};
use ndarray::{Array1, Array2, Axis};

/// PValuePolicy — whether the observed statistic counts as one member of
/// its own permutation reference set.
///
/// Variants
/// --------
/// - `IncludeObserved`
///   `p = (count + 1) / (n_placebo + 1)` — the ADH (2010) convention and
///   the default; p-values are bounded below by `1 / (n_placebo + 1)`.
/// - `ExcludeObserved`
///   `p = count / n_placebo` — the CGNP (2013) / ADH (2015) convention;
///   a never-exceeded observed statistic yields exactly 0.
///
/// Notes
/// -----
/// - Which convention is "right" is a documented but debated choice, so
///   it is a policy rather than a hard-coded constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PValuePolicy {
    #[default]
    IncludeObserved,
    ExcludeObserved,
}

/// PlaceboOptions — configuration for one placebo run.
///
/// Purpose
/// -------
/// Collect the sampling cap, output retention flags, confidence-interval
/// request, p-value convention, and random seed in one explicit value so
/// call sites pass validated intent instead of ad-hoc flags.
///
/// Fields
/// ------
/// - `max_combinations`: `usize`
///   Cap on placebo draws; sampling replaces exhaustive enumeration only
///   when the cap is strictly positive and C(N0, N1) exceeds it. `0`
///   disables the cap entirely.
/// - `keep_placebos`: `bool`
///   Retain the full placebo distributions on the returned estimates.
/// - `confidence_intervals`: `bool`
///   Build percentile confidence intervals (implies retention during the
///   run).
/// - `level`: `f64`
///   Confidence level (1 − α); validated only when intervals are
///   requested, and then must lie strictly in (0, 1).
/// - `p_value_policy`: [`PValuePolicy`]
///   Reference-set convention for p-values.
/// - `random_seed`: `Option<u64>`
///   Seed for the sampled traversal; entropy-derived when `None`, so
///   reproducibility requires an explicit seed.
///
/// Invariants
/// ----------
/// - `Default`: cap 1 000 000, nothing retained, no intervals, level
///   0.95, inclusive p-values, unseeded.
///
/// Notes
/// -----
/// - Memory for retained distributions is
///   `n_placebo × (T1 + 2)` floats; size `max_combinations` deliberately
///   for large pools.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceboOptions {
    /// Cap on placebo draws; 0 disables sampling.
    pub max_combinations: usize,
    /// Retain the full placebo distributions on the estimates.
    pub keep_placebos: bool,
    /// Build percentile confidence intervals.
    pub confidence_intervals: bool,
    /// Confidence level (1 − α), checked only when intervals are requested.
    pub level: f64,
    /// Reference-set convention for p-values.
    pub p_value_policy: PValuePolicy,
    /// Seed for the sampling generator; None draws one from entropy.
    pub random_seed: Option<u64>,
}

impl Default for PlaceboOptions {
    fn default() -> PlaceboOptions {
        PlaceboOptions {
            max_combinations: 1_000_000,
            keep_placebos: false,
            confidence_intervals: false,
            level: 0.95,
            p_value_policy: PValuePolicy::IncludeObserved,
            random_seed: None,
        }
    }
}

impl PlaceboOutcome {
    /// Run the placebo permutation test.
    ///
    /// Parameters
    /// ----------
    /// - `control_effects`: `&Array2<f64>`
    ///   Per-unit-per-period effects for the N0 control units (N0 × T1).
    /// - `treated_effects`: `&Array2<f64>`
    ///   Per-unit-per-period effects for the N1 treated units (N1 × T1).
    ///   Must satisfy N1 ≥ 1, N0 ≥ N1, and share T1 ≥ 1 with the
    ///   controls; all entries finite.
    /// - `opts`: `&PlaceboOptions`
    ///   Sampling cap, retention flags, interval request, p-value
    ///   convention, and seed.
    ///
    /// Returns
    /// -------
    /// `PlaceboResult<PlaceboOutcome>`
    ///   - `Ok(PlaceboOutcome)` bundling the three effect views, the
    ///     number of placebo combinations processed, and any
    ///     degenerate-interval warnings.
    ///   - `Err(PlaceboError)` when validation fails.
    ///
    /// Errors
    /// ------
    /// - `PlaceboError::EmptyPeriods`, `PeriodMismatch`, `NoTreatedUnits`,
    ///   `NotEnoughControls`, `NonFiniteEffect`
    ///   Shape and finiteness failures from
    ///   `validation::validate_effect_matrices`.
    /// - `PlaceboError::InvalidLevel`
    ///   Returned when intervals were requested with a level outside
    ///   (0, 1); the level is ignored otherwise.
    /// - `PlaceboError::InsufficientDraws`
    ///   Returned when intervals were requested but the sampling cap
    ///   retained fewer draws than the level's two tail ranks need
    ///   between them, so no ordered interval exists.
    ///
    /// Panics
    /// ------
    /// - Never panics under normal operation; all user-facing invalid
    ///   inputs are surfaced as `PlaceboError` values.
    ///
    /// Notes
    /// -----
    /// - `n_placebo` equals `min(max_combinations, C(N0, N1))` when the
    ///   cap is positive, `C(N0, N1)` otherwise.
    /// - Sampled draws are unique within a draw but not deduplicated
    ///   across draws; exact enumeration is lexicographic.
    /// - The degenerate-interval warning is emitted via `log::warn!` AND
    ///   recorded on the outcome, so headless callers still see it.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// use ndarray::array;
    /// use rust_synthcontrol::placebo::{PlaceboOptions, PlaceboOutcome};
    ///
    /// let control = array![[0.1, -0.2], [0.0, 0.3], [-0.1, 0.1], [0.2, 0.0]];
    /// let treated = array![[1.0, 1.2]];
    ///
    /// let outcome = PlaceboOutcome::run(&control, &treated, &PlaceboOptions::default()).unwrap();
    ///
    /// assert_eq!(outcome.n_placebo, 4);
    /// assert!(outcome.avg_joint_effect.p_value <= 1.0);
    /// ```
    pub fn run(
        control_effects: &Array2<f64>, treated_effects: &Array2<f64>, opts: &PlaceboOptions,
    ) -> PlaceboResult<PlaceboOutcome> {
        validate_effect_matrices(control_effects, treated_effects)?;
        if opts.confidence_intervals {
            validate_level(opts.level)?;
        }

        let n0 = control_effects.nrows();
        let n1 = treated_effects.nrows();
        let t1 = treated_effects.ncols();

        // Per-unit aggregates across the time axis.
        let control_avg = unit_means(control_effects);
        let control_rms = unit_rms(control_effects);
        let treated_avg = unit_means(treated_effects);
        let treated_rms = unit_rms(treated_effects);

        // Observed aggregates for the treated group.
        let effect_vec = treated_effects
            .mean_axis(Axis(0))
            .expect("validated: at least one treated unit");
        let avg_joint_effect = treated_avg.sum() / n1 as f64;
        let rms_joint_effect = treated_rms.sum() / n1 as f64;

        let n_pl = combination_count(n0, n1);
        let plan = CombinationPlan::select(n_pl, opts.max_combinations);
        let n_placebo = plan.len();
        let keep = opts.keep_placebos || opts.confidence_intervals;

        let mut placebo_effect_vecs = keep.then(|| Array2::<f64>::zeros((n_placebo, t1)));
        let mut placebo_avgs = keep.then(|| Array1::<f64>::zeros(n_placebo));
        let mut placebo_rms = keep.then(|| Array1::<f64>::zeros(n_placebo));

        let mut vec_counts = vec![0_u64; t1];
        let mut avg_count = 0_u64;
        let mut rms_count = 0_u64;
        let mut scratch = vec![0.0_f64; t1];

        let sequence = CombinationSequence::with_seed(&plan, n0, n1, opts.random_seed);
        for (idx, comb) in sequence.enumerate() {
            let inv = 1.0 / comb.len() as f64;

            scratch.fill(0.0);
            let mut avg_acc = 0.0;
            let mut rms_acc = 0.0;
            for &unit in &comb {
                for (slot, value) in scratch.iter_mut().zip(control_effects.row(unit)) {
                    *slot += value;
                }
                avg_acc += control_avg[unit];
                rms_acc += control_rms[unit];
            }
            let placebo_avg = avg_acc * inv;
            let placebo_rms_value = rms_acc * inv;

            for (t, slot) in scratch.iter_mut().enumerate() {
                *slot *= inv;
                if slot.abs() >= effect_vec[t].abs() {
                    vec_counts[t] += 1;
                }
            }
            if placebo_avg.abs() >= avg_joint_effect.abs() {
                avg_count += 1;
            }
            // One-sided: the RMS statistic is non-negative by construction.
            if placebo_rms_value >= rms_joint_effect {
                rms_count += 1;
            }

            if let Some(vecs) = placebo_effect_vecs.as_mut() {
                for (t, slot) in scratch.iter().enumerate() {
                    vecs[[idx, t]] = *slot;
                }
            }
            if let Some(avgs) = placebo_avgs.as_mut() {
                avgs[idx] = placebo_avg;
            }
            if let Some(rms) = placebo_rms.as_mut() {
                rms[idx] = placebo_rms_value;
            }
        }

        let vec_p = Array1::from_iter(
            vec_counts.iter().map(|&c| calc_p_value(c, n_placebo, opts.p_value_policy)),
        );
        let avg_p = calc_p_value(avg_count, n_placebo, opts.p_value_policy);
        let rms_p = calc_p_value(rms_count, n_placebo, opts.p_value_policy);

        let mut warnings = Vec::new();
        let (ci_vec, ci_avg, ci_rms) = if opts.confidence_intervals {
            // Tail granularity comes from the EXACT combination count, not
            // the sampled draw count.
            let alpha = 1.0 - opts.level;
            let p2min = 2.0 / n_pl as f64;
            let alpha_ind = ((alpha / p2min).round() as usize).max(1);

            // The two 1-indexed tail ranks are alpha_ind and
            // npl + 1 - alpha_ind; they stay ordered only while
            // 2 * alpha_ind <= npl + 1. A sampling cap below that breaks
            // the interval, so reject it instead of flipping the bounds.
            if 2 * alpha_ind > n_placebo + 1 {
                return Err(PlaceboError::InsufficientDraws { alpha_ind, n_placebo });
            }

            let vecs = placebo_effect_vecs
                .as_ref()
                .expect("placebo vectors retained when intervals are requested");
            let avgs = placebo_avgs
                .as_ref()
                .expect("placebo averages retained when intervals are requested");
            let rms = placebo_rms
                .as_ref()
                .expect("placebo RMS values retained when intervals are requested");

            let mut low = Array1::<f64>::zeros(t1);
            let mut high = Array1::<f64>::zeros(t1);
            for t in 0..t1 {
                let mut column = vecs.column(t).to_vec();
                let (lo, hi) = interval_from_distribution(
                    &mut column,
                    alpha_ind,
                    effect_vec[t],
                    true,
                    EffectKind::PerPeriod,
                    Some(t),
                    &mut warnings,
                );
                low[t] = lo;
                high[t] = hi;
            }
            let ci_vec = ConfidenceInterval {
                bounds: IntervalBounds::PerPeriod { low, high },
                level: opts.level,
            };

            let (avg_lo, avg_hi) = interval_from_distribution(
                &mut avgs.to_vec(),
                alpha_ind,
                avg_joint_effect,
                true,
                EffectKind::Average,
                None,
                &mut warnings,
            );
            let ci_avg = ConfidenceInterval {
                bounds: IntervalBounds::Scalar { low: avg_lo, high: avg_hi },
                level: opts.level,
            };

            let (rms_lo, rms_hi) = interval_from_distribution(
                &mut rms.to_vec(),
                alpha_ind,
                rms_joint_effect,
                false,
                EffectKind::Rms,
                None,
                &mut warnings,
            );
            let ci_rms = ConfidenceInterval {
                bounds: IntervalBounds::Scalar { low: rms_lo, high: rms_hi },
                level: opts.level,
            };

            (Some(ci_vec), Some(ci_avg), Some(ci_rms))
        } else {
            (None, None, None)
        };

        Ok(PlaceboOutcome {
            effect_vec: VectorEstimate {
                effect: effect_vec,
                p_values: vec_p,
                interval: ci_vec,
                placebos: placebo_effect_vecs,
            },
            avg_joint_effect: ScalarEstimate {
                effect: avg_joint_effect,
                p_value: avg_p,
                interval: ci_avg,
                placebos: placebo_avgs,
            },
            rms_joint_effect: ScalarEstimate {
                effect: rms_joint_effect,
                p_value: rms_p,
                interval: ci_rms,
                placebos: placebo_rms,
            },
            n_placebo,
            warnings,
        })
    }
}

//
// ---------- Private helpers (compact docs) ----------
//

/// Per-unit mean across the time axis of an effect matrix.
#[inline]
fn unit_means(effects: &Array2<f64>) -> Array1<f64> {
    effects.map_axis(Axis(1), |row| row.sum() / row.len() as f64)
}

/// Per-unit root-mean-square across the time axis of an effect matrix.
#[inline]
fn unit_rms(effects: &Array2<f64>) -> Array1<f64> {
    effects.map_axis(Axis(1), |row| {
        (row.iter().map(|v| v * v).sum::<f64>() / row.len() as f64).sqrt()
    })
}

/// Convert an at-least-as-extreme count into a permutation p-value.
///
/// Parameters
/// ----------
/// - `count`: number of placebo draws at least as extreme as observed.
/// - `n_placebo`: number of placebo draws processed.
/// - `policy`: reference-set convention (adds 1 to both terms when the
///   observed statistic is included).
#[inline]
fn calc_p_value(count: u64, n_placebo: usize, policy: PValuePolicy) -> f64 {
    let addition = match policy {
        PValuePolicy::IncludeObserved => 1.0,
        PValuePolicy::ExcludeObserved => 0.0,
    };
    (count as f64 + addition) / (n_placebo as f64 + addition)
}

/// Invert one placebo distribution into interval bounds around the
/// observed effect.
///
/// Parameters
/// ----------
/// - `draws`: retained placebo values for one statistic; sorted in place.
/// - `alpha_ind`: 1-indexed order-statistic rank for the lower tail.
/// - `observed`: the observed value of the statistic.
/// - `null_is_zero`: whether a same-signed nonzero bound pair should
///   raise the degenerate-interval warning (false for RMS).
/// - `effect`, `period`: identification for the warning payload.
///
/// Returns
/// -------
/// `(f64, f64)`
///   `(observed − high, observed − low)` where `low`/`high` are the
///   clamped order statistics of the distribution.
///
/// Notes
/// -----
/// - 1-indexed ranks `alpha_ind` and `npl + 1 − alpha_ind` map to
///   0-indexed positions `alpha_ind − 1` and `npl − alpha_ind`, each
///   clamped into `[0, npl − 1]`.
/// - The caller rejects rank configurations that would cross before
///   calling in, so the distribution-side bounds satisfy `low ≤ high`.
fn interval_from_distribution(
    draws: &mut [f64], alpha_ind: usize, observed: f64, null_is_zero: bool, effect: EffectKind,
    period: Option<usize>, warnings: &mut Vec<InferenceWarning>,
) -> (f64, f64) {
    draws.sort_unstable_by(f64::total_cmp);
    let npl = draws.len();
    let low_idx = (alpha_ind - 1).min(npl - 1);
    let high_idx = npl.saturating_sub(alpha_ind).min(npl - 1);
    let dist_low = draws[low_idx];
    let dist_high = draws[high_idx];

    if null_is_zero
        && dist_low != 0.0
        && dist_high != 0.0
        && dist_low.signum() == dist_high.signum()
    {
        let warning = InferenceWarning::IntervalExcludesZero { effect, period };
        log::warn!("{warning}");
        warnings.push(warning);
    }

    (observed - dist_high, observed - dist_low)
}
