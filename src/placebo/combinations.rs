//! placebo::combinations — control-unit combination counting and traversal.
//!
//! Purpose
//! -------
//! Provide the combinatorial machinery behind the placebo engine: an
//! overflow-safe count of C(N0, N1), an explicit plan choosing between
//! exhaustive enumeration and random sampling, and a single
//! sequence-producer abstraction over both traversal modes so the
//! aggregation loop in the engine is written once.
//!
//! Key behaviors
//! -------------
//! - Count unordered size-k subsets of an n-element pool with saturation
//!   at `u64::MAX` instead of overflow.
//! - Decide between exact (lexicographic) and approximate (uniform draw)
//!   traversal via [`CombinationPlan::select`], using a LOGICAL conjunction
//!   of "cap is positive" and "cap is exceeded".
//! - Yield combinations as ascending index vectors from
//!   [`CombinationSequence`], regardless of the underlying mode.
//!
//! Invariants & assumptions
//! ------------------------
//! - Sampled draws are size-k subsets without repetition *within* a draw;
//!   distinct draws are not globally deduplicated.
//! - The random generator is owned by the sequence and injected by the
//!   caller; no process-global randomness is consumed, so seeding the
//!   generator makes the traversal fully deterministic.
//! - Exhaustive traversal is only chosen when the caller accepted the full
//!   count (cap 0 or cap ≥ C(n, k)); the structural guard against
//!   combinatorial explosion is the cap, not preemption.
//!
//! Conventions
//! -----------
//! - Combinations are reported with indices sorted ascending, so both
//!   modes present the same shape to the aggregation loop.
//! - Saturation of the count can only matter in sampled mode, where the
//!   count is used solely for the comparison against the cap and for the
//!   interval granularity `2 / n_pl`.
//!
//! Downstream usage
//! ----------------
//! - The engine computes `combination_count(N0, N1)`, selects a
//!   [`CombinationPlan`], builds a [`CombinationSequence`] with a seeded
//!   `Xoshiro256PlusPlus`, and folds over the yielded index vectors.
//! - [`CombinationPlan::len`] is the number of placebo draws the engine
//!   will process (`n_placebo` on the outcome).
//!
//! Testing notes
//! -------------
//! - Unit tests cover count correctness and saturation, plan selection on
//!   both sides of the cap, lexicographic completeness and ordering, and
//!   sampled-mode draw shape and determinism under a fixed seed.

use rand::SeedableRng;
use rand::seq::index::sample;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Count unordered size-`k` subsets of an `n`-element pool, saturating.
///
/// Parameters
/// ----------
/// - `n`: `usize`
///   Pool size (number of control units).
/// - `k`: `usize`
///   Subset size (number of treated units).
///
/// Returns
/// -------
/// `u64`
///   C(n, k), or `u64::MAX` if the true count exceeds the `u64` range,
///   or `0` when `k > n`.
///
/// Panics
/// ------
/// - Never panics; intermediate products are carried in `u128` and the
///   running quotient is exact at every step.
///
/// Notes
/// -----
/// - Uses the symmetric form C(n, k) = C(n, n−k) and the stepwise
///   identity `C(m, i) = C(m−1, i−1) · m / i`, which keeps every
///   intermediate value integral.
pub fn combination_count(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut count: u128 = 1;
    for i in 1..=k {
        count = count * (n - k + i) as u128 / i as u128;
        if count > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    count as u64
}

/// CombinationPlan — exhaustive vs sampled traversal decision.
///
/// Purpose
/// -------
/// Make the exact/approximate switch of the placebo engine an explicit,
/// inspectable value rather than an implicit branch, recording both the
/// chosen mode and the number of draws it will produce.
///
/// Variants
/// --------
/// - `Exhaustive { total: u64 }`
///   Enumerate every one of the `total` combinations lexicographically.
/// - `Sampled { draws: usize }`
///   Draw `draws` uniform size-k subsets, each without repetition inside
///   the draw; distinct draws may repeat.
///
/// Invariants
/// ----------
/// - `Sampled` is selected only when the cap is strictly positive AND the
///   exact count strictly exceeds it; otherwise `Exhaustive` is used.
///
/// Notes
/// -----
/// - The selection condition is a logical `&&`; a bitwise `&` here would
///   bind tighter than the comparisons and silently change the branch
///   taken for some values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinationPlan {
    Exhaustive { total: u64 },
    Sampled { draws: usize },
}

impl CombinationPlan {
    /// Choose a traversal plan from the exact count and the caller's cap.
    ///
    /// Parameters
    /// ----------
    /// - `total`: `u64`
    ///   Exact combination count C(N0, N1), possibly saturated.
    /// - `max_combinations`: `usize`
    ///   Caller-supplied cap; `0` disables sampling entirely.
    ///
    /// Returns
    /// -------
    /// `CombinationPlan`
    ///   `Sampled { draws: max_combinations }` when the cap is positive
    ///   and exceeded, `Exhaustive { total }` otherwise.
    pub fn select(total: u64, max_combinations: usize) -> CombinationPlan {
        if max_combinations > 0 && total > max_combinations as u64 {
            CombinationPlan::Sampled { draws: max_combinations }
        } else {
            CombinationPlan::Exhaustive { total }
        }
    }

    /// Number of combinations this plan will yield.
    pub fn len(&self) -> usize {
        match self {
            CombinationPlan::Exhaustive { total } => *total as usize,
            CombinationPlan::Sampled { draws } => *draws,
        }
    }

    /// Whether the plan yields no combinations at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// CombinationSequence — one producer over both traversal modes.
///
/// Purpose
/// -------
/// Present exhaustive enumeration and random sampling behind a single
/// `Iterator` surface so the engine's aggregation loop is mode-agnostic.
///
/// Key behaviors
/// -------------
/// - In exhaustive mode, yields all C(n, k) ascending index vectors in
///   lexicographic order.
/// - In sampled mode, yields exactly `draws` uniform subsets, sorted
///   ascending before being returned.
///
/// Invariants
/// ----------
/// - Every yielded vector has length `k` with strictly increasing entries
///   in `0..n`.
/// - The sequence length equals [`CombinationPlan::len`] of the plan it
///   was built from.
///
/// Performance
/// -----------
/// - One `Vec<usize>` allocation of length `k` per yielded combination;
///   the engine's scratch buffers are reused across draws.
///
/// Notes
/// -----
/// - The generator is owned by the sequence; callers control determinism
///   entirely through the seed they construct it with.
#[derive(Debug)]
pub struct CombinationSequence {
    inner: SequenceInner,
}

#[derive(Debug)]
enum SequenceInner {
    Lexicographic { next: Option<Vec<usize>>, n: usize, k: usize },
    Sampled { remaining: usize, n: usize, k: usize, rng: Xoshiro256PlusPlus },
}

impl CombinationSequence {
    /// Build a sequence for `plan` over subsets of size `k` from `0..n`.
    ///
    /// Parameters
    /// ----------
    /// - `plan`: `&CombinationPlan`
    ///   Traversal decision from [`CombinationPlan::select`].
    /// - `n`: `usize`
    ///   Pool size; must satisfy `k ≤ n` (guaranteed by engine
    ///   validation).
    /// - `k`: `usize`
    ///   Subset size.
    /// - `rng`: `Xoshiro256PlusPlus`
    ///   Owned random generator; consumed only in sampled mode.
    ///
    /// Returns
    /// -------
    /// `CombinationSequence`
    ///   An iterator yielding `plan.len()` ascending index vectors.
    pub fn new(
        plan: &CombinationPlan, n: usize, k: usize, rng: Xoshiro256PlusPlus,
    ) -> CombinationSequence {
        let inner = match plan {
            CombinationPlan::Exhaustive { total } => {
                let next = if *total == 0 { None } else { Some((0..k).collect()) };
                SequenceInner::Lexicographic { next, n, k }
            }
            CombinationPlan::Sampled { draws } => {
                SequenceInner::Sampled { remaining: *draws, n, k, rng }
            }
        };
        CombinationSequence { inner }
    }

    /// Build a sequence seeded from an optional caller seed.
    ///
    /// Parameters
    /// ----------
    /// - `seed`: `Option<u64>`
    ///   Explicit seed for reproducible sampling; entropy-derived when
    ///   `None`.
    ///
    /// Notes
    /// -----
    /// - Exhaustive plans ignore the generator entirely, so the seed only
    ///   affects sampled traversals.
    pub fn with_seed(
        plan: &CombinationPlan, n: usize, k: usize, seed: Option<u64>,
    ) -> CombinationSequence {
        let seed = seed.unwrap_or_else(rand::random);
        CombinationSequence::new(plan, n, k, Xoshiro256PlusPlus::seed_from_u64(seed))
    }
}

impl Iterator for CombinationSequence {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        match &mut self.inner {
            SequenceInner::Lexicographic { next, n, k } => {
                let current = next.take()?;
                *next = advance_lexicographic(&current, *n, *k);
                Some(current)
            }
            SequenceInner::Sampled { remaining, n, k, rng } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                let mut draw = sample(rng, *n, *k).into_vec();
                draw.sort_unstable();
                Some(draw)
            }
        }
    }
}

/// Compute the lexicographic successor of an ascending index vector.
///
/// Parameters
/// ----------
/// - `current`: `&[usize]`
///   Ascending indices of the current combination.
/// - `n`, `k`: pool and subset sizes.
///
/// Returns
/// -------
/// `Option<Vec<usize>>`
///   The next combination, or `None` when `current` is the final one
///   (`[n-k, …, n-1]`).
///
/// Notes
/// -----
/// - Standard odometer step: bump the rightmost index that has headroom
///   and reset everything to its right to consecutive values.
fn advance_lexicographic(current: &[usize], n: usize, k: usize) -> Option<Vec<usize>> {
    let mut next = current.to_vec();
    let mut pivot = None;
    for i in (0..k).rev() {
        if next[i] < n - k + i {
            pivot = Some(i);
            break;
        }
    }
    let pivot = pivot?;
    next[pivot] += 1;
    for j in pivot + 1..k {
        next[j] = next[j - 1] + 1;
    }
    Some(next)
}
