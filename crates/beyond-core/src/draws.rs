//! Random draw sources for the reward engine.
//!
//! The engine never touches an RNG directly; it asks a [`DrawSource`] for
//! a unit draw (weighted selection) or an index (uniform pick). Swapping the
//! source makes every resolution reproducible: a seeded [`RngDraws`] gives
//! the same outcome sequence on every run, and [`ScriptedDraws`] replays an
//! exact list of values.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A source of random draws.
pub trait DrawSource: Send {
    /// A uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// A uniform index in `[0, len)`. Returns 0 when `len` is 0.
    fn index(&mut self, len: usize) -> usize;
}

/// Draws backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDraws<R> {
    rng: R,
}

impl<R: Rng + Send> RngDraws<R> {
    /// Wrap an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDraws<SmallRng> {
    /// A reproducible source seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    /// A source seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::new(SmallRng::from_os_rng())
    }

    /// Seeded when `seed` is given, entropy-seeded otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl<R: Rng + Send> DrawSource for RngDraws<R> {
    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.random_range(0..len)
    }
}

/// Replays a fixed sequence of draws.
///
/// Unit draws and index draws are queued separately. An exhausted queue
/// yields 0, which deterministically selects the first candidate.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraws {
    units: VecDeque<f64>,
    indices: VecDeque<usize>,
}

impl ScriptedDraws {
    /// Replay `units` for weighted draws and `indices` for uniform picks.
    pub fn new(
        units: impl IntoIterator<Item = f64>,
        indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            units: units.into_iter().collect(),
            indices: indices.into_iter().collect(),
        }
    }

    /// Replay only unit draws.
    pub fn units(units: impl IntoIterator<Item = f64>) -> Self {
        Self::new(units, [])
    }

    /// Number of unit draws not yet consumed.
    pub fn remaining_units(&self) -> usize {
        self.units.len()
    }
}

impl DrawSource for ScriptedDraws {
    fn unit(&mut self) -> f64 {
        self.units.pop_front().unwrap_or(0.0).clamp(0.0, 1.0)
    }

    fn index(&mut self, len: usize) -> usize {
        let raw = self.indices.pop_front().unwrap_or(0);
        raw.checked_rem(len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_repeat() {
        let mut a = RngDraws::seeded(42);
        let mut b = RngDraws::seeded(42);
        for _ in 0..100 {
            assert!((a.unit() - b.unit()).abs() < f64::EPSILON);
            assert_eq!(a.index(7), b.index(7));
        }
    }

    #[test]
    fn unit_draws_are_in_range() {
        let mut draws = RngDraws::seeded(7);
        for _ in 0..1_000 {
            let u = draws.unit();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn index_of_empty_range_is_zero() {
        let mut draws = RngDraws::seeded(7);
        assert_eq!(draws.index(0), 0);
    }

    #[test]
    fn scripted_draws_replay_then_default_to_zero() {
        let mut draws = ScriptedDraws::new([0.25, 0.75], [3, 9]);
        assert!((draws.unit() - 0.25).abs() < f64::EPSILON);
        assert!((draws.unit() - 0.75).abs() < f64::EPSILON);
        assert!(draws.unit().abs() < f64::EPSILON);

        assert_eq!(draws.index(5), 3);
        // Out-of-range scripted indices wrap.
        assert_eq!(draws.index(5), 4);
        assert_eq!(draws.index(5), 0);
    }
}
