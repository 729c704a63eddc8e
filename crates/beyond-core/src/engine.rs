//! The reward engine: one discovery in, one resolved outcome out.
//!
//! Resolution reads the table, the modifier set, the current time, and a
//! draw source. It mutates the modifier set only to purge expired entries
//! and consume forced uses; progress is never touched here.
//!
//! # Resolution order
//!
//! 1. Purge expired modifiers.
//! 2. A live force outcome with uses left picks uniformly among the tiers
//!    its filter matches, ignoring weights.
//! 3. Otherwise a weighted draw over the reweighted pool. An empty pool
//!    falls back to the table's fallback tier.
//! 4. Base points are scaled by every live points multiplier and rounded.

use beyond_types::{ResolvedOutcome, Selection};
use tracing::{debug, warn};

use crate::draws::DrawSource;
use crate::modifiers::ModifierSet;
use crate::table::{PoolEntry, RarityTable, TableError};

/// Stateless discovery resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardEngine;

impl RewardEngine {
    /// Resolve one discovery at `now`.
    ///
    /// Never fails: an empty weighted pool resolves to the fallback tier.
    pub fn resolve(
        table: &RarityTable,
        modifiers: &mut ModifierSet,
        now: i64,
        draws: &mut dyn DrawSource,
    ) -> ResolvedOutcome {
        modifiers.purge_expired(now);

        let (tier_index, selection) = Self::select(table, modifiers, now, draws);
        let tier = table
            .get(tier_index)
            .unwrap_or_else(|| table.fallback_tier().1);
        let (tier_name, base_points) = (tier.name.clone(), tier.points);

        let multiplier = modifiers.points_multiplier(now);
        let points_awarded = apply_multiplier(base_points, multiplier);

        debug!(
            tier = %tier_name,
            tier_index,
            base_points,
            points_awarded,
            ?selection,
            "discovery resolved"
        );

        ResolvedOutcome {
            tier_name,
            tier_index,
            base_points,
            points_awarded,
            selection,
        }
    }

    fn select(
        table: &RarityTable,
        modifiers: &mut ModifierSet,
        now: i64,
        draws: &mut dyn DrawSource,
    ) -> (usize, Selection) {
        let forced = modifiers
            .force_outcome(now)
            .map(|(effect, filter)| (effect, filter.clone()));

        if let Some((effect, filter)) = forced {
            let candidates = table
                .tiers_matching(&filter)
                .map(|(index, _)| index)
                .collect::<Vec<_>>();
            if candidates.is_empty() {
                warn!(effect = %effect, "forced outcome matches no tier; drawing normally");
            } else {
                modifiers.consume_force_use(effect);
                let pick = draws.index(candidates.len());
                let index = candidates.get(pick).copied().unwrap_or_default();
                return (index, Selection::Forced(effect));
            }
        }

        match table.resolve_weighted_pool(modifiers, now) {
            Ok(pool) => (draw_weighted(&pool, draws.unit()), Selection::Weighted),
            Err(TableError::EmptyWeightPool | TableError::InvalidTable { .. }) => {
                let (index, tier) = table.fallback_tier();
                warn!(tier = %tier.name, "weighted pool is empty; using fallback tier");
                (index, Selection::Fallback)
            }
        }
    }
}

/// Cumulative draw over `pool` in table order.
///
/// `r = unit * total`; the first entry whose cumulative weight is `>= r`
/// wins, so a draw landing exactly on a boundary selects the tier that
/// boundary closes. Rounding past the last boundary selects the last entry.
fn draw_weighted(pool: &[PoolEntry<'_>], unit: f64) -> usize {
    let total: f64 = pool.iter().map(|entry| entry.effective_weight).sum();
    let r = unit * total;

    let mut cumulative = 0.0;
    for entry in pool {
        cumulative += entry.effective_weight;
        if cumulative >= r {
            return entry.index;
        }
    }
    pool.last().map_or(0, |entry| entry.index)
}

/// `round(points * multiplier)`, saturating into `u64`.
fn apply_multiplier(points: u64, multiplier: f64) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let scaled = (points as f64 * multiplier).round();
    if !scaled.is_finite() || scaled <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ceiling = u64::MAX as f64;
    if scaled >= ceiling {
        return u64::MAX;
    }
    // Safe: 0 < scaled < u64::MAX and integral after round().
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let awarded = scaled as u64;
    awarded
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use beyond_types::{EffectId, ModifierEffect, RarityTier, TierFilter};

    use super::*;
    use crate::draws::{RngDraws, ScriptedDraws};

    fn a_b_table() -> RarityTable {
        RarityTable::new(vec![
            RarityTier::new("A", 90.0, 0),
            RarityTier::new("B", 10.0, 100),
        ])
        .unwrap()
    }

    #[test]
    fn draw_of_95_selects_b() {
        let table = a_b_table();
        let mut modifiers = ModifierSet::default();
        let mut draws = ScriptedDraws::units([0.95]);

        let outcome = RewardEngine::resolve(&table, &mut modifiers, 0, &mut draws);
        assert_eq!(outcome.tier_name, "B");
        assert_eq!(outcome.tier_index, 1);
        assert_eq!(outcome.points_awarded, 100);
        assert_eq!(outcome.selection, Selection::Weighted);
    }

    #[test]
    fn boundary_draw_selects_the_tier_it_closes() {
        let table = a_b_table();
        let mut modifiers = ModifierSet::default();
        // r = 90 exactly: cumulative of A is 90, so A wins.
        let mut draws = ScriptedDraws::units([0.9]);
        let outcome = RewardEngine::resolve(&table, &mut modifiers, 0, &mut draws);
        assert_eq!(outcome.tier_name, "A");
    }

    #[test]
    fn double_points_doubles_award() {
        let table = RarityTable::new(vec![RarityTier::new("Beyond Epic", 1.0, 50)]).unwrap();
        let mut modifiers = ModifierSet::default();
        modifiers.activate_catalog(EffectId::DoublePoints, 0);
        let mut draws = ScriptedDraws::units([0.5]);

        let outcome = RewardEngine::resolve(&table, &mut modifiers, 1_000, &mut draws);
        assert_eq!(outcome.base_points, 50);
        assert_eq!(outcome.points_awarded, 100);
    }

    #[test]
    fn lapsed_multiplier_is_purged_and_ignored() {
        let table = RarityTable::new(vec![RarityTier::new("X", 1.0, 50)]).unwrap();
        let mut modifiers = ModifierSet::default();
        modifiers.activate_catalog(EffectId::DoublePoints, 0);
        let mut draws = ScriptedDraws::default();

        let outcome = RewardEngine::resolve(&table, &mut modifiers, 30_000, &mut draws);
        assert_eq!(outcome.points_awarded, 50);
        assert!(modifiers.get(EffectId::DoublePoints).is_none());
    }

    #[test]
    fn force_outcome_ignores_weights_and_consumes_use() {
        let table = RarityTable::new(vec![
            RarityTier::new("A", 99.0, 0),
            RarityTier::new("B", 0.9, 10),
            RarityTier::new("C", 0.1, 40),
        ])
        .unwrap();
        let mut modifiers = ModifierSet::default();
        modifiers.activate(
            EffectId::LuckyClick,
            ModifierEffect::ForceOutcome {
                filter: TierFilter::MinPoints(40),
                remaining_uses: 1,
            },
            None,
            0,
        );
        let mut draws = ScriptedDraws::new([0.0], [0]);

        let outcome = RewardEngine::resolve(&table, &mut modifiers, 10, &mut draws);
        assert_eq!(outcome.tier_name, "C");
        assert_eq!(outcome.selection, Selection::Forced(EffectId::LuckyClick));
        assert_eq!(modifiers.remaining_uses(EffectId::LuckyClick), Some(0));

        // The next discovery draws normally.
        let next = RewardEngine::resolve(&table, &mut modifiers, 20, &mut draws);
        assert_eq!(next.tier_name, "A");
        assert_eq!(next.selection, Selection::Weighted);
    }

    #[test]
    fn force_outcome_reaches_zero_weighted_tiers() {
        let table = RarityTable::standard();
        let mut modifiers = ModifierSet::default();
        modifiers.activate_catalog(EffectId::GoldenHour, 0);
        modifiers.activate(
            EffectId::LuckyClick,
            ModifierEffect::ForceOutcome {
                filter: TierFilter::Named("Very Common".to_owned()),
                remaining_uses: 1,
            },
            None,
            0,
        );
        let mut draws = ScriptedDraws::default();
        let outcome = RewardEngine::resolve(&table, &mut modifiers, 1, &mut draws);
        assert_eq!(outcome.tier_name, "Very Common");
    }

    #[test]
    fn unmatched_force_keeps_its_use() {
        let table = a_b_table();
        let mut modifiers = ModifierSet::default();
        modifiers.activate_catalog(EffectId::LuckyClick, 0);
        let mut draws = ScriptedDraws::units([0.1]);

        let outcome = RewardEngine::resolve(&table, &mut modifiers, 1, &mut draws);
        assert_eq!(outcome.selection, Selection::Weighted);
        assert_eq!(modifiers.remaining_uses(EffectId::LuckyClick), Some(1));
    }

    #[test]
    fn empty_pool_falls_back_to_first_tier() {
        let table = a_b_table();
        let mut modifiers = ModifierSet::default();
        modifiers.activate(
            EffectId::GoldenHour,
            ModifierEffect::Reweight {
                filter: TierFilter::MinPoints(0),
                multiplier: 0.0,
            },
            Some(10_000),
            0,
        );
        let mut draws = ScriptedDraws::units([0.99]);

        let outcome = RewardEngine::resolve(&table, &mut modifiers, 5, &mut draws);
        assert_eq!(outcome.tier_name, "A");
        assert_eq!(outcome.selection, Selection::Fallback);
    }

    #[test]
    fn golden_hour_only_yields_epic_or_better() {
        let table = RarityTable::standard();
        let mut modifiers = ModifierSet::default();
        modifiers.activate_catalog(EffectId::GoldenHour, 0);
        let mut draws = RngDraws::seeded(11);
        for step in 0..500 {
            let outcome = RewardEngine::resolve(&table, &mut modifiers, step, &mut draws);
            assert!(outcome.base_points >= 12, "got {}", outcome.tier_name);
        }
    }

    #[test]
    fn same_seed_same_outcomes() {
        let table = RarityTable::standard();
        let run = |seed| {
            let mut modifiers = ModifierSet::default();
            let mut draws = RngDraws::seeded(seed);
            (0..200)
                .map(|now| RewardEngine::resolve(&table, &mut modifiers, now, &mut draws))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(2024), run(2024));
    }

    #[test]
    fn frequencies_converge_to_weights() {
        let table = a_b_table();
        let mut modifiers = ModifierSet::default();
        let mut draws = RngDraws::seeded(7);
        let trials = 100_000_u32;
        let hits_b = (0..trials)
            .filter(|_| {
                RewardEngine::resolve(&table, &mut modifiers, 0, &mut draws).tier_index == 1
            })
            .count();
        #[allow(clippy::cast_precision_loss)]
        let freq = hits_b as f64 / f64::from(trials);
        assert!((freq - 0.10).abs() < 0.01, "observed {freq}");
    }

    #[test]
    fn multiplier_rounds_to_nearest() {
        assert_eq!(apply_multiplier(3, 1.5), 5);
        assert_eq!(apply_multiplier(0, 3.0), 0);
        assert_eq!(apply_multiplier(7, 1.0), 7);
        assert_eq!(apply_multiplier(u64::MAX, 3.0), u64::MAX);
    }
}
