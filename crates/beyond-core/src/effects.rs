//! The effect catalog: what each purchasable effect does and how long it lasts.
//!
//! Snapshots only persist an effect's id and expiry; the modifier payload is
//! rebuilt from this catalog on import.

use beyond_types::{EffectId, ModifierEffect, TierFilter};

/// Base points of the "Epic" tier; Epic-or-better means at least this many.
pub const EPIC_MIN_POINTS: u64 = 12;

/// Base points of the "Legendary" tier; Legendary-or-better means at least
/// this many.
pub const LEGENDARY_MIN_POINTS: u64 = 40;

/// Name of the most common tier, removed by the luck effects.
pub const VERY_COMMON: &str = "Very Common";

const SECOND_MS: u64 = 1_000;
const DAY_MS: u64 = 24 * 60 * 60 * SECOND_MS;

/// The modifier and duration an effect id stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDefinition {
    /// The effect id.
    pub effect: EffectId,
    /// What the effect does while active.
    pub modifier: ModifierEffect,
    /// Lifetime after activation; `None` for effects that end when consumed.
    pub duration_ms: Option<u64>,
}

/// Look up the catalog entry for `effect`.
pub fn definition(effect: EffectId) -> EffectDefinition {
    let (modifier, duration_ms) = match effect {
        EffectId::DoublePoints => (
            ModifierEffect::PointsMultiplier { factor: 2.0 },
            Some(30 * SECOND_MS),
        ),
        EffectId::TriplePoints => (
            ModifierEffect::PointsMultiplier { factor: 3.0 },
            Some(30 * SECOND_MS),
        ),
        EffectId::GoldenHour => (
            ModifierEffect::Reweight {
                filter: TierFilter::Not(Box::new(TierFilter::MinPoints(EPIC_MIN_POINTS))),
                multiplier: 0.0,
            },
            Some(10 * SECOND_MS),
        ),
        EffectId::LuckBoost => (very_common_removed(), Some(60 * SECOND_MS)),
        EffectId::LuckyDay => (very_common_removed(), Some(DAY_MS)),
        EffectId::TimeFreeze => (ModifierEffect::FreezeClock, Some(30 * SECOND_MS)),
        EffectId::LuckyClick => (
            ModifierEffect::ForceOutcome {
                filter: TierFilter::MinPoints(LEGENDARY_MIN_POINTS),
                remaining_uses: 1,
            },
            None,
        ),
    };
    EffectDefinition {
        effect,
        modifier,
        duration_ms,
    }
}

fn very_common_removed() -> ModifierEffect {
    ModifierEffect::Reweight {
        filter: TierFilter::Named(VERY_COMMON.to_owned()),
        multiplier: 0.0,
    }
}
