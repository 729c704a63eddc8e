//! Core data structs for the Beyond Epic reward engine.
//!
//! Tiers and tier filters, modifier payloads, the player's progress
//! aggregate, and the values produced by a discovery.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Selection;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// A named rarity level with a draw weight and a point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RarityTier {
    /// Unique tier name (also the key in `finds`).
    pub name: String,
    /// Relative draw weight. Always finite and positive in a valid table.
    pub weight: f64,
    /// Base points awarded when this tier is discovered.
    pub points: u64,
}

impl RarityTier {
    /// Create a tier.
    pub fn new(name: impl Into<String>, weight: f64, points: u64) -> Self {
        Self {
            name: name.into(),
            weight,
            points,
        }
    }
}

/// A predicate over tiers, used by reweight and force-outcome modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "match", content = "value")]
pub enum TierFilter {
    /// The tier with exactly this name.
    Named(String),
    /// Every tier worth at least this many base points.
    MinPoints(u64),
    /// Every tier the inner filter does not match.
    Not(Box<TierFilter>),
}

impl TierFilter {
    /// Whether `tier` satisfies this filter.
    pub fn matches(&self, tier: &RarityTier) -> bool {
        match self {
            Self::Named(name) => tier.name == *name,
            Self::MinPoints(min) => tier.points >= *min,
            Self::Not(inner) => !inner.matches(tier),
        }
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// The effect a non-stacking modifier has on discoveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ModifierEffect {
    /// Multiply the base weight of matching tiers (0 removes them).
    Reweight {
        /// Tiers affected.
        filter: TierFilter,
        /// Weight multiplier applied to matching tiers.
        multiplier: f64,
    },
    /// Bypass the weighted draw for a limited number of discoveries.
    ForceOutcome {
        /// Tiers the forced pick chooses from, uniformly.
        filter: TierFilter,
        /// Discoveries still forced.
        remaining_uses: u32,
    },
    /// Freeze the displayed session timer until the modifier expires.
    FreezeClock,
    /// Multiply awarded points.
    PointsMultiplier {
        /// Multiplication factor.
        factor: f64,
    },
}

/// A modifier instance together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveModifier {
    /// What the modifier does.
    pub effect: ModifierEffect,
    /// Epoch milliseconds at which the modifier lapses, or `None` if it
    /// only ends when consumed.
    pub expires_at: Option<i64>,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// The most valuable tier discovered so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RarestFind {
    /// Tier name.
    pub name: String,
    /// Position of the tier in the rarity table.
    pub tier_index: usize,
    /// Base points of the tier.
    pub points: u64,
}

/// Player-facing preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Settings {
    /// Whether background music plays.
    pub music_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { music_on: true }
    }
}

/// Consecutive-outcome counters used by streak achievements.
///
/// Session-local: streaks are not part of the snapshot and restart after an
/// import or a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Streak {
    /// Tier of the current same-tier run.
    pub tier: Option<String>,
    /// Length of the current same-tier run.
    pub same_tier: u32,
    /// Length of the current run of high-value outcomes.
    pub high_value: u32,
}

/// Background shown for a fresh or reset player.
pub const DEFAULT_BACKGROUND: &str = "White";

/// The single mutable aggregate of player progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    /// Player name. Identity field: survives resets.
    pub username: Option<String>,
    /// Number of discoveries folded so far.
    pub total_discoveries: u64,
    /// Spendable points.
    pub total_points: u64,
    /// Discoveries per tier name.
    pub finds_by_tier: BTreeMap<String, u64>,
    /// Every tier name seen at least once.
    pub unlocked_tiers: BTreeSet<String>,
    /// Highest-points tier seen (first occurrence wins ties).
    pub rarest_find: Option<RarestFind>,
    /// Ids of unlocked achievements.
    pub achievements_unlocked: BTreeSet<String>,
    /// Epoch milliseconds when the player first started. Identity field.
    pub start_time: i64,
    /// Permanent upgrades owned, by upgrade id.
    pub owned_upgrades: BTreeMap<String, u32>,
    /// Current background name.
    pub background: String,
    /// Player preferences.
    pub settings: Settings,
    /// Session-local streak counters.
    pub streak: Streak,
}

impl ProgressState {
    /// A fresh player that started at `start_time`.
    pub fn new(start_time: i64) -> Self {
        Self {
            username: None,
            total_discoveries: 0,
            total_points: 0,
            finds_by_tier: BTreeMap::new(),
            unlocked_tiers: BTreeSet::new(),
            rarest_find: None,
            achievements_unlocked: BTreeSet::new(),
            start_time,
            owned_upgrades: BTreeMap::new(),
            background: DEFAULT_BACKGROUND.to_owned(),
            settings: Settings::default(),
            streak: Streak::default(),
        }
    }

    /// Zero all progress while keeping the identity fields (username and
    /// start time).
    pub fn reset(&mut self) {
        let username = self.username.take();
        *self = Self {
            username,
            ..Self::new(self.start_time)
        };
    }

    /// Owned count of a permanent upgrade (0 if never bought).
    pub fn upgrade_count(&self, id: &str) -> u32 {
        self.owned_upgrades.get(id).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Discovery results
// ---------------------------------------------------------------------------

/// The result of resolving one discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ResolvedOutcome {
    /// Name of the selected tier.
    pub tier_name: String,
    /// Position of the selected tier in the table.
    pub tier_index: usize,
    /// Base points of the selected tier.
    pub base_points: u64,
    /// Points after multipliers, rounded to the nearest integer.
    pub points_awarded: u64,
    /// How the tier was chosen.
    pub selection: Selection,
}

/// An achievement that transitioned from locked to unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AchievementUnlock {
    /// Stable achievement id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Epoch milliseconds of the unlock.
    pub unlocked_at: i64,
}
