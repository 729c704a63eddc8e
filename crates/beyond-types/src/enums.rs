//! Enumeration types for the Beyond Epic reward engine.
//!
//! Identifiers for timed effects, permanent stacking upgrades, and shop
//! items. The serialized form of every identifier is the camelCase id used
//! in snapshots (`doublePoints`, `autoClicker`, ...).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Timed effects
// ---------------------------------------------------------------------------

/// A time-bounded (or use-bounded) effect that can be active at most once.
///
/// Each id maps to exactly one modifier in the effect catalog. Activating
/// an id that is already active refreshes it rather than stacking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum EffectId {
    /// Doubles awarded points.
    DoublePoints,
    /// Triples awarded points.
    TriplePoints,
    /// Restricts the draw to Epic-or-better tiers.
    GoldenHour,
    /// Removes "Very Common" from the draw for a minute.
    LuckBoost,
    /// Removes "Very Common" from the draw for a day.
    LuckyDay,
    /// Freezes the displayed session timer.
    TimeFreeze,
    /// Forces a Legendary-or-better outcome on the next discovery.
    LuckyClick,
}

impl EffectId {
    /// Every effect id, in catalog order.
    pub const ALL: [Self; 7] = [
        Self::DoublePoints,
        Self::TriplePoints,
        Self::GoldenHour,
        Self::LuckBoost,
        Self::LuckyDay,
        Self::TimeFreeze,
        Self::LuckyClick,
    ];

    /// The snapshot key for this effect.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DoublePoints => "doublePoints",
            Self::TriplePoints => "triplePoints",
            Self::GoldenHour => "goldenHour",
            Self::LuckBoost => "luckBoost",
            Self::LuckyDay => "luckyDay",
            Self::TimeFreeze => "timeFreeze",
            Self::LuckyClick => "luckyClick",
        }
    }

    /// Look up an effect by its snapshot key. Returns `None` for unknown keys.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == key)
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stacking upgrades
// ---------------------------------------------------------------------------

/// A permanent, capped upgrade whose level scales a derived rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum StackKind {
    /// Discovers automatically; each level shortens the trigger interval.
    AutoClicker,
}

impl StackKind {
    /// The upgrade id used in `owned_upgrades` and snapshots.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoClicker => "autoClicker",
        }
    }
}

impl std::fmt::Display for StackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shop items
// ---------------------------------------------------------------------------

/// A purchasable shop item.
///
/// Items either activate a timed effect or raise a stacking upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum ShopItemId {
    /// Buys one auto-clicker level.
    AutoClicker,
    /// Buys [`EffectId::DoublePoints`].
    DoublePoints,
    /// Buys [`EffectId::TriplePoints`].
    TriplePoints,
    /// Buys [`EffectId::GoldenHour`].
    GoldenHour,
    /// Buys [`EffectId::LuckBoost`].
    LuckBoost,
    /// Buys [`EffectId::LuckyDay`].
    LuckyDay,
    /// Buys [`EffectId::TimeFreeze`].
    TimeFreeze,
    /// Buys [`EffectId::LuckyClick`].
    LuckyClick,
}

impl ShopItemId {
    /// Every shop item, in display order.
    pub const ALL: [Self; 8] = [
        Self::AutoClicker,
        Self::DoublePoints,
        Self::TriplePoints,
        Self::GoldenHour,
        Self::LuckBoost,
        Self::LuckyDay,
        Self::TimeFreeze,
        Self::LuckyClick,
    ];

    /// The item id as typed by players and stored in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoClicker => "autoClicker",
            Self::DoublePoints => "doublePoints",
            Self::TriplePoints => "triplePoints",
            Self::GoldenHour => "goldenHour",
            Self::LuckBoost => "luckBoost",
            Self::LuckyDay => "luckyDay",
            Self::TimeFreeze => "timeFreeze",
            Self::LuckyClick => "luckyClick",
        }
    }

    /// The timed effect this item activates, or `None` for stacking upgrades.
    pub const fn effect(self) -> Option<EffectId> {
        match self {
            Self::AutoClicker => None,
            Self::DoublePoints => Some(EffectId::DoublePoints),
            Self::TriplePoints => Some(EffectId::TriplePoints),
            Self::GoldenHour => Some(EffectId::GoldenHour),
            Self::LuckBoost => Some(EffectId::LuckBoost),
            Self::LuckyDay => Some(EffectId::LuckyDay),
            Self::TimeFreeze => Some(EffectId::TimeFreeze),
            Self::LuckyClick => Some(EffectId::LuckyClick),
        }
    }

    /// Look up an item by id, ignoring ASCII case.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|item| item.as_str().eq_ignore_ascii_case(key))
    }
}

impl std::fmt::Display for ShopItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome provenance
// ---------------------------------------------------------------------------

/// How the tier of a resolved outcome was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", tag = "kind", content = "effect")]
#[ts(export, export_to = "bindings/")]
pub enum Selection {
    /// Weighted draw over the (possibly reweighted) pool.
    Weighted,
    /// Uniform pick among the targets of a force-outcome effect.
    Forced(EffectId),
    /// The reweighted pool was empty; the table's fallback tier was used.
    Fallback,
}

/// What triggered a discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum DiscoveryOrigin {
    /// The player pressed discover.
    Manual,
    /// An auto-clicker cycle fired.
    Auto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_keys_match_serde_names() {
        for id in EffectId::ALL {
            let json = serde_json::to_string(&id).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
            assert_eq!(EffectId::from_key(id.as_str()), Some(id));
        }
    }

    #[test]
    fn unknown_effect_key_is_none() {
        assert_eq!(EffectId::from_key("megaPoints"), None);
    }

    #[test]
    fn shop_item_lookup_ignores_case() {
        assert_eq!(ShopItemId::from_key("AUTOCLICKER"), Some(ShopItemId::AutoClicker));
        assert_eq!(ShopItemId::from_key("luckyclick"), Some(ShopItemId::LuckyClick));
        assert_eq!(ShopItemId::from_key("nothing"), None);
    }

    #[test]
    fn selection_serializes_with_tag() {
        let json = serde_json::to_string(&Selection::Forced(EffectId::LuckyClick))
            .unwrap_or_default();
        assert_eq!(json, r#"{"kind":"forced","effect":"luckyClick"}"#);
    }
}
