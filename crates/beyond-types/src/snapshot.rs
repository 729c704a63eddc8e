//! Wire format of an exported save.
//!
//! The snapshot is a flat, versionless JSON object with camelCase keys.
//! Timestamps are absolute epoch milliseconds so that effect expiry keeps
//! its wall-clock meaning across export and import.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::structs::{RarestFind, Settings};

/// Persisted form of one active effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EffectRecord {
    /// Absolute expiry in epoch milliseconds; `None` for use-bounded effects.
    pub expires_at: Option<i64>,
    /// Remaining forced discoveries, for force-outcome effects only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub remaining_uses: Option<u32>,
}

/// The complete exported save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SnapshotDocument {
    /// Player name.
    pub username: Option<String>,
    /// Total discoveries.
    pub total_clicks: u64,
    /// Spendable points.
    pub points: u64,
    /// Epoch milliseconds when the player first started.
    pub start_time: i64,
    /// Epoch milliseconds until which the displayed timer is frozen (0 if not).
    pub time_frozen_until: i64,
    /// Most valuable tier found.
    pub rarest_find: Option<RarestFind>,
    /// Discoveries per tier name.
    pub finds: BTreeMap<String, u64>,
    /// Tier names seen at least once.
    pub unlocked_rarities: Vec<String>,
    /// Unlocked achievement ids.
    pub achievements_unlocked: Vec<String>,
    /// Owned auto-clicker levels.
    pub auto_clickers: u32,
    /// Current background name.
    pub background: String,
    /// Active effects by effect id.
    pub active_effects: BTreeMap<String, EffectRecord>,
    /// Player preferences.
    pub settings: Settings,
}
