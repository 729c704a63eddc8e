//! Snapshot encoding and lenient decoding.
//!
//! Encoding writes a [`SnapshotDocument`] as JSON. Decoding is deliberately
//! forgiving: the text must parse to a JSON object, but every field inside
//! it is read on its own and falls back to its zero value when absent or
//! malformed. Unknown fields and unknown effect ids are ignored.

use std::collections::{BTreeMap, BTreeSet};

use beyond_types::{
    ActiveModifier, DEFAULT_BACKGROUND, EffectId, EffectRecord, ModifierEffect, ProgressState,
    RarestFind, Settings, SnapshotDocument, StackKind,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::AutoClickerConfig;
use crate::effects;
use crate::modifiers::ModifierSet;

/// Errors produced by the codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not a JSON object.
    #[error("malformed snapshot: {reason}")]
    MalformedSnapshot {
        /// What was wrong with the input.
        reason: String,
    },

    /// Serializing the snapshot failed.
    #[error("failed to encode snapshot: {source}")]
    Encode {
        /// The underlying serializer error.
        #[from]
        source: serde_json::Error,
    },
}

/// Identity values used when a snapshot omits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Current player name.
    pub username: Option<String>,
    /// Current start time, epoch milliseconds.
    pub start_time: i64,
}

impl Identity {
    /// The identity fields of `state`.
    pub fn of(state: &ProgressState) -> Self {
        Self {
            username: state.username.clone(),
            start_time: state.start_time,
        }
    }
}

/// Converts progress and modifiers to and from snapshot text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceCodec {
    auto_clicker: AutoClickerConfig,
}

impl PersistenceCodec {
    /// A codec restoring the auto-clicker counter with `auto_clicker`'s cap
    /// and interval.
    pub const fn new(auto_clicker: AutoClickerConfig) -> Self {
        Self { auto_clicker }
    }

    /// Build the snapshot document at `now`. Only effects live at `now` are
    /// written.
    pub fn snapshot(state: &ProgressState, modifiers: &ModifierSet, now: i64) -> SnapshotDocument {
        let active_effects = modifiers
            .effects()
            .filter(|(id, _)| modifiers.is_active(*id, now))
            .map(|(id, modifier)| {
                let remaining_uses = match modifier.effect {
                    ModifierEffect::ForceOutcome { remaining_uses, .. } => Some(remaining_uses),
                    _ => None,
                };
                (
                    id.as_str().to_owned(),
                    EffectRecord {
                        expires_at: modifier.expires_at,
                        remaining_uses,
                    },
                )
            })
            .collect();

        SnapshotDocument {
            username: state.username.clone(),
            total_clicks: state.total_discoveries,
            points: state.total_points,
            start_time: state.start_time,
            time_frozen_until: modifiers.frozen_until(now),
            rarest_find: state.rarest_find.clone(),
            finds: state.finds_by_tier.clone(),
            unlocked_rarities: state.unlocked_tiers.iter().cloned().collect(),
            achievements_unlocked: state.achievements_unlocked.iter().cloned().collect(),
            auto_clickers: modifiers.stack_count(StackKind::AutoClicker),
            background: state.background.clone(),
            active_effects,
            settings: state.settings.clone(),
        }
    }

    /// Encode progress and modifiers as pretty-printed JSON.
    pub fn encode(
        state: &ProgressState,
        modifiers: &ModifierSet,
        now: i64,
    ) -> Result<String, CodecError> {
        let document = Self::snapshot(state, modifiers, now);
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Decode snapshot text.
    ///
    /// `fallback` supplies the username and start time when the snapshot
    /// omits them. Streak counters always start empty.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedSnapshot`] if `text` is not a JSON
    /// object.
    pub fn decode(
        &self,
        text: &str,
        fallback: &Identity,
    ) -> Result<(ProgressState, ModifierSet), CodecError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CodecError::MalformedSnapshot {
                reason: e.to_string(),
            })?;
        let Value::Object(doc) = value else {
            return Err(CodecError::MalformedSnapshot {
                reason: "snapshot is not a JSON object".to_owned(),
            });
        };

        let mut state = ProgressState::new(field(&doc, "startTime").unwrap_or(fallback.start_time));
        state.username = field::<String>(&doc, "username").or_else(|| fallback.username.clone());
        state.total_discoveries = field(&doc, "totalClicks").unwrap_or(0);
        state.total_points = field(&doc, "points").unwrap_or(0);
        state.rarest_find = field::<RarestFind>(&doc, "rarestFind");
        state.finds_by_tier = counts(doc.get("finds"));
        state.unlocked_tiers = names(doc.get("unlockedRarities"));
        state.achievements_unlocked = names(doc.get("achievementsUnlocked"));
        state.background =
            field(&doc, "background").unwrap_or_else(|| DEFAULT_BACKGROUND.to_owned());
        state.settings = Settings {
            music_on: doc
                .get("settings")
                .and_then(|settings| settings.get("musicOn"))
                .and_then(Value::as_bool)
                .unwrap_or(true),
        };

        let mut modifiers = ModifierSet::with_auto_clicker(
            self.auto_clicker.max_stack,
            self.auto_clicker.base_interval_ms,
        );
        let auto_clickers = modifiers.restore_stack(
            StackKind::AutoClicker,
            field(&doc, "autoClickers").unwrap_or(0),
        );
        if auto_clickers > 0 {
            state
                .owned_upgrades
                .insert(StackKind::AutoClicker.as_str().to_owned(), auto_clickers);
        }

        if let Some(Value::Object(entries)) = doc.get("activeEffects") {
            for (key, record) in entries {
                let Some(effect) = EffectId::from_key(key) else {
                    debug!(effect = %key, "ignoring unknown effect in snapshot");
                    continue;
                };
                if let Some(modifier) = restore_effect(effect, record) {
                    modifiers.restore_effect(effect, modifier);
                }
            }
        }

        let frozen_until: i64 = field(&doc, "timeFrozenUntil").unwrap_or(0);
        if frozen_until > 0 && modifiers.get(EffectId::TimeFreeze).is_none() {
            modifiers.restore_effect(EffectId::TimeFreeze, ActiveModifier {
                effect: ModifierEffect::FreezeClock,
                expires_at: Some(frozen_until),
            });
        }

        Ok((state, modifiers))
    }
}

/// `doc[key]` as `T`, or `None` when absent, null, or the wrong shape.
fn field<T: DeserializeOwned>(doc: &Map<String, Value>, key: &str) -> Option<T> {
    doc.get(key)
        .filter(|value| !value.is_null())
        .and_then(|value| <T as serde::Deserialize>::deserialize(value).ok())
}

/// A name-to-count mapping, keeping only non-negative integer entries.
fn counts(value: Option<&Value>) -> BTreeMap<String, u64> {
    value
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(name, count)| count.as_u64().map(|c| (name.clone(), c)))
                .collect()
        })
        .unwrap_or_default()
}

/// A set of names, keeping only string entries.
fn names(value: Option<&Value>) -> BTreeSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Rebuild one effect from the catalog and its persisted record. Timed
/// effects without an expiry are dropped.
fn restore_effect(effect: EffectId, record: &Value) -> Option<ActiveModifier> {
    let definition = effects::definition(effect);
    let expires_at = record.get("expiresAt").and_then(Value::as_i64);
    if definition.duration_ms.is_some() && expires_at.is_none() {
        debug!(effect = %effect, "dropping timed effect without expiry");
        return None;
    }

    let persisted_uses = record
        .get("remainingUses")
        .and_then(Value::as_u64)
        .and_then(|uses| u32::try_from(uses).ok());
    let modifier = match (definition.modifier, persisted_uses) {
        (ModifierEffect::ForceOutcome { filter, .. }, Some(remaining_uses)) => {
            ModifierEffect::ForceOutcome {
                filter,
                remaining_uses,
            }
        }
        (modifier, _) => modifier,
    };

    Some(ActiveModifier {
        effect: modifier,
        expires_at,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use beyond_types::{ResolvedOutcome, Selection};

    use super::*;
    use crate::tracker::ProgressTracker;

    fn codec() -> PersistenceCodec {
        PersistenceCodec::new(AutoClickerConfig::default())
    }

    fn fallback() -> Identity {
        Identity {
            username: Some("Fallback".to_owned()),
            start_time: 42,
        }
    }

    fn played_state() -> (ProgressState, ModifierSet) {
        let mut state = ProgressState::new(1_000);
        state.username = Some("Ada".to_owned());
        for (name, index, points) in [("Rare", 3, 2), ("Legendary", 11, 40), ("Rare", 3, 2)] {
            ProgressTracker::fold(
                &mut state,
                &ResolvedOutcome {
                    tier_name: name.to_owned(),
                    tier_index: index,
                    base_points: points,
                    points_awarded: points,
                    selection: Selection::Weighted,
                },
                2_000,
            );
        }
        state.background = "Midnight".to_owned();
        state.settings.music_on = false;
        state.owned_upgrades.insert("autoClicker".to_owned(), 3);

        let mut modifiers = ModifierSet::with_auto_clicker(10, 2_000);
        modifiers.restore_stack(StackKind::AutoClicker, 3);
        modifiers.activate_catalog(EffectId::DoublePoints, 5_000);
        modifiers.activate_catalog(EffectId::TimeFreeze, 5_000);
        modifiers.activate_catalog(EffectId::LuckyClick, 5_000);
        (state, modifiers)
    }

    #[test]
    fn round_trip_is_lossless() {
        let (state, modifiers) = played_state();
        let text = PersistenceCodec::encode(&state, &modifiers, 6_000).unwrap();
        let (restored, restored_modifiers) = codec().decode(&text, &fallback()).unwrap();

        let expected = ProgressState {
            streak: beyond_types::Streak::default(),
            ..state
        };
        assert_eq!(restored, expected);
        assert_eq!(restored_modifiers, modifiers);
    }

    #[test]
    fn snapshot_uses_wire_field_names() {
        let (state, modifiers) = played_state();
        let text = PersistenceCodec::encode(&state, &modifiers, 6_000).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["totalClicks"], 3);
        assert_eq!(value["points"], 44);
        assert_eq!(value["timeFrozenUntil"], 35_000);
        assert_eq!(value["autoClickers"], 3);
        assert_eq!(value["rarestFind"]["tierIndex"], 11);
        assert_eq!(value["activeEffects"]["doublePoints"]["expiresAt"], 35_000);
        assert_eq!(value["activeEffects"]["luckyClick"]["remainingUses"], 1);
        assert_eq!(value["settings"]["musicOn"], false);
    }

    #[test]
    fn partial_snapshot_fills_defaults() {
        let (state, modifiers) = codec()
            .decode(r#"{"totalClicks":5,"points":10}"#, &fallback())
            .unwrap();
        assert_eq!(state.total_discoveries, 5);
        assert_eq!(state.total_points, 10);
        assert!(state.finds_by_tier.is_empty());
        assert!(state.unlocked_tiers.is_empty());
        assert!(state.settings.music_on);
        assert_eq!(state.background, "White");
        assert_eq!(state.start_time, 42);
        assert_eq!(modifiers.stack_count(StackKind::AutoClicker), 0);
    }

    #[test]
    fn empty_snapshot_equals_fresh_state_with_identity() {
        let (state, _) = codec().decode("{}", &fallback()).unwrap();
        let mut fresh = ProgressState::new(42);
        fresh.username = Some("Fallback".to_owned());
        assert_eq!(state, fresh);
    }

    #[test]
    fn non_object_input_is_malformed() {
        for text in ["not json", "[1,2,3]", "42", "\"hi\"", ""] {
            assert!(
                matches!(
                    codec().decode(text, &fallback()),
                    Err(CodecError::MalformedSnapshot { .. })
                ),
                "{text:?} accepted"
            );
        }
    }

    #[test]
    fn malformed_fields_default_individually() {
        let text = r#"{
            "totalClicks": "many",
            "points": -5,
            "finds": {"Rare": 2, "Epic": "lots"},
            "unlockedRarities": ["Rare", 7],
            "settings": "loud",
            "autoClickers": 99,
            "activeEffects": {"megaPoints": {"expiresAt": 1}, "luckBoost": {"expiresAt": 9000}},
            "futureField": true
        }"#;
        let (state, modifiers) = codec().decode(text, &fallback()).unwrap();
        assert_eq!(state.total_discoveries, 0);
        assert_eq!(state.total_points, 0);
        assert_eq!(state.finds_by_tier.len(), 1);
        assert_eq!(state.unlocked_tiers.len(), 1);
        assert!(state.settings.music_on);
        assert_eq!(modifiers.stack_count(StackKind::AutoClicker), 10);
        assert_eq!(state.upgrade_count("autoClicker"), 10);
        assert!(modifiers.is_active(EffectId::LuckBoost, 8_999));
        assert_eq!(modifiers.effects().count(), 1);
    }

    #[test]
    fn time_frozen_until_alone_restores_freeze() {
        let (_, modifiers) = codec()
            .decode(r#"{"timeFrozenUntil": 50000}"#, &fallback())
            .unwrap();
        assert_eq!(modifiers.frozen_until(10_000), 50_000);
    }
}
