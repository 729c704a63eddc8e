//! Folding outcomes into player progress.
//!
//! [`ProgressTracker`] is the only writer of [`ProgressState`] apart from
//! an explicit reset. Folding never fails; spending fails without touching
//! state when the player cannot afford the cost.

use beyond_types::{AchievementUnlock, ProgressState, RarestFind, ResolvedOutcome};
use tracing::info;

use crate::achievements::{self, ACHIEVEMENTS};

/// Errors produced when spending points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// The player holds fewer points than the cost.
    #[error("insufficient points: need {cost}, have {available}")]
    InsufficientPoints {
        /// Points required.
        cost: u64,
        /// Points held.
        available: u64,
    },
}

/// Aggregates outcomes and evaluates achievements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressTracker;

impl ProgressTracker {
    /// Fold one resolved outcome into `state` and return the achievements it
    /// unlocked.
    pub fn fold(
        state: &mut ProgressState,
        outcome: &ResolvedOutcome,
        now: i64,
    ) -> Vec<AchievementUnlock> {
        state.total_discoveries = state.total_discoveries.saturating_add(1);
        state.total_points = state.total_points.saturating_add(outcome.points_awarded);

        let finds = state
            .finds_by_tier
            .entry(outcome.tier_name.clone())
            .or_insert(0);
        *finds = finds.saturating_add(1);
        state.unlocked_tiers.insert(outcome.tier_name.clone());

        // Strictly greater: ties keep the first occurrence.
        let is_rarer = state
            .rarest_find
            .as_ref()
            .is_none_or(|rarest| outcome.base_points > rarest.points);
        if is_rarer {
            state.rarest_find = Some(RarestFind {
                name: outcome.tier_name.clone(),
                tier_index: outcome.tier_index,
                points: outcome.base_points,
            });
        }

        let streak = &mut state.streak;
        if streak.tier.as_deref() == Some(outcome.tier_name.as_str()) {
            streak.same_tier = streak.same_tier.saturating_add(1);
        } else {
            streak.tier = Some(outcome.tier_name.clone());
            streak.same_tier = 1;
        }
        streak.high_value = if achievements::is_high_value(outcome.base_points) {
            streak.high_value.saturating_add(1)
        } else {
            0
        };

        Self::evaluate(state, now)
    }

    /// Deduct `cost` points and return the remaining balance.
    pub fn spend(state: &mut ProgressState, cost: u64) -> Result<u64, TrackerError> {
        let remaining = state
            .total_points
            .checked_sub(cost)
            .ok_or(TrackerError::InsufficientPoints {
                cost,
                available: state.total_points,
            })?;
        state.total_points = remaining;
        Ok(remaining)
    }

    /// Unlock every locked achievement whose predicate holds.
    ///
    /// Idempotent: already-unlocked achievements are skipped.
    pub fn evaluate(state: &mut ProgressState, now: i64) -> Vec<AchievementUnlock> {
        let mut unlocked = Vec::new();
        for achievement in ACHIEVEMENTS {
            if state.achievements_unlocked.contains(achievement.id) {
                continue;
            }
            if (achievement.predicate)(state) {
                state.achievements_unlocked.insert(achievement.id.to_owned());
                info!(id = achievement.id, name = achievement.name, "achievement unlocked");
                unlocked.push(AchievementUnlock {
                    id: achievement.id.to_owned(),
                    name: achievement.name.to_owned(),
                    unlocked_at: now,
                });
            }
        }
        unlocked
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use beyond_types::Selection;

    use super::*;

    fn outcome(name: &str, index: usize, points: u64) -> ResolvedOutcome {
        ResolvedOutcome {
            tier_name: name.to_owned(),
            tier_index: index,
            base_points: points,
            points_awarded: points,
            selection: Selection::Weighted,
        }
    }

    #[test]
    fn fold_updates_counts_and_unlocks_first_click() {
        let mut state = ProgressState::new(0);
        let unlocks = ProgressTracker::fold(&mut state, &outcome("Rare", 3, 2), 500);

        assert_eq!(state.total_discoveries, 1);
        assert_eq!(state.total_points, 2);
        assert_eq!(state.finds_by_tier.get("Rare"), Some(&1));
        assert!(state.unlocked_tiers.contains("Rare"));
        assert_eq!(unlocks.len(), 1);
        assert_eq!(unlocks[0].id, "firstClick");
        assert_eq!(unlocks[0].unlocked_at, 500);

        // Idempotent afterwards.
        let again = ProgressTracker::fold(&mut state, &outcome("Rare", 3, 2), 600);
        assert!(again.is_empty());
        assert_eq!(state.finds_by_tier.get("Rare"), Some(&2));
    }

    #[test]
    fn rarest_find_never_regresses_and_keeps_first_tie() {
        let mut state = ProgressState::new(0);
        ProgressTracker::fold(&mut state, &outcome("Epic", 7, 12), 0);
        ProgressTracker::fold(&mut state, &outcome("Rare", 3, 2), 0);
        assert_eq!(state.rarest_find.as_ref().unwrap().name, "Epic");

        ProgressTracker::fold(&mut state, &outcome("Other Epic", 8, 12), 0);
        assert_eq!(state.rarest_find.as_ref().unwrap().name, "Epic");

        ProgressTracker::fold(&mut state, &outcome("Legendary", 11, 40), 0);
        let rarest = state.rarest_find.unwrap();
        assert_eq!(rarest.name, "Legendary");
        assert_eq!(rarest.tier_index, 11);
    }

    #[test]
    fn five_very_common_in_a_row_unlocks_unlucky() {
        let mut state = ProgressState::new(0);
        let mut unlocked = Vec::new();
        for _ in 0..5 {
            unlocked.extend(ProgressTracker::fold(&mut state, &outcome("Very Common", 0, 0), 0));
        }
        assert!(unlocked.iter().any(|u| u.id == "unlucky"));

        // A different tier breaks the run.
        ProgressTracker::fold(&mut state, &outcome("Common", 1, 0), 0);
        assert_eq!(state.streak.same_tier, 1);
    }

    #[test]
    fn five_epic_plus_in_a_row_unlocks_lucky() {
        let mut state = ProgressState::new(0);
        for name in ["Epic", "Extra Epic", "Legendary", "Mythic"] {
            ProgressTracker::fold(&mut state, &outcome(name, 0, 40), 0);
        }
        ProgressTracker::fold(&mut state, &outcome("Rare", 3, 2), 0);
        assert!(!state.achievements_unlocked.contains("lucky"));

        let mut unlocked = Vec::new();
        for _ in 0..5 {
            unlocked.extend(ProgressTracker::fold(&mut state, &outcome("Epic", 7, 12), 0));
        }
        assert!(unlocked.iter().any(|u| u.id == "lucky"));
    }

    #[test]
    fn spend_rejects_without_mutation() {
        let mut state = ProgressState::new(0);
        state.total_points = 40;
        assert_eq!(
            ProgressTracker::spend(&mut state, 50),
            Err(TrackerError::InsufficientPoints {
                cost: 50,
                available: 40
            })
        );
        assert_eq!(state.total_points, 40);
        assert_eq!(ProgressTracker::spend(&mut state, 40), Ok(0));
    }

    #[test]
    fn evaluate_catches_up_after_restore() {
        let mut state = ProgressState::new(0);
        state.total_discoveries = 1_000_000;
        let unlocks = ProgressTracker::evaluate(&mut state, 9);
        let ids = unlocks.iter().map(|u| u.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["firstClick", "oneMillion"]);
        assert!(ProgressTracker::evaluate(&mut state, 10).is_empty());
    }
}
