//! The achievement registry.
//!
//! Each achievement is a static `{id, name, predicate}` entry. The
//! [`ProgressTracker`](crate::tracker::ProgressTracker) evaluates the whole
//! registry after every fold and unlocks locked entries whose predicate holds.

use beyond_types::{ProgressState, StackKind};

use crate::effects::{EPIC_MIN_POINTS, VERY_COMMON};

/// Consecutive outcomes needed for the streak achievements.
pub const STREAK_LENGTH: u32 = 5;

/// Static description of a single achievement.
#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    /// Stable id stored in `achievements_unlocked`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Unlock condition over the player's progress.
    pub predicate: fn(&ProgressState) -> bool,
}

/// Every achievement, in evaluation order.
pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "firstClick",
        name: "First Click",
        predicate: |s| s.total_discoveries >= 1,
    },
    Achievement {
        id: "oneMillion",
        name: "One in a Million",
        predicate: |s| s.total_discoveries >= 1_000_000,
    },
    Achievement {
        id: "beyondPerfect",
        name: "Beyond Perfect",
        predicate: |s| s.unlocked_tiers.len() >= 57 && s.achievements_unlocked.len() >= 59,
    },
    Achievement {
        id: "perfectCompletion",
        name: "Perfect Completion",
        predicate: |s| {
            s.unlocked_tiers.len() >= 50 && s.upgrade_count(StackKind::AutoClicker.as_str()) == 0
        },
    },
    Achievement {
        id: "unlucky",
        name: "Unlucky",
        predicate: |s| {
            s.streak.tier.as_deref() == Some(VERY_COMMON) && s.streak.same_tier >= STREAK_LENGTH
        },
    },
    Achievement {
        id: "lucky",
        name: "Lucky!",
        predicate: |s| s.streak.high_value >= STREAK_LENGTH,
    },
];

/// Look up an achievement by id.
pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Whether an outcome worth `base_points` extends the high-value streak.
pub const fn is_high_value(base_points: u64) -> bool {
    base_points >= EPIC_MIN_POINTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        for (i, a) in ACHIEVEMENTS.iter().enumerate() {
            assert!(
                ACHIEVEMENTS.iter().skip(i + 1).all(|b| b.id != a.id),
                "duplicate id {}",
                a.id
            );
        }
    }

    #[test]
    fn first_click_needs_one_discovery() {
        let mut state = ProgressState::new(0);
        let first = find("firstClick").map(|a| a.predicate);
        assert_eq!(first.map(|p| p(&state)), Some(false));
        state.total_discoveries = 1;
        assert_eq!(first.map(|p| p(&state)), Some(true));
    }

    #[test]
    fn perfect_completion_requires_no_auto_clickers() {
        let mut state = ProgressState::new(0);
        state.unlocked_tiers = (0..50).map(|i| format!("tier{i}")).collect();
        let perfect = find("perfectCompletion").map(|a| a.predicate);
        assert_eq!(perfect.map(|p| p(&state)), Some(true));

        state.owned_upgrades.insert("autoClicker".to_owned(), 1);
        assert_eq!(perfect.map(|p| p(&state)), Some(false));
    }

    #[test]
    fn unlucky_tracks_very_common_runs() {
        let mut state = ProgressState::new(0);
        state.streak.tier = Some("Very Common".to_owned());
        state.streak.same_tier = 4;
        let unlucky = find("unlucky").map(|a| a.predicate);
        assert_eq!(unlucky.map(|p| p(&state)), Some(false));
        state.streak.same_tier = 5;
        assert_eq!(unlucky.map(|p| p(&state)), Some(true));

        state.streak.tier = Some("Common".to_owned());
        assert_eq!(unlucky.map(|p| p(&state)), Some(false));
    }

    #[test]
    fn epic_threshold_is_twelve_points() {
        assert!(!is_high_value(8));
        assert!(is_high_value(12));
    }
}
