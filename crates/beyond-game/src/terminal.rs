//! Prints session events to stdout.

use beyond_core::observer::{DiscoveryReport, Notice, SessionObserver};
use beyond_types::{AchievementUnlock, DiscoveryOrigin, Selection};

use crate::display;

/// A [`SessionObserver`] that writes one line per event.
#[derive(Debug, Default)]
pub struct TerminalObserver;

impl SessionObserver for TerminalObserver {
    fn on_outcome(&mut self, report: &DiscoveryReport) {
        println!("{}", outcome_line(report));
    }

    fn on_achievement(&mut self, unlock: &AchievementUnlock) {
        println!("*** Achievement Unlocked! {} ***", unlock.name);
    }

    fn on_notice(&mut self, notice: &Notice) {
        println!("{notice}");
    }
}

/// One line describing a discovery.
pub fn outcome_line(report: &DiscoveryReport) -> String {
    let outcome = &report.outcome;
    let prefix = match report.origin {
        DiscoveryOrigin::Manual => "",
        DiscoveryOrigin::Auto => "[auto] ",
    };
    let bonus = if outcome.points_awarded == outcome.base_points {
        String::new()
    } else {
        format!(" (base {})", display::points(outcome.base_points))
    };
    let tag = match outcome.selection {
        Selection::Weighted => String::new(),
        Selection::Forced(effect) => format!(" [{effect}]"),
        Selection::Fallback => " [fallback]".to_owned(),
    };
    format!(
        "{prefix}You discovered: {}! +{} points{bonus}{tag}  | total {}",
        outcome.tier_name,
        display::points(outcome.points_awarded),
        display::points(report.total_points),
    )
}
