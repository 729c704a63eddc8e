//! Callback interface for the presentation layer.
//!
//! The session calls every registered [`SessionObserver`] after each state
//! change it wants shown: outcomes, unlocks, notices, and timer refreshes.
//! All methods default to doing nothing so observers implement only what
//! they render.

use std::fmt;

use beyond_types::{AchievementUnlock, DiscoveryOrigin, ResolvedOutcome};

use crate::shop::PurchaseError;

/// Everything one discovery produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Manual or auto-triggered.
    pub origin: DiscoveryOrigin,
    /// The resolved outcome.
    pub outcome: ResolvedOutcome,
    /// Achievements this discovery unlocked.
    pub unlocks: Vec<AchievementUnlock>,
    /// Discoveries after folding.
    pub total_discoveries: u64,
    /// Points after folding.
    pub total_points: u64,
}

/// A user-facing message that is not an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A purchase was refused; nothing changed.
    PurchaseRejected(PurchaseError),
    /// An import was refused; nothing changed.
    ImportFailed {
        /// Why the snapshot was rejected.
        reason: String,
    },
    /// A snapshot replaced the current progress.
    Imported,
    /// Progress was reset.
    Reset,
    /// The player name changed.
    UsernameChanged(String),
    /// Music was switched on or off.
    MusicToggled(bool),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PurchaseRejected(PurchaseError::MaxStackReached { .. }) => {
                f.write_str("Max Auto-Clickers reached!")
            }
            Self::PurchaseRejected(err) => write!(f, "Purchase rejected: {err}"),
            Self::ImportFailed { reason } => write!(f, "Failed to load save: {reason}"),
            Self::Imported => f.write_str("Save loaded."),
            Self::Reset => f.write_str("Progress reset."),
            Self::UsernameChanged(name) => write!(f, "Username set to {name}."),
            Self::MusicToggled(on) => {
                write!(f, "Music {}.", if *on { "on" } else { "off" })
            }
        }
    }
}

/// Receives session events for display.
pub trait SessionObserver: Send {
    /// A discovery was resolved and folded.
    fn on_outcome(&mut self, _report: &DiscoveryReport) {}

    /// An achievement unlocked.
    fn on_achievement(&mut self, _unlock: &AchievementUnlock) {}

    /// Something the player should be told.
    fn on_notice(&mut self, _notice: &Notice) {}

    /// The displayed elapsed time was refreshed.
    fn on_timer(&mut self, _elapsed_ms: i64) {}
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl SessionObserver for NoOpObserver {}
