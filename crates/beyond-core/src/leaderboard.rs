//! Leaderboard service interface.
//!
//! No leaderboard server exists yet; [`PendingLeaderboard`] answers with a
//! fixed notice until one is hooked up.

use std::fmt::Debug;

/// Text shown while no leaderboard server is available.
pub const PENDING_MESSAGE: &str = "Leaderboard integration pending server hookup.";

/// A source of leaderboard text for the presentation layer.
pub trait LeaderboardService: Send + Debug {
    /// Fetch the leaderboard as display text.
    fn fetch_leaderboard(&self) -> String;
}

/// The placeholder leaderboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingLeaderboard;

impl LeaderboardService for PendingLeaderboard {
    fn fetch_leaderboard(&self) -> String {
        PENDING_MESSAGE.to_owned()
    }
}
