//! The game session: one player's progress, modifiers, and collaborators.
//!
//! [`Session`] is the single owner of [`ProgressState`] and [`ModifierSet`].
//! Every operation reads the clock once, runs to completion, and then tells
//! the registered observers what changed. Nothing here blocks or does I/O;
//! the runtime serializes access behind one async mutex.

use std::sync::Arc;
use std::time::Duration;

use beyond_types::{
    AchievementUnlock, DiscoveryOrigin, EffectId, ModifierEffect, ProgressState, RarestFind,
    ShopItemId, StackKind,
};
use tracing::{debug, info, warn};

use crate::achievements::ACHIEVEMENTS;
use crate::clock::{Clock, SessionTimer};
use crate::codec::{CodecError, Identity, PersistenceCodec};
use crate::config::GameConfig;
use crate::draws::DrawSource;
use crate::engine::RewardEngine;
use crate::leaderboard::{LeaderboardService, PendingLeaderboard};
use crate::modifiers::ModifierSet;
use crate::observer::{DiscoveryReport, Notice, SessionObserver};
use crate::shop::{Purchase, PurchaseError, Shop, ShopListing};
use crate::table::RarityTable;
use crate::tracker::ProgressTracker;

/// Number of achievements the game advertises as the collection goal.
pub const ACHIEVEMENT_GOAL: usize = 60;

/// Errors surfaced by session operations. None of them change state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A purchase was rejected.
    #[error("purchase failed: {source}")]
    Purchase {
        /// The rejection reason.
        #[from]
        source: PurchaseError,
    },

    /// A snapshot could not be encoded or decoded.
    #[error("save failed: {source}")]
    Codec {
        /// The codec error.
        #[from]
        source: CodecError,
    },
}

/// Share of all finds that landed on one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct FindShare {
    /// Tier name.
    pub name: String,
    /// Times found.
    pub count: u64,
    /// `count / total finds`, in percent.
    pub percent: f64,
}

/// A running effect as shown in the stats panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectStatus {
    /// The effect.
    pub effect: EffectId,
    /// Milliseconds until expiry, for timed effects.
    pub remaining_ms: Option<i64>,
    /// Forced discoveries left, for force-outcome effects.
    pub remaining_uses: Option<u32>,
}

/// The "stats for nerds" panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// Player name.
    pub username: Option<String>,
    /// Discoveries so far.
    pub total_discoveries: u64,
    /// Spendable points.
    pub total_points: u64,
    /// Displayed elapsed time in milliseconds.
    pub elapsed_ms: i64,
    /// Most valuable tier found.
    pub rarest_find: Option<RarestFind>,
    /// Auto-clicker level.
    pub auto_clickers: u32,
    /// Current background.
    pub background: String,
    /// Achievements unlocked.
    pub achievements_unlocked: usize,
    /// Achievements advertised as the goal.
    pub achievement_goal: usize,
    /// Empirical find frequencies, in table order.
    pub find_shares: Vec<FindShare>,
    /// Effects running right now.
    pub active_effects: Vec<EffectStatus>,
}

/// One player's game.
pub struct Session {
    state: ProgressState,
    modifiers: ModifierSet,
    table: RarityTable,
    draws: Box<dyn DrawSource>,
    clock: Arc<dyn Clock>,
    timer: SessionTimer,
    shop: Shop,
    codec: PersistenceCodec,
    leaderboard: Box<dyn LeaderboardService>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("modifiers", &self.modifiers)
            .field("clock", &self.clock)
            .field("timer", &self.timer)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A fresh session starting now.
    pub fn new(
        config: &GameConfig,
        table: RarityTable,
        draws: Box<dyn DrawSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now_ms();
        let auto = config.auto_clicker;
        Self {
            state: ProgressState::new(now),
            modifiers: ModifierSet::with_auto_clicker(auto.max_stack, auto.base_interval_ms),
            table,
            draws,
            clock,
            timer: SessionTimer::new(now, now),
            shop: Shop::new(auto),
            codec: PersistenceCodec::new(auto),
            leaderboard: Box::new(PendingLeaderboard),
            observers: Vec::new(),
        }
    }

    /// Replace the leaderboard service.
    #[must_use]
    pub fn with_leaderboard(mut self, leaderboard: Box<dyn LeaderboardService>) -> Self {
        self.leaderboard = leaderboard;
        self
    }

    /// Register an observer.
    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Current progress.
    pub const fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Current modifiers.
    pub const fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    /// The rarity table.
    pub const fn table(&self) -> &RarityTable {
        &self.table
    }

    /// Period of the auto-trigger, or `None` with no auto-clickers.
    pub fn auto_interval(&self) -> Option<Duration> {
        self.modifiers.trigger_interval(StackKind::AutoClicker)
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    /// A manual discovery.
    pub fn discover(&mut self) -> DiscoveryReport {
        self.run_discovery(DiscoveryOrigin::Manual)
    }

    /// One auto-trigger cycle.
    pub fn auto_discover(&mut self) -> DiscoveryReport {
        self.run_discovery(DiscoveryOrigin::Auto)
    }

    fn run_discovery(&mut self, origin: DiscoveryOrigin) -> DiscoveryReport {
        let now = self.clock.now_ms();
        let outcome =
            RewardEngine::resolve(&self.table, &mut self.modifiers, now, self.draws.as_mut());
        let unlocks = ProgressTracker::fold(&mut self.state, &outcome, now);

        let report = DiscoveryReport {
            origin,
            outcome,
            unlocks,
            total_discoveries: self.state.total_discoveries,
            total_points: self.state.total_points,
        };
        debug!(
            ?origin,
            tier = %report.outcome.tier_name,
            points = report.outcome.points_awarded,
            "discovery folded"
        );

        for observer in &mut self.observers {
            observer.on_outcome(&report);
        }
        self.announce(&report.unlocks);
        report
    }

    // -----------------------------------------------------------------------
    // Shop and leaderboard
    // -----------------------------------------------------------------------

    /// The shop listing with prices and affordability.
    pub fn open_shop(&self) -> Vec<ShopListing> {
        self.shop
            .listing(&self.state, &self.modifiers, self.clock.now_ms())
    }

    /// Buy `item`. A rejection changes nothing and is also sent to observers
    /// as a notice.
    pub fn purchase(&mut self, item: ShopItemId) -> Result<Purchase, SessionError> {
        let now = self.clock.now_ms();
        match self
            .shop
            .purchase(item, &mut self.state, &mut self.modifiers, now)
        {
            Ok(purchase) => Ok(purchase),
            Err(err) => {
                debug!(item = %item, error = %err, "purchase rejected");
                self.notify(&Notice::PurchaseRejected(err.clone()));
                Err(err.into())
            }
        }
    }

    /// Buy the item with the player-typed id `name`.
    pub fn purchase_named(&mut self, name: &str) -> Result<Purchase, SessionError> {
        match Shop::parse_item(name) {
            Ok(item) => self.purchase(item),
            Err(err) => {
                self.notify(&Notice::PurchaseRejected(err.clone()));
                Err(err.into())
            }
        }
    }

    /// Leaderboard text from the configured service.
    pub fn open_leaderboard(&self) -> String {
        self.leaderboard.fetch_leaderboard()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Encode the session as snapshot text.
    pub fn export(&self) -> Result<String, SessionError> {
        let now = self.clock.now_ms();
        Ok(PersistenceCodec::encode(&self.state, &self.modifiers, now)?)
    }

    /// Replace progress and modifiers with a decoded snapshot.
    ///
    /// On failure the session is untouched and observers get an
    /// [`Notice::ImportFailed`]. On success achievements are re-evaluated
    /// and the unlocks returned.
    pub fn import(&mut self, text: &str) -> Result<Vec<AchievementUnlock>, SessionError> {
        let now = self.clock.now_ms();
        let (state, modifiers) = match self.codec.decode(text, &Identity::of(&self.state)) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(error = %err, "import rejected");
                self.notify(&Notice::ImportFailed {
                    reason: err.to_string(),
                });
                return Err(err.into());
            }
        };

        self.state = state;
        self.modifiers = modifiers;
        self.timer = SessionTimer::new(self.state.start_time, now);
        let unlocks = ProgressTracker::evaluate(&mut self.state, now);

        info!(
            discoveries = self.state.total_discoveries,
            points = self.state.total_points,
            auto_clickers = self.modifiers.stack_count(StackKind::AutoClicker),
            "save imported"
        );
        self.notify(&Notice::Imported);
        self.announce(&unlocks);
        Ok(unlocks)
    }

    /// Zero all progress and modifiers, keeping username and start time.
    pub fn reset(&mut self) {
        let now = self.clock.now_ms();
        self.state.reset();
        self.modifiers.clear();
        self.timer = SessionTimer::new(self.state.start_time, now);
        info!("progress reset");
        self.notify(&Notice::Reset);
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    /// Set the player name. Blank names are ignored; returns whether the
    /// name changed.
    pub fn set_username(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.state.username = Some(name.to_owned());
        self.notify(&Notice::UsernameChanged(name.to_owned()));
        true
    }

    /// Give a nameless player `default`.
    pub fn ensure_username(&mut self, default: &str) {
        if self.state.username.is_none() {
            self.state.username = Some(default.to_owned());
        }
    }

    /// Flip the music setting and return the new value.
    pub fn toggle_music(&mut self) -> bool {
        let on = !self.state.settings.music_on;
        self.state.settings.music_on = on;
        self.notify(&Notice::MusicToggled(on));
        on
    }

    // -----------------------------------------------------------------------
    // Timer and stats
    // -----------------------------------------------------------------------

    /// Displayed elapsed milliseconds (held while a time freeze runs).
    pub fn elapsed_display(&mut self) -> i64 {
        let now = self.clock.now_ms();
        let frozen_until = self.modifiers.frozen_until(now);
        self.timer.elapsed_ms(now, frozen_until)
    }

    /// Recompute the displayed time and push it to observers.
    pub fn refresh_timer(&mut self) -> i64 {
        let elapsed = self.elapsed_display();
        for observer in &mut self.observers {
            observer.on_timer(elapsed);
        }
        elapsed
    }

    /// The stats panel.
    pub fn stats(&mut self) -> SessionStats {
        let elapsed_ms = self.elapsed_display();
        let now = self.clock.now_ms();

        let total_finds: u64 = self.state.finds_by_tier.values().sum();
        let mut find_shares = self
            .state
            .finds_by_tier
            .iter()
            .map(|(name, &count)| {
                #[allow(clippy::cast_precision_loss)]
                let percent = if total_finds == 0 {
                    0.0
                } else {
                    count as f64 / total_finds as f64 * 100.0
                };
                FindShare {
                    name: name.clone(),
                    count,
                    percent,
                }
            })
            .collect::<Vec<_>>();
        find_shares.sort_by_key(|share| self.table.index_of(&share.name).unwrap_or(usize::MAX));

        let active_effects = self
            .modifiers
            .effects()
            .filter(|(id, _)| self.modifiers.is_active(*id, now))
            .map(|(effect, modifier)| EffectStatus {
                effect,
                remaining_ms: modifier.expires_at.map(|at| at.saturating_sub(now)),
                remaining_uses: match modifier.effect {
                    ModifierEffect::ForceOutcome { remaining_uses, .. } => Some(remaining_uses),
                    _ => None,
                },
            })
            .collect();

        SessionStats {
            username: self.state.username.clone(),
            total_discoveries: self.state.total_discoveries,
            total_points: self.state.total_points,
            elapsed_ms,
            rarest_find: self.state.rarest_find.clone(),
            auto_clickers: self.modifiers.stack_count(StackKind::AutoClicker),
            background: self.state.background.clone(),
            achievements_unlocked: self.state.achievements_unlocked.len(),
            achievement_goal: ACHIEVEMENT_GOAL.max(ACHIEVEMENTS.len()),
            find_shares,
            active_effects,
        }
    }

    fn notify(&mut self, notice: &Notice) {
        for observer in &mut self.observers {
            observer.on_notice(notice);
        }
    }

    fn announce(&mut self, unlocks: &[AchievementUnlock]) {
        for unlock in unlocks {
            for observer in &mut self.observers {
                observer.on_achievement(unlock);
            }
        }
    }
}
