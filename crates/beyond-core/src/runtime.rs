//! The async runtime layer: shared session, auto-trigger, display ticker.
//!
//! [`GameRuntime`] keeps the [`Session`] behind one [`tokio::sync::Mutex`],
//! so discoveries, purchases, imports, exports, and resets never overlap.
//! Auto-trigger cycles take the same lock for a whole resolve and fold.
//!
//! # Rescheduling
//!
//! Any operation that can change the auto-clicker level (purchase, import,
//! reset) reschedules the trigger. The running task is told to stop and
//! awaited before its replacement is spawned, so two triggers are never
//! alive at once. The stop signal is only observed between ticks: a cycle
//! whose tick has fired always finishes its resolve and fold, even when it
//! is still waiting for the session lock. A new trigger first fires one
//! full period after it is scheduled.

use std::sync::Arc;
use std::time::Duration;

use beyond_types::{AchievementUnlock, ShopItemId};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::TimerConfig;
use crate::observer::DiscoveryReport;
use crate::session::{Session, SessionError};
use crate::shop::{Purchase, PurchaseEffect};

/// A background loop and the signal that ends it.
#[derive(Debug)]
struct Task {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

impl Task {
    fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop, stopped) = watch::channel(false);
        Self {
            handle: tokio::spawn(body(stopped)),
            stop,
        }
    }

    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the loop and wait until its current cycle, if any, is done.
    async fn stop(self) {
        // A send error means the loop already exited.
        let _ = self.stop.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "background task failed");
        }
    }
}

/// Owns the session and its background tasks.
#[derive(Debug)]
pub struct GameRuntime {
    session: Arc<Mutex<Session>>,
    trigger: Mutex<Option<Task>>,
    ticker: Mutex<Option<Task>>,
    display_refresh: Duration,
}

impl GameRuntime {
    /// Wrap `session`; nothing runs until [`start`](Self::start).
    pub fn new(session: Session, timer: TimerConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            trigger: Mutex::new(None),
            ticker: Mutex::new(None),
            display_refresh: Duration::from_millis(timer.display_refresh_ms.max(1)),
        }
    }

    /// A handle to the shared session.
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// Start the display ticker and schedule the auto-trigger for the
    /// current auto-clicker level.
    pub async fn start(&self) {
        let mut ticker = self.ticker.lock().await;
        if let Some(old) = ticker.take() {
            old.stop().await;
        }
        let session = Arc::clone(&self.session);
        let period = self.display_refresh;
        *ticker = Some(Task::spawn(move |stopped| run_ticker(session, period, stopped)));
        drop(ticker);

        self.reschedule().await;
        info!(refresh_ms = self.display_refresh.as_millis(), "runtime started");
    }

    /// A manual discovery.
    pub async fn discover(&self) -> DiscoveryReport {
        self.session.lock().await.discover()
    }

    /// Buy `item`, rescheduling the trigger when the auto-clicker level
    /// changed.
    pub async fn purchase(&self, item: ShopItemId) -> Result<Purchase, SessionError> {
        let purchase = self.session.lock().await.purchase(item)?;
        if matches!(purchase.effect, PurchaseEffect::Upgraded { .. }) {
            self.reschedule().await;
        }
        Ok(purchase)
    }

    /// Buy the item with the player-typed id `name`.
    pub async fn purchase_named(&self, name: &str) -> Result<Purchase, SessionError> {
        let purchase = self.session.lock().await.purchase_named(name)?;
        if matches!(purchase.effect, PurchaseEffect::Upgraded { .. }) {
            self.reschedule().await;
        }
        Ok(purchase)
    }

    /// Encode the session.
    pub async fn export(&self) -> Result<String, SessionError> {
        self.session.lock().await.export()
    }

    /// Replace the session's progress with a snapshot and reschedule.
    pub async fn import(&self, text: &str) -> Result<Vec<AchievementUnlock>, SessionError> {
        let unlocks = self.session.lock().await.import(text)?;
        self.reschedule().await;
        Ok(unlocks)
    }

    /// Reset progress and stop the auto-trigger.
    pub async fn reset(&self) {
        self.session.lock().await.reset();
        self.reschedule().await;
    }

    /// Whether an auto-trigger task is scheduled.
    pub async fn auto_trigger_active(&self) -> bool {
        self.trigger.lock().await.as_ref().is_some_and(Task::is_running)
    }

    /// Stop the trigger for the previous level and start one for the
    /// current level.
    ///
    /// Must not be called while holding the session lock: the old trigger
    /// may need it to finish a cycle that already fired.
    pub async fn reschedule(&self) {
        let mut slot = self.trigger.lock().await;
        if let Some(old) = slot.take() {
            old.stop().await;
        }

        let period = self.session.lock().await.auto_interval();
        match period {
            Some(period) => {
                debug!(period_ms = period.as_millis(), "auto-trigger scheduled");
                let session = Arc::clone(&self.session);
                *slot = Some(Task::spawn(move |stopped| run_trigger(session, period, stopped)));
            }
            None => debug!("auto-trigger idle"),
        }
    }

    /// Stop every background task.
    pub async fn shutdown(&self) {
        if let Some(task) = self.trigger.lock().await.take() {
            task.stop().await;
        }
        if let Some(task) = self.ticker.lock().await.take() {
            task.stop().await;
        }
        info!("runtime stopped");
    }
}

async fn run_trigger(
    session: Arc<Mutex<Session>>,
    period: Duration,
    mut stopped: watch::Receiver<bool>,
) {
    let first = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticks = time::interval_at(first, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = stopped.changed() => break,
            _ = ticks.tick() => {}
        }
        let report = session.lock().await.auto_discover();
        debug!(
            tier = %report.outcome.tier_name,
            points = report.outcome.points_awarded,
            "auto discovery"
        );
    }
}

async fn run_ticker(
    session: Arc<Mutex<Session>>,
    period: Duration,
    mut stopped: watch::Receiver<bool>,
) {
    let mut ticks = time::interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            biased;
            _ = stopped.changed() => break,
            _ = ticks.tick() => {}
        }
        session.lock().await.refresh_timer();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::GameConfig;
    use crate::draws::ScriptedDraws;
    use crate::table::RarityTable;

    async fn runtime_with_points(points: u64) -> GameRuntime {
        let config = GameConfig::default();
        let session = Session::new(
            &config,
            RarityTable::standard(),
            Box::new(ScriptedDraws::default()),
            Arc::new(ManualClock::new(0)),
        );
        let runtime = GameRuntime::new(session, config.timer);
        let text = format!(r#"{{"points":{points}}}"#);
        runtime.import(&text).await.unwrap();
        runtime
    }

    async fn discoveries(runtime: &GameRuntime) -> u64 {
        runtime.session().lock().await.state().total_discoveries
    }

    #[tokio::test(start_paused = true)]
    async fn no_trigger_without_auto_clickers() {
        let runtime = runtime_with_points(0).await;
        runtime.start().await;
        assert!(!runtime.auto_trigger_active().await);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(discoveries(&runtime).await, 0);
        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_fires_one_period_after_purchase() {
        let runtime = runtime_with_points(10_000).await;
        runtime.start().await;
        runtime.purchase(ShopItemId::AutoClicker).await.unwrap();
        assert!(runtime.auto_trigger_active().await);

        time::sleep(Duration::from_millis(1_999)).await;
        assert_eq!(discoveries(&runtime).await, 0);

        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(discoveries(&runtime).await, 1);

        time::sleep(Duration::from_millis(4_000)).await;
        assert_eq!(discoveries(&runtime).await, 3);
        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_replaces_the_old_timer() {
        let runtime = runtime_with_points(10_000).await;
        runtime.start().await;
        runtime.purchase(ShopItemId::AutoClicker).await.unwrap();
        runtime.purchase(ShopItemId::AutoClicker).await.unwrap();

        // Level 2 runs every second; a surviving level-1 timer would add
        // extra cycles at 2s and 4s.
        time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(discoveries(&runtime).await, 4);
        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_finishes_a_cycle_waiting_on_the_lock() {
        let runtime = runtime_with_points(10_000).await;
        runtime.start().await;
        runtime.purchase(ShopItemId::AutoClicker).await.unwrap();

        let session = runtime.session();
        let mut guard = session.lock().await;
        // The 2s tick fires while the lock is held and queues behind it.
        time::sleep(Duration::from_millis(2_050)).await;
        assert_eq!(guard.state().total_discoveries, 0);
        guard.purchase(ShopItemId::AutoClicker).unwrap();
        drop(guard);

        runtime.reschedule().await;
        assert_eq!(discoveries(&runtime).await, 1);

        // The level-2 trigger starts one second after the reschedule.
        time::sleep(Duration::from_millis(1_010)).await;
        assert_eq!(discoveries(&runtime).await, 2);
        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_every_task() {
        let runtime = runtime_with_points(10_000).await;
        runtime.start().await;
        runtime.purchase(ShopItemId::AutoClicker).await.unwrap();
        runtime.shutdown().await;
        assert!(!runtime.auto_trigger_active().await);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(discoveries(&runtime).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_the_trigger() {
        let runtime = runtime_with_points(10_000).await;
        runtime.start().await;
        runtime.purchase(ShopItemId::AutoClicker).await.unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(discoveries(&runtime).await, 1);

        runtime.reset().await;
        assert!(!runtime.auto_trigger_active().await);
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(discoveries(&runtime).await, 0);
        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn import_schedules_restored_auto_clickers() {
        let runtime = runtime_with_points(0).await;
        runtime.start().await;
        runtime.import(r#"{"autoClickers": 4}"#).await.unwrap();
        assert!(runtime.auto_trigger_active().await);

        time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(discoveries(&runtime).await, 4);
        runtime.shutdown().await;
    }
}
