//! Terminal front end for Beyond Epic.
//!
//! Wires configuration, the rarity table, a draw source, and the system
//! clock into a [`Session`], hands it to a [`GameRuntime`], and reads
//! commands from stdin until the player quits.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `beyond-epic.yaml` (defaults when absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the rarity table and the session
//! 4. Load the save file when one exists
//! 5. Start the auto-trigger and display ticker
//! 6. Run the command loop

mod command;
mod display;
mod error;
mod terminal;

use std::path::Path;
use std::sync::Arc;

use beyond_core::clock::SystemClock;
use beyond_core::config::GameConfig;
use beyond_core::draws::RngDraws;
use beyond_core::runtime::GameRuntime;
use beyond_core::session::Session;
use beyond_core::shop::PurchaseEffect;
use beyond_core::table::RarityTable;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, HELP};
use crate::error::GameError;
use crate::terminal::TerminalObserver;

const CONFIG_PATH: &str = "beyond-epic.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the terminal fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration; the log level lives in it.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        seed = ?config.game.seed,
        save_path = %config.game.save_path,
        auto_clicker_max = config.auto_clicker.max_stack,
        "beyond-game starting"
    );

    // 3. Build the table and session.
    let table = config
        .rarities
        .clone()
        .map(RarityTable::new)
        .transpose()
        .map_err(GameError::from)?
        .unwrap_or_else(RarityTable::standard);
    info!(tiers = table.len(), total_weight = table.total_weight(), "Rarity table ready");

    let mut session = Session::new(
        &config,
        table,
        Box::new(RngDraws::from_seed_option(config.game.seed)),
        Arc::new(SystemClock),
    );
    session.add_observer(Box::new(TerminalObserver));

    let runtime = GameRuntime::new(session, config.timer);

    // 4. Load an existing save.
    let save_path = Path::new(&config.game.save_path);
    if save_path.exists() {
        import_from(&runtime, save_path).await;
    }
    runtime
        .session()
        .lock()
        .await
        .ensure_username(&config.game.default_username);

    // 5. Background tasks.
    runtime.start().await;

    // 6. Command loop.
    println!("Welcome to Beyond Epic! Type `help` for commands.");
    let result = command_loop(&runtime, &config).await;

    runtime.shutdown().await;
    info!("beyond-game stopped");
    result.map_err(Into::into)
}

async fn command_loop(runtime: &GameRuntime, config: &GameConfig) -> Result<(), GameError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            return Ok(());
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Discover => {
                runtime.discover().await;
            }
            Command::Shop => {
                let listing = runtime.session().lock().await.open_shop();
                print!("{}", display::shop(&listing));
            }
            Command::Buy(name) => match runtime.purchase_named(&name).await {
                Ok(purchase) => {
                    let what = match purchase.effect {
                        PurchaseEffect::Upgraded { kind, count } => format!("{kind} level {count}"),
                        PurchaseEffect::Activated { effect, .. } => format!("{effect} active"),
                    };
                    println!(
                        "Bought {} for {} points: {what}. {} points left.",
                        purchase.item,
                        display::points(purchase.cost),
                        display::points(purchase.remaining_points)
                    );
                }
                // Already reported through the observer.
                Err(e) => debug!(error = %e, "purchase failed"),
            },
            Command::Stats => {
                let stats = runtime.session().lock().await.stats();
                print!("{}", display::stats(&stats));
            }
            Command::Leaderboard => {
                let text = runtime.session().lock().await.open_leaderboard();
                println!("{text}");
            }
            Command::Export(path) => {
                let path = path.unwrap_or_else(|| config.game.save_path.clone());
                let text = runtime.export().await?;
                match tokio::fs::write(&path, text).await {
                    Ok(()) => println!("Progress saved to {path}."),
                    Err(e) => {
                        warn!(path = %path, error = %e, "save failed");
                        println!("Could not save to {path}: {e}");
                    }
                }
            }
            Command::Import(path) => {
                let path = path.unwrap_or_else(|| config.game.save_path.clone());
                import_from(runtime, Path::new(&path)).await;
            }
            Command::Reset => runtime.reset().await,
            Command::Name(name) => {
                runtime.session().lock().await.set_username(&name);
            }
            Command::Music => {
                runtime.session().lock().await.toggle_music();
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(()),
            Command::Invalid(reason) => println!("{reason}. Type `help` for commands."),
        }
    }
}

/// Read a save file and load it. Failures are reported, never fatal.
async fn import_from(runtime: &GameRuntime, path: &Path) {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read save");
            println!("Could not read {}: {e}", path.display());
            return;
        }
    };
    if let Err(e) = runtime.import(&text).await {
        debug!(error = %e, "import failed");
    }
}

/// Load configuration from `beyond-epic.yaml`, or defaults (with
/// environment overrides) when the file does not exist.
fn load_config() -> Result<GameConfig, GameError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(GameConfig::from_file(config_path)?)
    } else {
        Ok(GameConfig::parse("")?)
    }
}
