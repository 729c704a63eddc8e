//! Reward engine, modifiers, progress tracking, and persistence for Beyond
//! Epic.
//!
//! A discovery flows through the crate leaves-first: the [`RarityTable`]
//! and [`ModifierSet`] shape a draw, the [`RewardEngine`] resolves it, the
//! [`ProgressTracker`] folds it into progress, and the [`PersistenceCodec`]
//! snapshots the result. [`Session`] owns all of it for one player and
//! [`GameRuntime`] drives it from tokio tasks.
//!
//! # Modules
//!
//! - [`achievements`] -- Static achievement registry and streak thresholds.
//! - [`clock`] -- [`Clock`] trait, system and manual clocks, and the
//!   freezable displayed timer.
//! - [`codec`] -- Snapshot encoding and lenient decoding.
//! - [`config`] -- Configuration loading from `beyond-epic.yaml`.
//! - [`draws`] -- [`DrawSource`] trait with seeded and scripted sources.
//! - [`effects`] -- The catalog of purchasable effects.
//! - [`engine`] -- Discovery resolution.
//! - [`leaderboard`] -- Leaderboard service trait and placeholder.
//! - [`modifiers`] -- Timed effects and stacking counters.
//! - [`observer`] -- Presentation-layer callbacks.
//! - [`runtime`] -- Shared session, auto-trigger, and display ticker.
//! - [`session`] -- The per-player aggregate and its operations.
//! - [`shop`] -- Item catalog, pricing, and purchases.
//! - [`table`] -- The weighted rarity table.
//! - [`tracker`] -- Folding outcomes into progress.
//!
//! [`RarityTable`]: table::RarityTable
//! [`ModifierSet`]: modifiers::ModifierSet
//! [`RewardEngine`]: engine::RewardEngine
//! [`ProgressTracker`]: tracker::ProgressTracker
//! [`PersistenceCodec`]: codec::PersistenceCodec
//! [`Session`]: session::Session
//! [`GameRuntime`]: runtime::GameRuntime
//! [`Clock`]: clock::Clock
//! [`DrawSource`]: draws::DrawSource

pub mod achievements;
pub mod clock;
pub mod codec;
pub mod config;
pub mod draws;
pub mod effects;
pub mod engine;
pub mod leaderboard;
pub mod modifiers;
pub mod observer;
pub mod runtime;
pub mod session;
pub mod shop;
pub mod table;
pub mod tracker;
