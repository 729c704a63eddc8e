//! Shared type definitions for the Beyond Epic reward engine.
//!
//! This crate is the single source of truth for the data that flows
//! between the engine, the persistence layer, and the presentation layer.
//! Wire types are exported to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`enums`] -- Effect, upgrade, and shop item identifiers, outcome provenance
//! - [`structs`] -- Tiers, modifiers, progress state, outcomes
//! - [`snapshot`] -- The exported save document

pub mod enums;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{DiscoveryOrigin, EffectId, Selection, ShopItemId, StackKind};
pub use snapshot::{EffectRecord, SnapshotDocument};
pub use structs::{
    AchievementUnlock, ActiveModifier, DEFAULT_BACKGROUND, ModifierEffect, ProgressState,
    RarestFind, RarityTier, ResolvedOutcome, Settings, Streak, TierFilter,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the presentation layer.

    #[test]
    fn export_bindings() {
        // Files are written to the `bindings/` directory relative to the
        // crate root.
        use ts_rs::TS;

        let _ = crate::enums::EffectId::export_all();
        let _ = crate::enums::StackKind::export_all();
        let _ = crate::enums::ShopItemId::export_all();
        let _ = crate::enums::Selection::export_all();
        let _ = crate::enums::DiscoveryOrigin::export_all();

        let _ = crate::structs::RarityTier::export_all();
        let _ = crate::structs::RarestFind::export_all();
        let _ = crate::structs::Settings::export_all();
        let _ = crate::structs::ResolvedOutcome::export_all();
        let _ = crate::structs::AchievementUnlock::export_all();

        let _ = crate::snapshot::EffectRecord::export_all();
        let _ = crate::snapshot::SnapshotDocument::export_all();
    }
}
