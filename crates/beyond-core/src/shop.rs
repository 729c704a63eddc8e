//! The shop: item catalog, pricing, and purchase validation.
//!
//! A purchase is all-or-nothing. Validation runs in a fixed order (stack cap
//! first, then affordability) and a rejected purchase leaves both progress
//! and modifiers untouched.

use beyond_types::{EffectId, ProgressState, ShopItemId, StackKind};
use tracing::info;

use crate::config::AutoClickerConfig;
use crate::modifiers::{Activation, ModifierError, ModifierSet};
use crate::tracker::{ProgressTracker, TrackerError};

/// Errors produced by a purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseError {
    /// The player cannot afford the item.
    #[error("insufficient points: {item} costs {cost}, have {available}")]
    InsufficientPoints {
        /// Item requested.
        item: ShopItemId,
        /// Its current price.
        cost: u64,
        /// Points held.
        available: u64,
    },

    /// The stacking upgrade is already at its cap.
    #[error("max {item} reached ({cap})")]
    MaxStackReached {
        /// Item requested.
        item: ShopItemId,
        /// The cap.
        cap: u32,
    },

    /// No item with that id exists.
    #[error("unknown shop item: {name}")]
    UnknownItem {
        /// The id as given.
        name: String,
    },
}

impl From<ModifierError> for PurchaseError {
    fn from(err: ModifierError) -> Self {
        match err {
            ModifierError::MaxStackReached { cap, .. } => Self::MaxStackReached {
                item: ShopItemId::AutoClicker,
                cap,
            },
            ModifierError::UnknownStack { .. } => Self::MaxStackReached {
                item: ShopItemId::AutoClicker,
                cap: 0,
            },
        }
    }
}

/// Static description of a shop item.
#[derive(Debug, Clone, Copy)]
pub struct ShopItem {
    /// Item id.
    pub id: ShopItemId,
    /// Display name.
    pub name: &'static str,
    /// Player-facing description.
    pub description: &'static str,
    /// Fixed price, or `None` for the auto-clicker whose price doubles with
    /// every level owned.
    pub cost: Option<u64>,
}

/// Every item, in display order.
pub const CATALOG: &[ShopItem] = &[
    ShopItem {
        id: ShopItemId::AutoClicker,
        name: "Auto-Clicker",
        description: "Automatically clicks every 2s. Stacks up to 10, doubling speed each time.",
        cost: None,
    },
    ShopItem {
        id: ShopItemId::DoublePoints,
        name: "Double Points",
        description: "Doubles all points for 30 seconds.",
        cost: Some(200),
    },
    ShopItem {
        id: ShopItemId::TriplePoints,
        name: "Triple Points",
        description: "Triples all points for 30 seconds.",
        cost: Some(500),
    },
    ShopItem {
        id: ShopItemId::GoldenHour,
        name: "Golden Hour",
        description: "Guarantees Epic+ for 10 seconds.",
        cost: Some(2000),
    },
    ShopItem {
        id: ShopItemId::LuckBoost,
        name: "Luck Boost",
        description: "Removes Very Common for 60 seconds.",
        cost: Some(250),
    },
    ShopItem {
        id: ShopItemId::LuckyDay,
        name: "Lucky Day",
        description: "Removes Very Common for 24 hours.",
        cost: Some(5000),
    },
    ShopItem {
        id: ShopItemId::TimeFreeze,
        name: "Time Freeze",
        description: "Freezes the timer for 30 seconds.",
        cost: Some(100),
    },
    ShopItem {
        id: ShopItemId::LuckyClick,
        name: "Lucky Click",
        description: "Guarantees Legendary+ on next click.",
        cost: Some(500),
    },
];

/// One row of the shop as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopListing {
    /// Item id.
    pub id: ShopItemId,
    /// Display name.
    pub name: &'static str,
    /// Player-facing description.
    pub description: &'static str,
    /// Current price.
    pub price: u64,
    /// Whether the player holds enough points.
    pub affordable: bool,
    /// Levels owned, for stacking upgrades.
    pub owned: Option<u32>,
    /// Whether a stacking upgrade is at its cap.
    pub maxed: bool,
    /// Whether the item's effect is currently running.
    pub active: bool,
}

/// What a successful purchase changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseEffect {
    /// A stacking upgrade gained a level.
    Upgraded {
        /// The counter raised.
        kind: StackKind,
        /// Its new level.
        count: u32,
    },
    /// A timed effect was started or refreshed.
    Activated {
        /// The effect.
        effect: EffectId,
        /// Whether it was already running.
        activation: Activation,
    },
}

/// A completed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purchase {
    /// Item bought.
    pub item: ShopItemId,
    /// Points spent.
    pub cost: u64,
    /// Points left afterwards.
    pub remaining_points: u64,
    /// What changed.
    pub effect: PurchaseEffect,
}

/// Prices and sells shop items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shop {
    auto_clicker: AutoClickerConfig,
}

impl Shop {
    /// A shop pricing the auto-clicker from `auto_clicker`.
    pub const fn new(auto_clicker: AutoClickerConfig) -> Self {
        Self { auto_clicker }
    }

    /// Resolve a player-typed item id.
    pub fn parse_item(name: &str) -> Result<ShopItemId, PurchaseError> {
        ShopItemId::from_key(name.trim()).ok_or_else(|| PurchaseError::UnknownItem {
            name: name.trim().to_owned(),
        })
    }

    /// Catalog entry of `item`.
    pub fn item(item: ShopItemId) -> Option<&'static ShopItem> {
        CATALOG.iter().find(|entry| entry.id == item)
    }

    /// Current price of `item`. The auto-clicker costs
    /// `base_cost * 2^owned`, saturating at `u64::MAX`.
    pub fn price(&self, item: ShopItemId, modifiers: &ModifierSet) -> u64 {
        match Self::item(item).and_then(|entry| entry.cost) {
            Some(cost) => cost,
            None => {
                let owned = modifiers.stack_count(StackKind::AutoClicker);
                2_u64
                    .checked_pow(owned)
                    .and_then(|factor| self.auto_clicker.base_cost.checked_mul(factor))
                    .unwrap_or(u64::MAX)
            }
        }
    }

    /// The full listing with prices and affordability at `now`.
    pub fn listing(
        &self,
        state: &ProgressState,
        modifiers: &ModifierSet,
        now: i64,
    ) -> Vec<ShopListing> {
        CATALOG
            .iter()
            .map(|entry| {
                let price = self.price(entry.id, modifiers);
                let (owned, maxed, active) = match entry.id.effect() {
                    Some(effect) => (None, false, modifiers.is_active(effect, now)),
                    None => {
                        let count = modifiers.stack_count(StackKind::AutoClicker);
                        (Some(count), count >= self.auto_clicker.max_stack, count > 0)
                    }
                };
                ShopListing {
                    id: entry.id,
                    name: entry.name,
                    description: entry.description,
                    price,
                    affordable: state.total_points >= price,
                    owned,
                    maxed,
                    active,
                }
            })
            .collect()
    }

    /// Buy `item` at `now`.
    ///
    /// # Errors
    ///
    /// [`PurchaseError::MaxStackReached`] when the auto-clicker is capped
    /// (checked first), [`PurchaseError::InsufficientPoints`] when the
    /// player cannot pay. Both leave every piece of state untouched.
    pub fn purchase(
        &self,
        item: ShopItemId,
        state: &mut ProgressState,
        modifiers: &mut ModifierSet,
        now: i64,
    ) -> Result<Purchase, PurchaseError> {
        let cost = self.price(item, modifiers);

        if item.effect().is_none() {
            let owned = modifiers.stack_count(StackKind::AutoClicker);
            let cap = modifiers
                .stack(StackKind::AutoClicker)
                .map_or(self.auto_clicker.max_stack, |counter| counter.cap());
            if owned >= cap {
                return Err(PurchaseError::MaxStackReached { item, cap });
            }
        }
        if state.total_points < cost {
            return Err(PurchaseError::InsufficientPoints {
                item,
                cost,
                available: state.total_points,
            });
        }

        let effect = match item.effect() {
            Some(effect) => PurchaseEffect::Activated {
                effect,
                activation: modifiers.activate_catalog(effect, now),
            },
            None => {
                if modifiers.stack(StackKind::AutoClicker).is_none() {
                    modifiers.register_stack(
                        StackKind::AutoClicker,
                        self.auto_clicker.max_stack,
                        self.auto_clicker.base_interval_ms,
                    );
                }
                let count = modifiers.tick_stack(StackKind::AutoClicker)?;
                state
                    .owned_upgrades
                    .insert(StackKind::AutoClicker.as_str().to_owned(), count);
                PurchaseEffect::Upgraded {
                    kind: StackKind::AutoClicker,
                    count,
                }
            }
        };

        let remaining_points = ProgressTracker::spend(state, cost).map_err(|e| {
            let TrackerError::InsufficientPoints { cost, available } = e;
            PurchaseError::InsufficientPoints {
                item,
                cost,
                available,
            }
        })?;

        info!(item = %item, cost, remaining_points, "purchase completed");
        Ok(Purchase {
            item,
            cost,
            remaining_points,
            effect,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shop() -> Shop {
        Shop::new(AutoClickerConfig::default())
    }

    fn rich_player(points: u64) -> ProgressState {
        let mut state = ProgressState::new(0);
        state.total_points = points;
        state
    }

    #[test]
    fn auto_clicker_price_doubles_per_level() {
        let shop = shop();
        let mut state = rich_player(10_000);
        let mut modifiers = ModifierSet::with_auto_clicker(10, 2_000);

        let mut prices = Vec::new();
        for _ in 0..4 {
            let purchase = shop
                .purchase(ShopItemId::AutoClicker, &mut state, &mut modifiers, 0)
                .unwrap();
            prices.push(purchase.cost);
        }
        assert_eq!(prices, vec![50, 100, 200, 400]);
        assert_eq!(state.total_points, 10_000 - 750);
        assert_eq!(state.upgrade_count("autoClicker"), 4);
        assert_eq!(modifiers.stack_count(StackKind::AutoClicker), 4);
    }

    #[test]
    fn insufficient_points_changes_nothing() {
        let shop = shop();
        let mut state = rich_player(199);
        let mut modifiers = ModifierSet::with_auto_clicker(10, 2_000);
        let before = (state.clone(), modifiers.clone());

        let result = shop.purchase(ShopItemId::DoublePoints, &mut state, &mut modifiers, 0);
        assert_eq!(
            result,
            Err(PurchaseError::InsufficientPoints {
                item: ShopItemId::DoublePoints,
                cost: 200,
                available: 199
            })
        );
        assert_eq!((state, modifiers), before);
    }

    #[test]
    fn rejected_upgrade_does_not_register_its_stack() {
        let shop = shop();
        let mut state = rich_player(49);
        let mut modifiers = ModifierSet::default();

        let result = shop.purchase(ShopItemId::AutoClicker, &mut state, &mut modifiers, 0);
        assert!(matches!(result, Err(PurchaseError::InsufficientPoints { cost: 50, .. })));
        assert!(modifiers.stack(StackKind::AutoClicker).is_none());
        assert_eq!(modifiers, ModifierSet::default());

        state.total_points = 50;
        let purchase = shop
            .purchase(ShopItemId::AutoClicker, &mut state, &mut modifiers, 0)
            .unwrap();
        assert_eq!(purchase.cost, 50);
        assert_eq!(modifiers.stack_count(StackKind::AutoClicker), 1);
        assert_eq!(modifiers.stack(StackKind::AutoClicker).unwrap().cap(), 10);
    }

    #[test]
    fn cap_is_checked_before_points() {
        let shop = shop();
        let mut state = rich_player(0);
        let mut modifiers = ModifierSet::with_auto_clicker(10, 2_000);
        modifiers.restore_stack(StackKind::AutoClicker, 10);

        let result = shop.purchase(ShopItemId::AutoClicker, &mut state, &mut modifiers, 0);
        assert_eq!(
            result,
            Err(PurchaseError::MaxStackReached {
                item: ShopItemId::AutoClicker,
                cap: 10
            })
        );
    }

    #[test]
    fn effect_purchase_activates_catalog_modifier() {
        let shop = shop();
        let mut state = rich_player(1_000);
        let mut modifiers = ModifierSet::default();

        let purchase = shop
            .purchase(ShopItemId::TimeFreeze, &mut state, &mut modifiers, 5_000)
            .unwrap();
        assert_eq!(purchase.remaining_points, 900);
        assert_eq!(
            purchase.effect,
            PurchaseEffect::Activated {
                effect: EffectId::TimeFreeze,
                activation: Activation::Started
            }
        );
        assert_eq!(modifiers.frozen_until(5_000), 35_000);
    }

    #[test]
    fn listing_reports_affordability() {
        let shop = shop();
        let state = rich_player(250);
        let modifiers = ModifierSet::with_auto_clicker(10, 2_000);
        let listing = shop.listing(&state, &modifiers, 0);

        assert_eq!(listing.len(), CATALOG.len());
        let affordable = listing
            .iter()
            .filter(|row| row.affordable)
            .map(|row| row.id)
            .collect::<Vec<_>>();
        assert_eq!(
            affordable,
            vec![
                ShopItemId::AutoClicker,
                ShopItemId::DoublePoints,
                ShopItemId::LuckBoost,
                ShopItemId::TimeFreeze
            ]
        );
        assert_eq!(listing[0].owned, Some(0));
    }

    #[test]
    fn unknown_item_is_rejected() {
        assert_eq!(
            Shop::parse_item(" megaBoost "),
            Err(PurchaseError::UnknownItem {
                name: "megaBoost".to_owned()
            })
        );
        assert_eq!(Shop::parse_item("luckyday"), Ok(ShopItemId::LuckyDay));
    }
}
