//! The rarity table: an ordered, weighted catalog of tiers.
//!
//! Table order is significant. It defines the cumulative order of the
//! weighted draw (and therefore which tier a boundary draw lands on), the
//! `tier_index` recorded for the rarest find, and the fallback tier used when
//! reweighting empties the pool.
//!
//! # Invariants
//!
//! - At least one tier.
//! - Tier names are unique.
//! - Every base weight is finite and strictly positive, so the base sum is
//!   positive.

use std::collections::BTreeMap;

use beyond_types::{RarityTier, TierFilter};

use crate::modifiers::ModifierSet;

/// Errors produced by table construction and pool resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// Every tier was reweighted to zero; the caller must use the fallback tier.
    #[error("weighted pool is empty after applying modifiers")]
    EmptyWeightPool,

    /// The table definition violates an invariant.
    #[error("invalid rarity table: {reason}")]
    InvalidTable {
        /// Explanation of what is wrong with the table.
        reason: String,
    },
}

/// One drawable entry of a resolved pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolEntry<'a> {
    /// Position of the tier in the table.
    pub index: usize,
    /// The tier itself.
    pub tier: &'a RarityTier,
    /// Base weight after every active reweight; always positive.
    pub effective_weight: f64,
}

/// An immutable, validated rarity table.
#[derive(Debug, Clone, PartialEq)]
pub struct RarityTable {
    tiers: Vec<RarityTier>,
    index_by_name: BTreeMap<String, usize>,
    total_weight: f64,
    fallback: RarityTier,
}

impl RarityTable {
    /// Build a table from tiers in draw order.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidTable`] if the table is empty, a name is
    /// repeated, or a weight is not finite and positive.
    pub fn new(tiers: Vec<RarityTier>) -> Result<Self, TableError> {
        let fallback = tiers.first().cloned().ok_or_else(|| TableError::InvalidTable {
            reason: "at least one tier is required".to_owned(),
        })?;

        let mut seen = BTreeMap::new();
        for (index, tier) in tiers.iter().enumerate() {
            if !tier.weight.is_finite() || tier.weight <= 0.0 {
                return Err(TableError::InvalidTable {
                    reason: format!("tier {} has non-positive weight {}", tier.name, tier.weight),
                });
            }
            if seen.insert(tier.name.as_str(), index).is_some() {
                return Err(TableError::InvalidTable {
                    reason: format!("duplicate tier name: {}", tier.name),
                });
            }
        }

        Ok(Self::assemble(tiers, fallback))
    }

    /// The standard 30-tier table. Weights read as percentage chances and
    /// sum to about 92.4; draws scale by the actual sum.
    pub fn standard() -> Self {
        let tiers = STANDARD_TIERS
            .iter()
            .map(|&(name, weight, points)| RarityTier::new(name, weight, points))
            .collect::<Vec<_>>();
        let (name, weight, points) = STANDARD_TIERS[0];
        Self::assemble(tiers, RarityTier::new(name, weight, points))
    }

    /// Index an already-validated tier list. Every base weight is positive,
    /// so the fallback is always the first tier.
    fn assemble(tiers: Vec<RarityTier>, fallback: RarityTier) -> Self {
        let index_by_name = tiers
            .iter()
            .enumerate()
            .map(|(index, tier)| (tier.name.clone(), index))
            .collect();
        let total_weight: f64 = tiers.iter().map(|tier| tier.weight).sum();
        Self {
            tiers,
            index_by_name,
            total_weight,
            fallback,
        }
    }

    /// All tiers in table order.
    pub fn tiers(&self) -> &[RarityTier] {
        &self.tiers
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always `false` for a constructed table; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Tier at `index`.
    pub fn get(&self, index: usize) -> Option<&RarityTier> {
        self.tiers.get(index)
    }

    /// Table position of the tier called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Sum of base weights.
    pub const fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Unmodified chance of drawing the tier at `index`, in percent.
    pub fn chance_percent(&self, index: usize) -> Option<f64> {
        self.tiers
            .get(index)
            .map(|tier| tier.weight / self.total_weight * 100.0)
    }

    /// The tier used when the modified pool is empty: the lowest-index tier
    /// with positive base weight.
    pub const fn fallback_tier(&self) -> (usize, &RarityTier) {
        (0, &self.fallback)
    }

    /// Tiers matching `filter`, with their table positions, regardless of
    /// weight. These are the candidates of a forced outcome.
    pub fn tiers_matching<'a>(
        &'a self,
        filter: &'a TierFilter,
    ) -> impl Iterator<Item = (usize, &'a RarityTier)> + 'a {
        self.tiers
            .iter()
            .enumerate()
            .filter(move |(_, tier)| filter.matches(tier))
    }

    /// The drawable pool at `now`: every tier's base weight multiplied by
    /// each active reweight that matches it, keeping only positive results.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::EmptyWeightPool`] if no tier keeps a positive
    /// weight.
    pub fn resolve_weighted_pool(
        &self,
        modifiers: &ModifierSet,
        now: i64,
    ) -> Result<Vec<PoolEntry<'_>>, TableError> {
        let reweights = modifiers.reweights(now).collect::<Vec<_>>();

        let pool = self
            .tiers
            .iter()
            .enumerate()
            .filter_map(|(index, tier)| {
                let effective_weight = reweights
                    .iter()
                    .filter(|(filter, _)| filter.matches(tier))
                    .fold(tier.weight, |weight, (_, multiplier)| weight * multiplier);
                (effective_weight.is_finite() && effective_weight > 0.0).then_some(PoolEntry {
                    index,
                    tier,
                    effective_weight,
                })
            })
            .collect::<Vec<_>>();

        if pool.is_empty() {
            return Err(TableError::EmptyWeightPool);
        }
        Ok(pool)
    }
}

impl Default for RarityTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// `(name, weight, points)` of the original game's tiers, in draw order.
const STANDARD_TIERS: [(&str, f64, u64); 30] = [
    // Very Common band
    ("Very Common", 36.0, 0),
    ("Common", 24.0, 0),
    ("Uncommon", 12.0, 1),
    ("Rare", 6.0, 2),
    ("Extra Rare", 4.0, 4),
    ("Super Rare", 3.0, 6),
    ("Ultra Rare", 2.0, 8),
    // Epic band
    ("Epic", 1.2, 12),
    ("Extra Epic", 0.9, 20),
    ("Ultra Epic", 0.7, 30),
    ("Beyond Epic", 0.5, 50),
    // Legendary / Mythic band
    ("Legendary", 0.45, 40),
    ("Ultra Legendary", 0.35, 60),
    ("Mythic", 0.28, 80),
    ("Ultra Mythic", 0.22, 100),
    ("Mystical", 0.18, 150),
    ("Magical", 0.14, 200),
    // Insane / Extreme band
    ("Insane", 0.12, 300),
    ("Ultra Insane", 0.10, 400),
    ("Extreme", 0.08, 600),
    ("Mega Extreme", 0.06, 800),
    // Specialty band
    ("Quantum", 0.045, 1000),
    ("Chroma", 0.035, 1500),
    ("Sigma", 0.025, 2000),
    // Endgame band
    ("BEYOND Epic", 0.015, 3500),
    ("Ascendant", 0.010, 5000),
    ("Transcendent", 0.008, 6200),
    ("Ethereal", 0.006, 7500),
    ("Celestial", 0.004, 8800),
    ("BEYOND", 0.0005, 10000),
];
