//! Active modifiers and stacking counters.
//!
//! A [`ModifierSet`] holds at most one [`ActiveModifier`] per [`EffectId`]
//! plus one [`StackingCounter`] per registered [`StackKind`]. Timed entries
//! are considered active while `now < expires_at`; stacking counters never
//! expire.

use std::collections::BTreeMap;
use std::time::Duration;

use beyond_types::{ActiveModifier, EffectId, ModifierEffect, StackKind, TierFilter};
use tracing::debug;

use crate::effects;

/// Errors produced by stacking-counter operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModifierError {
    /// The counter is already at its cap.
    #[error("{kind} is already at its maximum of {cap}")]
    MaxStackReached {
        /// The capped counter.
        kind: StackKind,
        /// Its cap.
        cap: u32,
    },

    /// No counter was registered for this kind.
    #[error("no stacking counter registered for {kind}")]
    UnknownStack {
        /// The missing counter.
        kind: StackKind,
    },
}

/// Whether an activation started a new effect or refreshed a running one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The effect was not active before.
    Started,
    /// The effect was active; its expiry (and uses) were refreshed.
    Refreshed,
}

/// A permanent, capped upgrade level that scales a trigger rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackingCounter {
    count: u32,
    cap: u32,
    base_interval_ms: u64,
}

impl StackingCounter {
    /// An empty counter.
    pub const fn new(cap: u32, base_interval_ms: u64) -> Self {
        Self {
            count: 0,
            cap,
            base_interval_ms,
        }
    }

    /// Current level.
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Maximum level.
    pub const fn cap(&self) -> u32 {
        self.cap
    }

    /// `base_interval / count`, or `None` while the count is zero.
    pub fn interval(&self) -> Option<Duration> {
        self.base_interval_ms
            .checked_div(u64::from(self.count))
            .map(|ms| Duration::from_millis(ms.max(1)))
    }
}

/// Every modifier currently affecting a player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierSet {
    active: BTreeMap<EffectId, ActiveModifier>,
    stacks: BTreeMap<StackKind, StackingCounter>,
}

impl ModifierSet {
    /// A set with the auto-clicker counter registered.
    pub fn with_auto_clicker(cap: u32, base_interval_ms: u64) -> Self {
        Self::default().with_stack(StackKind::AutoClicker, cap, base_interval_ms)
    }

    /// Register a stacking counter (builder style). Re-registering a kind
    /// keeps its count, clamped to the new cap.
    #[must_use]
    pub fn with_stack(mut self, kind: StackKind, cap: u32, base_interval_ms: u64) -> Self {
        self.register_stack(kind, cap, base_interval_ms);
        self
    }

    /// Register (or re-register) a stacking counter in place.
    pub fn register_stack(&mut self, kind: StackKind, cap: u32, base_interval_ms: u64) {
        let count = self.stack_count(kind).min(cap);
        self.stacks.insert(
            kind,
            StackingCounter {
                count,
                cap,
                base_interval_ms,
            },
        );
    }

    // -----------------------------------------------------------------------
    // Timed and use-bounded effects
    // -----------------------------------------------------------------------

    /// Activate `effect` at `now`.
    ///
    /// A live effect keeps its magnitude; only its expiry moves to
    /// `now + duration_ms` (and a force outcome keeps the larger use count).
    /// An expired or absent effect is replaced outright.
    pub fn activate(
        &mut self,
        effect: EffectId,
        modifier: ModifierEffect,
        duration_ms: Option<u64>,
        now: i64,
    ) -> Activation {
        let expires_at =
            duration_ms.map(|ms| now.saturating_add(i64::try_from(ms).unwrap_or(i64::MAX)));

        let live = self
            .active
            .get(&effect)
            .filter(|existing| is_live(existing, now))
            .cloned();

        let Some(mut existing) = live else {
            self.active.insert(effect, ActiveModifier {
                effect: modifier,
                expires_at,
            });
            debug!(effect = %effect, ?expires_at, "effect started");
            return Activation::Started;
        };

        if let (
            ModifierEffect::ForceOutcome {
                remaining_uses: held,
                ..
            },
            ModifierEffect::ForceOutcome {
                remaining_uses: fresh,
                ..
            },
        ) = (&mut existing.effect, &modifier)
        {
            *held = (*held).max(*fresh);
        }
        existing.expires_at = expires_at;
        self.active.insert(effect, existing);
        debug!(effect = %effect, ?expires_at, "effect refreshed");
        Activation::Refreshed
    }

    /// Activate `effect` with its catalog modifier and duration.
    pub fn activate_catalog(&mut self, effect: EffectId, now: i64) -> Activation {
        let definition = effects::definition(effect);
        self.activate(effect, definition.modifier, definition.duration_ms, now)
    }

    /// Put back a persisted entry as-is, replacing any entry for `effect`.
    pub fn restore_effect(&mut self, effect: EffectId, modifier: ActiveModifier) {
        self.active.insert(effect, modifier);
    }

    /// Whether `effect` is in force at `now`.
    pub fn is_active(&self, effect: EffectId, now: i64) -> bool {
        self.active.get(&effect).is_some_and(|m| is_live(m, now))
    }

    /// The stored entry for `effect`, live or not.
    pub fn get(&self, effect: EffectId) -> Option<&ActiveModifier> {
        self.active.get(&effect)
    }

    /// Every stored effect entry, in effect-id order.
    pub fn effects(&self) -> impl Iterator<Item = (EffectId, &ActiveModifier)> {
        self.active.iter().map(|(id, modifier)| (*id, modifier))
    }

    /// Drop every expired or exhausted entry and return their ids.
    pub fn purge_expired(&mut self, now: i64) -> Vec<EffectId> {
        let expired = self
            .active
            .iter()
            .filter(|(_, modifier)| !is_live(modifier, now))
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        for id in &expired {
            self.active.remove(id);
            debug!(effect = %id, "effect expired");
        }
        expired
    }

    /// Live reweights as `(filter, multiplier)` pairs.
    pub fn reweights(&self, now: i64) -> impl Iterator<Item = (&TierFilter, f64)> {
        self.live(now).filter_map(|(_, modifier)| match &modifier.effect {
            ModifierEffect::Reweight { filter, multiplier } => Some((filter, *multiplier)),
            _ => None,
        })
    }

    /// Product of every live points multiplier (1.0 when none).
    pub fn points_multiplier(&self, now: i64) -> f64 {
        self.live(now)
            .filter_map(|(_, modifier)| match modifier.effect {
                ModifierEffect::PointsMultiplier { factor } => Some(factor),
                _ => None,
            })
            .product()
    }

    /// Latest expiry of a live freeze-clock effect, or 0 when the clock runs.
    pub fn frozen_until(&self, now: i64) -> i64 {
        self.live(now)
            .filter(|(_, modifier)| matches!(modifier.effect, ModifierEffect::FreezeClock))
            .filter_map(|(_, modifier)| modifier.expires_at)
            .max()
            .unwrap_or(0)
    }

    /// The first live force outcome with uses left.
    pub fn force_outcome(&self, now: i64) -> Option<(EffectId, &TierFilter)> {
        self.live(now).find_map(|(id, modifier)| match &modifier.effect {
            ModifierEffect::ForceOutcome {
                filter,
                remaining_uses,
            } if *remaining_uses > 0 => Some((id, filter)),
            _ => None,
        })
    }

    /// Use up one forced discovery of `effect`. Returns the uses left, or
    /// `None` if `effect` is not a force outcome.
    pub fn consume_force_use(&mut self, effect: EffectId) -> Option<u32> {
        match self.active.get_mut(&effect).map(|m| &mut m.effect) {
            Some(ModifierEffect::ForceOutcome { remaining_uses, .. }) => {
                *remaining_uses = remaining_uses.saturating_sub(1);
                Some(*remaining_uses)
            }
            _ => None,
        }
    }

    /// Uses left on a force-outcome `effect`.
    pub fn remaining_uses(&self, effect: EffectId) -> Option<u32> {
        match self.active.get(&effect).map(|m| &m.effect) {
            Some(ModifierEffect::ForceOutcome { remaining_uses, .. }) => Some(*remaining_uses),
            _ => None,
        }
    }

    fn live(&self, now: i64) -> impl Iterator<Item = (EffectId, &ActiveModifier)> {
        self.active
            .iter()
            .filter(move |(_, modifier)| is_live(modifier, now))
            .map(|(id, modifier)| (*id, modifier))
    }

    // -----------------------------------------------------------------------
    // Stacking counters
    // -----------------------------------------------------------------------

    /// Raise `kind` by one level and return the new count.
    pub fn tick_stack(&mut self, kind: StackKind) -> Result<u32, ModifierError> {
        let counter = self
            .stacks
            .get_mut(&kind)
            .ok_or(ModifierError::UnknownStack { kind })?;
        if counter.count >= counter.cap {
            return Err(ModifierError::MaxStackReached {
                kind,
                cap: counter.cap,
            });
        }
        counter.count = counter.count.saturating_add(1);
        Ok(counter.count)
    }

    /// Set `kind` to `count`, clamped to its cap. Returns the stored count
    /// (0 for an unregistered kind).
    pub fn restore_stack(&mut self, kind: StackKind, count: u32) -> u32 {
        self.stacks.get_mut(&kind).map_or(0, |counter| {
            counter.count = count.min(counter.cap);
            counter.count
        })
    }

    /// Current level of `kind` (0 when unregistered).
    pub fn stack_count(&self, kind: StackKind) -> u32 {
        self.stacks.get(&kind).map_or(0, StackingCounter::count)
    }

    /// The counter registered for `kind`.
    pub fn stack(&self, kind: StackKind) -> Option<&StackingCounter> {
        self.stacks.get(&kind)
    }

    /// Trigger period of `kind`, or `None` while its count is zero.
    pub fn trigger_interval(&self, kind: StackKind) -> Option<Duration> {
        self.stacks.get(&kind).and_then(StackingCounter::interval)
    }

    /// Remove every effect and zero every counter. Registrations survive.
    pub fn clear(&mut self) {
        self.active.clear();
        for counter in self.stacks.values_mut() {
            counter.count = 0;
        }
    }
}

fn is_live(modifier: &ActiveModifier, now: i64) -> bool {
    let unexpired = modifier.expires_at.is_none_or(|at| now < at);
    let has_uses = !matches!(
        modifier.effect,
        ModifierEffect::ForceOutcome {
            remaining_uses: 0,
            ..
        }
    );
    unexpired && has_uses
}
