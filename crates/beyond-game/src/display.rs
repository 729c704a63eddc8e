//! Text formatting for the terminal.

use std::fmt::Write as _;

use beyond_core::session::SessionStats;
use beyond_core::shop::ShopListing;

/// Compact point formatting: `999`, `1.50K`, `2.00M`, `3.25B`.
pub fn points(value: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];
    for (scale, suffix) in UNITS {
        if value >= scale {
            #[allow(clippy::cast_precision_loss)]
            let scaled = value as f64 / scale as f64;
            return format!("{scaled:.2}{suffix}");
        }
    }
    value.to_string()
}

/// Elapsed milliseconds as seconds with one decimal: `12.3s`.
pub fn elapsed(ms: i64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let seconds = ms as f64 / 1_000.0;
    format!("{seconds:.1}s")
}

/// The shop listing, one item per line.
pub fn shop(listing: &[ShopListing]) -> String {
    let mut out = String::from("== Shop ==\n");
    for row in listing {
        let status = if row.maxed {
            " [max]"
        } else if row.active {
            " [active]"
        } else if row.affordable {
            ""
        } else {
            " [can't afford]"
        };
        let owned = row.owned.map(|n| format!(" (owned {n})")).unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:<13} {:>9} pts  {}{}{}\n                {}",
            row.id.as_str(),
            points(row.price),
            row.name,
            owned,
            status,
            row.description
        );
    }
    out
}

/// The stats-for-nerds panel.
pub fn stats(stats: &SessionStats) -> String {
    let mut out = String::from("== Stats for Nerds ==\n");
    let _ = writeln!(
        out,
        "  Player:       {}",
        stats.username.as_deref().unwrap_or("?")
    );
    let _ = writeln!(out, "  Clicks:       {}", stats.total_discoveries);
    let _ = writeln!(out, "  Points:       {}", points(stats.total_points));
    let _ = writeln!(out, "  Time:         {}", elapsed(stats.elapsed_ms));
    let _ = writeln!(
        out,
        "  Rarest find:  {}",
        stats.rarest_find.as_ref().map_or("None", |r| r.name.as_str())
    );
    let _ = writeln!(out, "  Auto-clickers: {}", stats.auto_clickers);
    let _ = writeln!(out, "  Background:   {}", stats.background);
    let _ = writeln!(
        out,
        "  Achievements: {}/{}",
        stats.achievements_unlocked, stats.achievement_goal
    );
    for effect in &stats.active_effects {
        let detail = match (effect.remaining_ms, effect.remaining_uses) {
            (Some(ms), _) => format!("{} left", elapsed(ms)),
            (None, Some(uses)) => format!("{uses} use(s) left"),
            (None, None) => String::new(),
        };
        let _ = writeln!(out, "  Effect:       {} ({detail})", effect.effect);
    }
    if !stats.find_shares.is_empty() {
        out.push_str("  Rarity chances (observed):\n");
        for share in &stats.find_shares {
            let _ = writeln!(out, "    {}: {:.2}%", share.name, share.percent);
        }
    }
    out
}
