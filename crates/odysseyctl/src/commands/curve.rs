//! `odysseyctl curve` - print the XP curve

use crate::output;
use anyhow::Result;
use odyssey_core::{cumulative_xp, xp_for_level, Level};
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurveRow {
    pub level: u32,
    pub title: &'static str,
    pub xp_for_level: u64,
    pub cumulative_xp: u64,
}

/// Cumulative XP saturates at u64::MAX from level 389 on
pub const MAX_LEVELS: u32 = 400;

pub fn rows(levels: u32) -> Vec<CurveRow> {
    (1..=levels.clamp(1, MAX_LEVELS))
        .map(|level| CurveRow {
            level,
            title: Level::from_total(cumulative_xp(level)).title(),
            xp_for_level: xp_for_level(level),
            cumulative_xp: cumulative_xp(level),
        })
        .collect()
}

pub fn run(levels: u32, json: bool) -> Result<()> {
    let rows = rows(levels);
    if json {
        return output::print_json(&rows);
    }

    output::header("XP Curve");
    println!("  {:>5}  {:<12}{:>10}  {:>12}", "Level", "Title", "Step", "Cumulative");
    let mut last_title = "";
    for row in &rows {
        let title = if row.title != last_title {
            row.title.cyan().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>5}  {:<12}{:>10}  {:>12}",
            row.level, title, row.xp_for_level, row.cumulative_xp
        );
        last_title = row.title;
    }
    println!();
    Ok(())
}
