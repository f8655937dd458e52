//! `odysseyctl unlocks` - read-only unlock check

use super::Context;
use crate::output;
use anyhow::Result;
use owo_colors::OwoColorize;

pub fn run(ctx: &Context, user_id: &str) -> Result<()> {
    let report = ctx.engine.evaluate_unlocks(user_id)?;

    if ctx.json {
        return output::print_json(&report);
    }

    output::header(&format!("Unlocks for {}", user_id));

    output::section("PLANETS");
    for planet in &report.planets {
        let marker = if report.pending_planets.contains(planet) {
            " (pending)".yellow().to_string()
        } else {
            String::new()
        };
        println!("  * {}{}", ctx.planet_name(planet), marker);
    }

    output::section("ACHIEVEMENTS");
    if report.achievements.is_empty() {
        println!("  {}", "none yet".dimmed());
    }
    for achievement in &report.achievements {
        let marker = if report.pending_achievements.contains(achievement) {
            " (pending)".yellow().to_string()
        } else {
            String::new()
        };
        println!("  * {}{}", ctx.achievement_name(achievement), marker);
    }

    println!();
    if !report.pending_planets.is_empty() || !report.pending_achievements.is_empty() {
        println!("  Pending unlocks are recorded on the next mission completion.");
        println!();
    }
    Ok(())
}
