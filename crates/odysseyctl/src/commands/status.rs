//! `odysseyctl status` - progress dashboard for one user
//!
//! Sections:
//! - [LEVEL] level, title, XP and progress to the next level
//! - [SKILL TRACKS] XP per track
//! - [PLANETS] unlock state and completion per planet
//! - [ACHIEVEMENTS] unlock state and progress per achievement

use super::Context;
use crate::output;
use anyhow::Result;
use odyssey_core::{ProgressSummary, SkillTrack};
use owo_colors::OwoColorize;

const BAR_WIDTH: usize = 20;

pub fn run(ctx: &Context, user_id: &str) -> Result<()> {
    let summary = ctx.engine.status(user_id)?;

    if ctx.json {
        return output::print_json(&summary);
    }

    output::header(&format!("Pilot {}", summary.user_id));
    print_level_section(&summary);
    print_tracks_section(&summary);
    print_planets_section(&summary);
    print_achievements_section(&summary);

    println!();
    println!("{}", output::THIN_SEP);
    println!("  Use 'odysseyctl unlocks {}' for pending unlocks.", summary.user_id);
    println!();
    Ok(())
}

fn print_level_section(summary: &ProgressSummary) {
    output::section("LEVEL");
    println!(
        "  Level:          {} ({})",
        summary.level.to_string().bold(),
        summary.title
    );
    println!("  Total XP:       {}", summary.total_xp);
    println!(
        "  Progress:       {} {}",
        output::progress_bar(summary.progress_percent, BAR_WIDTH),
        output::percent_colored(summary.progress_percent)
    );
    println!("  Next level in:  {} XP", summary.xp_to_next_level);
    println!("  Missions done:  {}", summary.completed_missions);
}

fn print_tracks_section(summary: &ProgressSummary) {
    output::section("SKILL TRACKS");
    for track in SkillTrack::ALL {
        let xp = summary.xp_by_track.get(&track).copied().unwrap_or(0);
        let marker = if track == summary.primary_path { " *" } else { "" };
        let line = format!("  {:<16}{:>6} XP{}", track.display_name(), xp, marker);
        if xp > 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_planets_section(summary: &ProgressSummary) {
    output::section("PLANETS");
    for planet in &summary.planets {
        let name = if planet.name.is_empty() { &planet.id } else { &planet.name };
        if planet.unlocked {
            println!(
                "  {:<16}{} {}",
                name,
                output::progress_bar(planet.progress_percent, BAR_WIDTH),
                output::percent_colored(planet.progress_percent)
            );
        } else {
            println!("  {:<16}{}", name.dimmed(), "locked".dimmed());
        }
    }
}

fn print_achievements_section(summary: &ProgressSummary) {
    output::section("ACHIEVEMENTS");
    for achievement in &summary.achievements {
        let name = if achievement.name.is_empty() {
            &achievement.id
        } else {
            &achievement.name
        };
        if achievement.unlocked {
            println!("  {} {}", "[x]".green(), name);
        } else {
            println!(
                "  [ ] {:<28}{}",
                name,
                output::percent_colored(achievement.progress_percent)
            );
        }
    }
}
