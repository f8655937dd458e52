//! `odysseyctl leaderboard` - top users by XP

use super::Context;
use crate::output;
use anyhow::Result;
use odyssey_core::SkillTrack;
use owo_colors::OwoColorize;

pub fn run(ctx: &Context, track: Option<&str>, limit: usize) -> Result<()> {
    let track = track.map(SkillTrack::parse).transpose()?;
    let entries = ctx.engine.leaderboard(track, limit)?;

    if ctx.json {
        return output::print_json(&entries);
    }

    let title = match track {
        Some(t) => format!("Leaderboard - {}", t.display_name()),
        None => "Leaderboard".to_string(),
    };
    output::header(&title);

    if entries.is_empty() {
        println!("  {}", "No pilots yet".dimmed());
        println!();
        return Ok(());
    }

    println!(
        "  {:>4}  {:<24}{:>8}  {:>5}  {:>8}",
        "#", "Pilot", "XP", "Level", "Missions"
    );
    for entry in &entries {
        let line = format!(
            "  {:>4}  {:<24}{:>8}  {:>5}  {:>8}",
            entry.rank,
            entry.user_id,
            entry.xp,
            entry.level.to_string(),
            entry.completed_missions
        );
        if entry.rank == 1 {
            println!("{}", line.bright_yellow());
        } else {
            println!("{}", line);
        }
    }
    println!();
    Ok(())
}
