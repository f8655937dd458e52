//! `odysseyctl complete` - record a mission attempt

use super::Context;
use crate::output;
use anyhow::Result;
use odyssey_core::MissionAttempt;
use owo_colors::OwoColorize;

pub fn run(
    ctx: &Context,
    user_id: &str,
    mission_id: &str,
    time_secs: f64,
    errors: u32,
    failed: bool,
) -> Result<()> {
    let attempt = if failed {
        MissionAttempt::failed(user_id, mission_id, time_secs, errors)
    } else {
        MissionAttempt::completed(user_id, mission_id, time_secs, errors)
    };
    let result = ctx.engine.complete_mission(&attempt)?;

    if ctx.json {
        return output::print_json(&result);
    }

    println!();
    if failed {
        output::display_info(&format!("{} attempted {} (not completed, no XP)", user_id, mission_id));
    } else {
        output::display_success(&format!("{} completed {}", user_id, mission_id));
    }
    println!("  Score:          {}", output::percent_colored(result.score));
    println!(
        "  XP earned:      +{} (total {})",
        result.xp_earned.to_string().bright_green(),
        result.total_xp
    );
    println!("  Level:          {} ({})", result.new_level, result.new_level.title());

    if result.leveled_up {
        println!();
        println!(
            "{} {} -> {} ({})",
            "[LEVEL UP]".bright_yellow().bold(),
            result.previous_level,
            result.new_level,
            result.new_level.title()
        );
    }
    for planet in &result.newly_unlocked_planets {
        println!("{} planet {}", "[UNLOCKED]".bright_cyan(), ctx.planet_name(planet));
    }
    for achievement in &result.newly_unlocked_achievements {
        println!("{} {}", "[ACHIEVEMENT]".bright_magenta(), ctx.achievement_name(achievement));
    }
    println!();
    Ok(())
}
