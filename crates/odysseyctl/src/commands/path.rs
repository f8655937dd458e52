//! `odysseyctl path` - change a user's primary skill path

use super::Context;
use crate::output;
use anyhow::Result;
use serde_json::json;

pub fn run(ctx: &Context, user_id: &str, path: &str) -> Result<()> {
    let track = ctx.engine.set_primary_path(user_id, path)?;

    if ctx.json {
        return output::print_json(&json!({
            "user_id": user_id,
            "primary_path": track,
        }));
    }

    output::display_success(&format!(
        "{} now follows the {} path",
        user_id,
        track.display_name()
    ));
    Ok(())
}
