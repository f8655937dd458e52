//! Output formatting - ASCII-only terminal output

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

pub const THIN_SEP: &str = "------------------------------------------------------------";

/// Print any result as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

pub fn header(title: &str) {
    println!();
    println!("  {}", title.bold());
    println!("{}", THIN_SEP);
}

pub fn section(name: &str) {
    println!();
    println!("{}", format!("[{}]", name).cyan());
}

/// Fixed-width text bar, e.g. `[#######.............]`
pub fn progress_bar(percent: u8, width: usize) -> String {
    let filled = usize::from(percent.min(100)) * width / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// Green when done, yellow when started, dimmed otherwise
pub fn percent_colored(percent: u8) -> String {
    let text = format!("{:>3}%", percent);
    if percent >= 100 {
        text.green().to_string()
    } else if percent > 0 {
        text.yellow().to_string()
    } else {
        text.dimmed().to_string()
    }
}

pub fn display_error(message: &str) {
    eprintln!();
    eprintln!("[ERROR] {}", message.red());
    eprintln!();
}

pub fn display_success(message: &str) {
    println!("[OK] {}", message.green());
}

pub fn display_info(message: &str) {
    println!("[INFO] {}", message);
}
