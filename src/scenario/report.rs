//! Console output for a scenario run
//!
//! Progress lines are prefixed with `[test-mcp]` on stdout; failures use
//! `[test-mcp ERROR]` on stderr.

use std::fmt::Display;

use colored::Colorize;

use super::checkpoints::Checkpoints;

/// Maximum characters of a response shown in debug previews
pub const PREVIEW_CHARS: usize = 300;

const PREFIX: &str = "[test-mcp]";
const ERROR_PREFIX: &str = "[test-mcp ERROR]";
const BOX_WIDTH: usize = 44;

/// Print a progress line
pub fn info(message: impl Display) {
    println!("{} {}", PREFIX.cyan(), message);
}

/// Print a failure line
pub fn error(message: impl Display) {
    eprintln!("{} {}", ERROR_PREFIX.red().bold(), message);
}

/// Truncate `text` to at most `max` characters, marking the cut
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Boxed summary table: one line per checkpoint, then a verdict banner
pub fn render_summary(checkpoints: &Checkpoints) -> String {
    let rule = "═".repeat(BOX_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("╔{}╗\n", rule));
    out.push_str(&format!("║{:^width$}║\n", "MCP SMOKE TEST SUMMARY", width = BOX_WIDTH));
    out.push_str(&format!("╠{}╣\n", rule));

    for (checkpoint, passed) in checkpoints.iter() {
        let marker = if passed { "✓".green() } else { "✗".red() };
        // The marker is one column wide whatever its colour codes
        let label = format!("{:<width$}", checkpoint.label(), width = BOX_WIDTH - 4);
        out.push_str(&format!("║  {} {}║\n", marker, label));
    }

    out.push_str(&format!("╚{}╝\n", rule));

    let banner = if checkpoints.all_passed() {
        "ALL CHECKS PASSED".green().bold()
    } else {
        format!(
            "CHECKS FAILED ({}/{} passed)",
            checkpoints.passed_count(),
            checkpoints.iter().count()
        )
        .red()
        .bold()
    };
    out.push_str(&format!("\n{}\n", banner));

    out
}

/// Print the summary table
pub fn print_summary(checkpoints: &Checkpoints) {
    println!("\n{}", render_summary(checkpoints));
}
