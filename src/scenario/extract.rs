//! Pulling identifiers out of free-text tool responses

use regex::Regex;
use std::sync::OnceLock;

fn created_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)ID[:\s]+(\d+)").expect("static regex is valid"))
}

/// Find the identifier of a created entity in a create response, e.g.
/// `"Created task, ID: 7"`. Returns None when no `ID` marker is followed
/// by digits or the number does not fit.
pub fn extract_created_id(text: &str) -> Option<u64> {
    created_id_pattern()
        .captures_iter(text)
        .find_map(|caps| caps.get(1)?.as_str().parse().ok())
}
