//! Best-effort budget extraction from raw user text.
//!
//! Matches "3000元", "3000块", or "预算" followed eventually by a number.
//! No currency or locale validation — the first match wins and feeds the
//! grounding prompt as-is.

use regex_lite::Regex;
use std::sync::OnceLock;

fn budget_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)元|(\d+)块|预算.*?(\d+)").expect("budget pattern is valid"))
}

/// Scan `text` for a budget figure.
pub fn parse_budget(text: &str) -> Option<u32> {
    let caps = budget_re().captures(text)?;
    let digits = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))?
        .as_str();
    digits.parse().ok()
}
