//! Compliance blacklists
//!
//! Two layers: category ids that are never harvested, and title keywords
//! that mark a listing as regulated or age-sensitive merchandise.

use regex::Regex;
use std::sync::OnceLock;

/// Category ids excluded from every channel
const BANNED_CATEGORIES: &[(u64, &str)] = &[
    (165793011, "Toys & Games"),
    (3760931, "Baby"),
    (3760911, "Health & Household"),
    (100573030, "Medical Supplies"),
    (16310101, "Grocery & Gourmet Food"),
    (3760901, "Dietary Supplements"),
    (172282, "Radio Frequency Devices"),
    (281407, "Medical Electronics"),
    (10971181011, "Lighters & Matches"),
    (11965861, "Self Defense"),
];

/// Title and description patterns that flag regulated merchandise
const HIGH_RISK_PATTERNS: &[&str] = &[
    r"\bFDA\b",
    r"\bCE\b",
    r"\bCPSC\b",
    r"\bASTM F963\b",
    r"\bmedical\b",
    r"\btherapeutic\b",
    r"\borthopedic\b",
    r"\bsupplement\b",
    r"\bvitamin\b",
    r"\bBPA Free\b",
    r"\bfor [0-3] year olds\b",
    r"\bchoking hazard\b",
];

fn compiled_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        HIGH_RISK_PATTERNS
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("static pattern"))
            .collect()
    })
}

/// Name of the banned category the id belongs to, if any
///
/// Non-numeric ids (slug-style ids from ranking URLs) are never banned.
pub fn banned_category(category_id: &str) -> Option<&'static str> {
    let id: u64 = category_id.parse().ok()?;
    BANNED_CATEGORIES
        .iter()
        .find(|(banned, _)| *banned == id)
        .map(|(_, name)| *name)
}

/// The first risk keyword matching the listing text, if any
pub fn high_risk_match(title: &str, description: &str) -> Option<String> {
    if title.is_empty() {
        return None;
    }
    let text = format!("{title} {description}");
    for (regex, raw) in compiled_patterns().iter().zip(HIGH_RISK_PATTERNS) {
        if regex.is_match(&text) {
            return Some((*raw).to_string());
        }
    }
    None
}
