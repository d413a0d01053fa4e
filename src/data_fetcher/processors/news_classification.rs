//! Keyword heuristics applied to news text, and cross-source deduplication

use serde_json::Value;
use std::collections::HashSet;

use crate::constants::NHL_TEAMS;
use crate::data_fetcher::models::{Impact, NewsItem, NewsType};

/// Characters of the title that take part in the deduplication key
pub const DEDUP_TITLE_CHARS: usize = 20;

const INJURY_KEYWORDS: &[&str] = &["injur", "hurt", "injured reserve"];
const RETURN_KEYWORDS: &[&str] = &["return", "back", "activated"];
const CONTRACT_KEYWORDS: &[&str] = &["trade", "sign", "contract", "extension"];
const PERFORMANCE_KEYWORDS: &[&str] = &["goal", "assist", "hat trick", "record"];
const MILESTONE_KEYWORDS: &[&str] = &["milestone", "100", "career"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// `IR` only counts as a standalone word
fn mentions_injured_reserve(text: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word == "ir")
}

/// Maps headline and summary to one category. Categories are checked in a
/// fixed order (injury, return, contract, performance, milestone) and the
/// first match wins.
pub fn classify_news_type(title: &str, summary: &str) -> NewsType {
    let text = format!("{title} {summary}").to_lowercase();

    if contains_any(&text, INJURY_KEYWORDS) || mentions_injured_reserve(&text) {
        NewsType::Injury
    } else if contains_any(&text, RETURN_KEYWORDS) {
        NewsType::Return
    } else if contains_any(&text, CONTRACT_KEYWORDS) {
        NewsType::Contract
    } else if contains_any(&text, PERFORMANCE_KEYWORDS) {
        NewsType::Performance
    } else if contains_any(&text, MILESTONE_KEYWORDS) {
        NewsType::Milestone
    } else {
        NewsType::General
    }
}

/// Impact from a source's indicator: a textual rating, a 0-10 score, or
/// anything else (missing, lists) which reads as medium
pub fn assess_impact(indicator: Option<&Value>) -> Impact {
    match indicator {
        Some(Value::String(text)) => impact_from_text(text),
        Some(Value::Number(score)) => match score.as_f64() {
            Some(score) if score >= 8.0 => Impact::High,
            Some(score) if score >= 5.0 => Impact::Medium,
            _ => Impact::Low,
        },
        _ => Impact::Medium,
    }
}

pub fn impact_from_text(text: &str) -> Impact {
    let text = text.to_lowercase();
    if contains_any(&text, &["high", "major", "significant"]) {
        Impact::High
    } else if contains_any(&text, &["medium", "moderate"]) {
        Impact::Medium
    } else {
        Impact::Low
    }
}

/// Injury report severity: severe is high, moderate is medium, anything else low
pub fn impact_from_severity(severity: Option<&str>) -> Impact {
    match severity.map(str::to_ascii_lowercase).as_deref() {
        Some("severe") => Impact::High,
        Some("moderate") => Impact::Medium,
        _ => Impact::Low,
    }
}

/// First club abbreviation appearing as a standalone uppercase word
pub fn extract_team_from_text(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|word| NHL_TEAMS.iter().any(|team| team.abbrev == *word))
        .map(str::to_string)
}

pub fn dedup_key(item: &NewsItem) -> String {
    let title_prefix: String = item.title.chars().take(DEDUP_TITLE_CHARS).collect();
    format!("{}_{}", item.player.as_deref().unwrap_or_default(), title_prefix)
}

/// Drops later items that share a player and title prefix with an earlier one
pub fn deduplicate_news(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(dedup_key(item)))
        .collect()
}
