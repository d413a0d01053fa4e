use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::common::id_from_string_or_number;

/// News category, listed in classification precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsType {
    Injury,
    Return,
    Contract,
    Performance,
    Milestone,
    General,
}

impl NewsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsType::Injury => "injury",
            NewsType::Return => "return",
            NewsType::Contract => "contract",
            NewsType::Performance => "performance",
            NewsType::Milestone => "milestone",
            NewsType::General => "general",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "injury" => Some(NewsType::Injury),
            "return" => Some(NewsType::Return),
            "contract" => Some(NewsType::Contract),
            "performance" => Some(NewsType::Performance),
            "milestone" => Some(NewsType::Milestone),
            "general" => Some(NewsType::General),
            _ => None,
        }
    }
}

impl fmt::Display for NewsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected fantasy impact of a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Source-qualified identifier, e.g. `rotowire_123`
    pub id: String,
    pub title: String,
    pub summary: String,
    pub player: Option<String>,
    pub team: Option<String>,
    #[serde(rename = "type")]
    pub news_type: NewsType,
    pub impact: Impact,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Filtering and capping applied to a merged news feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub limit: usize,
    pub news_type: Option<NewsType>,
    pub team: Option<String>,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            limit: 15,
            news_type: None,
            team: None,
        }
    }
}

impl NewsQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &NewsItem) -> bool {
        let type_ok = self.news_type.is_none_or(|wanted| item.news_type == wanted);
        let team_ok = self.team.as_deref().is_none_or(|wanted| {
            item.team
                .as_deref()
                .is_some_and(|team| team.eq_ignore_ascii_case(wanted))
        });
        type_ok && team_ok
    }
}

// Raw payloads. Every source omits fields freely, so nearly everything is optional.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RotowireNewsResponse {
    #[serde(default)]
    pub news: Vec<RawRotowireItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRotowireItem {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub player: Option<RawRotowirePlayer>,
    /// Textual rating or 0-10 score
    pub impact_rating: Option<serde_json::Value>,
    pub timestamp: Option<serde_json::Value>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRotowirePlayer {
    pub name: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RotowireInjuryResponse {
    #[serde(default)]
    pub injuries: Vec<RawInjury>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInjury {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub player_id: String,
    pub player_name: String,
    pub team: Option<String>,
    pub injury_status: Option<String>,
    pub injury_details: Option<String>,
    pub severity: Option<String>,
    pub last_updated: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EspnNewsResponse {
    #[serde(default)]
    pub articles: Vec<RawEspnArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEspnArticle {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub headline: String,
    pub description: Option<String>,
    pub published: Option<serde_json::Value>,
    #[serde(default)]
    pub athletes: Vec<RawEspnAthlete>,
    pub team: Option<RawEspnTeam>,
    pub categories: Option<serde_json::Value>,
    pub links: Option<RawEspnLinks>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEspnAthlete {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEspnTeam {
    pub abbreviation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEspnLinks {
    pub web: Option<RawEspnLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEspnLink {
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsSearchResponse {
    #[serde(default)]
    pub articles: Vec<RawSearchArticle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchArticle {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub url: String,
    pub published_at: Option<serde_json::Value>,
    pub source: Option<RawSearchSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchSource {
    pub name: Option<String>,
}
