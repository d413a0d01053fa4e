//! Conversion of each news source's payload into [`NewsItem`]s

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::news_classification::{
    assess_impact, classify_news_type, extract_team_from_text, impact_from_severity,
};
use crate::data_fetcher::models::{NewsItem, NewsType};
use crate::data_fetcher::models::news::{
    EspnNewsResponse, NewsSearchResponse, RotowireInjuryResponse, RotowireNewsResponse,
};

pub const ROTOWIRE_SOURCE: &str = "Rotowire";
pub const INJURY_REPORT_SOURCE: &str = "Rotowire Injury Report";
pub const ESPN_SOURCE: &str = "ESPN";
const SEARCH_FALLBACK_SOURCE: &str = "NewsAPI";

/// Epoch seconds above this are taken as milliseconds
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Reads an RFC 3339 string or an epoch number. Anything unreadable becomes
/// the Unix epoch so the item sorts last.
pub fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    let parsed = match value {
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        Some(Value::Number(number)) => number.as_i64().and_then(|n| {
            if n.abs() >= MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(n)
            } else {
                DateTime::from_timestamp(n, 0)
            }
        }),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        debug!("Unreadable news timestamp {value:?}");
        DateTime::<Utc>::UNIX_EPOCH
    })
}

pub fn format_rotowire_news(response: &RotowireNewsResponse) -> Vec<NewsItem> {
    response
        .news
        .iter()
        .map(|item| {
            let summary = item.summary.clone().unwrap_or_default();
            NewsItem {
                id: format!("rotowire_{}", item.id),
                news_type: classify_news_type(&item.headline, &summary),
                impact: assess_impact(item.impact_rating.as_ref()),
                title: item.headline.clone(),
                summary,
                player: item.player.as_ref().and_then(|p| p.name.clone()),
                team: item.player.as_ref().and_then(|p| p.team.clone()),
                timestamp: parse_timestamp(item.timestamp.as_ref()),
                source: ROTOWIRE_SOURCE.to_string(),
                url: item.url.clone(),
            }
        })
        .collect()
}

/// Injury report rows are always injuries; severity drives the impact
pub fn format_injury_report(response: &RotowireInjuryResponse) -> Vec<NewsItem> {
    response
        .injuries
        .iter()
        .map(|injury| NewsItem {
            id: format!("injury_{}", injury.player_id),
            title: format!(
                "{} - {}",
                injury.player_name,
                injury.injury_status.as_deref().unwrap_or("Injured")
            ),
            summary: injury.injury_details.clone().unwrap_or_default(),
            player: Some(injury.player_name.clone()),
            team: injury.team.clone(),
            news_type: NewsType::Injury,
            impact: impact_from_severity(injury.severity.as_deref()),
            timestamp: parse_timestamp(injury.last_updated.as_ref()),
            source: INJURY_REPORT_SOURCE.to_string(),
            url: None,
        })
        .collect()
}

pub fn format_espn_news(response: &EspnNewsResponse) -> Vec<NewsItem> {
    response
        .articles
        .iter()
        .map(|article| {
            let summary = article.description.clone().unwrap_or_default();
            NewsItem {
                id: format!("espn_{}", article.id),
                news_type: classify_news_type(&article.headline, &summary),
                impact: assess_impact(article.categories.as_ref()),
                title: article.headline.clone(),
                summary,
                player: article
                    .athletes
                    .first()
                    .and_then(|athlete| athlete.display_name.clone()),
                team: article.team.as_ref().and_then(|t| t.abbreviation.clone()),
                timestamp: parse_timestamp(article.published.as_ref()),
                source: ESPN_SOURCE.to_string(),
                url: article
                    .links
                    .as_ref()
                    .and_then(|links| links.web.as_ref())
                    .and_then(|web| web.href.clone()),
            }
        })
        .collect()
}

/// Search hits are attributed to the player that was searched for
pub fn format_news_search(response: &NewsSearchResponse, player_name: &str) -> Vec<NewsItem> {
    response
        .articles
        .iter()
        .map(|article| {
            let summary = article.description.clone().unwrap_or_default();
            let slug = article
                .url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default();
            NewsItem {
                id: format!("newsapi_{slug}"),
                news_type: classify_news_type(&article.title, &summary),
                impact: assess_impact(Some(&Value::String(article.title.clone()))),
                team: extract_team_from_text(&format!("{} {}", article.title, summary)),
                title: article.title.clone(),
                summary,
                player: Some(player_name.to_string()),
                timestamp: parse_timestamp(article.published_at.as_ref()),
                source: article
                    .source
                    .as_ref()
                    .and_then(|s| s.name.clone())
                    .unwrap_or_else(|| SEARCH_FALLBACK_SOURCE.to_string()),
                url: (!article.url.is_empty()).then(|| article.url.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::models::Impact;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 11, 2, 18, 30, 0).unwrap();
        assert_eq!(parse_timestamp(Some(&json!("2024-11-02T18:30:00Z"))), expected);
        assert_eq!(parse_timestamp(Some(&json!(1730572200))), expected);
        assert_eq!(parse_timestamp(Some(&json!(1730572200000i64))), expected);
        assert_eq!(parse_timestamp(Some(&json!("yesterday"))), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(parse_timestamp(None), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_rotowire_items() {
        let response: RotowireNewsResponse = serde_json::from_value(json!({
            "news": [{
                "id": 991,
                "headline": "Quinn Hughes signs 4-year extension",
                "summary": "Deal keeps the defenseman in Vancouver",
                "player": {"name": "Quinn Hughes", "team": "VAN"},
                "impact_rating": 9,
                "timestamp": "2024-11-02T18:30:00Z"
            }]
        }))
        .unwrap();

        let items = format_rotowire_news(&response);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.id, "rotowire_991");
        assert_eq!(item.news_type, NewsType::Contract);
        assert_eq!(item.impact, Impact::High);
        assert_eq!(item.player.as_deref(), Some("Quinn Hughes"));
        assert_eq!(item.team.as_deref(), Some("VAN"));
        assert_eq!(item.source, ROTOWIRE_SOURCE);
    }

    #[test]
    fn test_injury_report_items() {
        let response: RotowireInjuryResponse = serde_json::from_value(json!({
            "injuries": [{
                "player_id": "8479318",
                "player_name": "Auston Matthews",
                "team": "TOR",
                "injury_status": "Out",
                "injury_details": "Upper body",
                "severity": "moderate",
                "last_updated": "2024-11-02T12:00:00Z"
            }]
        }))
        .unwrap();

        let items = format_injury_report(&response);
        assert_eq!(items[0].id, "injury_8479318");
        assert_eq!(items[0].title, "Auston Matthews - Out");
        assert_eq!(items[0].news_type, NewsType::Injury);
        assert_eq!(items[0].impact, Impact::Medium);
    }

    #[test]
    fn test_espn_items() {
        let response: EspnNewsResponse = serde_json::from_value(json!({
            "articles": [{
                "id": 40123,
                "headline": "Oilers captain records hat trick",
                "description": "Three goals in the third period",
                "published": "2024-11-01T03:00:00Z",
                "athletes": [{"displayName": "Connor McDavid"}],
                "team": {"abbreviation": "EDM"},
                "categories": [{"type": "team"}],
                "links": {"web": {"href": "https://espn.example/story"}}
            }]
        }))
        .unwrap();

        let item = &format_espn_news(&response)[0];
        assert_eq!(item.id, "espn_40123");
        assert_eq!(item.news_type, NewsType::Performance);
        assert_eq!(item.impact, Impact::Medium);
        assert_eq!(item.player.as_deref(), Some("Connor McDavid"));
        assert_eq!(item.url.as_deref(), Some("https://espn.example/story"));
    }

    #[test]
    fn test_search_items_take_searched_player() {
        let response: NewsSearchResponse = serde_json::from_value(json!({
            "articles": [{
                "title": "Major blow: TOR star out weeks",
                "description": "Lengthy absence expected",
                "url": "https://news.example/hockey/matthews-out/",
                "publishedAt": "2024-11-02T10:00:00Z",
                "source": {"name": "The Wire"}
            }]
        }))
        .unwrap();

        let item = &format_news_search(&response, "Auston Matthews")[0];
        assert_eq!(item.id, "newsapi_matthews-out");
        assert_eq!(item.player.as_deref(), Some("Auston Matthews"));
        assert_eq!(item.team.as_deref(), Some("TOR"));
        assert_eq!(item.impact, Impact::High);
        assert_eq!(item.source, "The Wire");
    }
}
