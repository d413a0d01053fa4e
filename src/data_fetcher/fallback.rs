//! Static data substituted when every upstream source comes back empty.
//! Only presentation flows use it; nothing here feeds a mutation.

use chrono::{Duration, Utc};

use crate::data_fetcher::models::{Impact, NewsItem, NewsType};

pub const FALLBACK_SOURCE_PREFIX: &str = "mock_";

/// Two fixed stories, stamped relative to the current time
pub fn fallback_news() -> Vec<NewsItem> {
    let now = Utc::now();
    vec![
        NewsItem {
            id: format!("{FALLBACK_SOURCE_PREFIX}1"),
            title: "Connor McDavid reaches 100 points for fourth time".to_string(),
            summary: "Edmonton captain becomes fastest to 100 points this season with assist in 5-2 win over Vancouver".to_string(),
            player: Some("Connor McDavid".to_string()),
            team: Some("EDM".to_string()),
            news_type: NewsType::Milestone,
            impact: Impact::High,
            timestamp: now - Duration::hours(2),
            source: "NHL.com".to_string(),
            url: None,
        },
        NewsItem {
            id: format!("{FALLBACK_SOURCE_PREFIX}2"),
            title: "Auston Matthews placed on IR with upper-body injury".to_string(),
            summary: "Toronto star expected to miss 2-3 weeks with upper-body injury sustained in practice".to_string(),
            player: Some("Auston Matthews".to_string()),
            team: Some("TOR".to_string()),
            news_type: NewsType::Injury,
            impact: Impact::High,
            timestamp: now - Duration::hours(4),
            source: "TSN".to_string(),
            url: None,
        },
    ]
}

pub fn is_fallback(item: &NewsItem) -> bool {
    item.id.starts_with(FALLBACK_SOURCE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::processors::classify_news_type;

    #[test]
    fn test_fallback_items_are_marked() {
        let items = fallback_news();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(is_fallback));
        assert_eq!(
            classify_news_type(&items[1].title, &items[1].summary),
            NewsType::Injury
        );
    }

    #[test]
    fn test_fallback_is_newest_first() {
        let items = fallback_news();
        assert!(items[0].timestamp > items[1].timestamp);
    }
}
