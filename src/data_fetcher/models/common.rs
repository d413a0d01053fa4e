use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream API a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// NHL stats API
    Nhl,
    /// OAuth-protected fantasy league API
    Fantasy,
    /// Third-party news and injury feeds
    News,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Nhl => "nhl",
            Provider::Fantasy => "fantasy",
            Provider::News => "news",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// NHL APIs wrap display strings as `{"default": "...", "fr": "..."}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalizedName {
    #[serde(default)]
    pub default: String,
}

impl LocalizedName {
    pub fn as_str(&self) -> &str {
        &self.default
    }
}

/// Accepts an identifier sent either as a JSON string or a JSON number
pub fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_display_matches_serde_name() {
        for provider in [Provider::Nhl, Provider::Fantasy, Provider::News] {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{provider}\""));
        }
    }

    #[derive(Deserialize)]
    struct WithId {
        #[serde(deserialize_with = "id_from_string_or_number")]
        id: String,
    }

    #[test]
    fn test_id_accepts_string_and_number() {
        let text: WithId = serde_json::from_str(r#"{"id":"8478402"}"#).unwrap();
        let number: WithId = serde_json::from_str(r#"{"id":8478402}"#).unwrap();
        assert_eq!(text.id, "8478402");
        assert_eq!(number.id, "8478402");
    }

    #[test]
    fn test_localized_name_ignores_translations() {
        let name: LocalizedName =
            serde_json::from_str(r#"{"default":"Montréal","fr":"Montréal"}"#).unwrap();
        assert_eq!(name.as_str(), "Montréal");
    }
}
