use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Mapping {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    /// Unix seconds, set once at insert
    pub created_at: i64,
    pub click_count: i64,
}

impl Mapping {
    /// RFC 3339 rendering of `created_at`, falling back to the raw number
    /// for values chrono cannot represent.
    pub fn created_at_rfc3339(&self) -> String {
        DateTime::<Utc>::from_timestamp(self.created_at, 0)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| self.created_at.to_string())
    }
}

/// Body of `POST /api/shorten`.
///
/// `url` stays untyped so a missing field, a `null` and a non-string value
/// can each be reported with their own message.
#[derive(Debug, Default, Deserialize)]
pub struct ShortenRequest {
    #[serde(default)]
    pub url: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
    pub original_url: String,
    pub short_code: String,
    pub click_count: i64,
}

impl ShortenResponse {
    pub fn from_mapping(mapping: Mapping, base_url: &str) -> Self {
        Self {
            short_url: format!("{}/{}", base_url.trim_end_matches('/'), mapping.short_code),
            original_url: mapping.original_url,
            short_code: mapping.short_code,
            click_count: mapping.click_count,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub original_url: String,
    pub short_code: String,
    pub click_count: i64,
    pub created_at: String,
}

impl From<Mapping> for StatsResponse {
    fn from(mapping: Mapping) -> Self {
        let created_at = mapping.created_at_rfc3339();
        Self {
            original_url: mapping.original_url,
            short_code: mapping.short_code,
            click_count: mapping.click_count,
            created_at,
        }
    }
}
