//! Data models shared across the pipeline.
//!
//! - [`Channel`]: a monitored YouTube channel, loaded once from `channels.json`
//! - [`Video`]: one upload fetched during a cycle
//! - [`KeywordSet`]: the four keyword tiers, loaded once from `keywords.json`
//! - [`FilterResult`] / [`ScoredVideo`]: the relevance verdict attached to a video for one cycle
//! - [`RecentPost`]: the slice of a Lemmy post needed for duplicate detection
//!
//! The JSON field names (`channelID`, `primary_series_tag`, `top_keywords`, ...)
//! follow the configuration files the bot has always read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base for the canonical watch URL of a video.
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// A YouTube channel being monitored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Channel {
    /// The YouTube channel ID (`UC...`).
    #[serde(rename = "channelID", default)]
    pub id: String,
    /// Display name used in logs and in the post body.
    #[serde(default)]
    pub name: String,
    /// Optional prefix for post titles, rendered as `[tag]`.
    #[serde(rename = "primary_series_tag", default)]
    pub tag: Option<String>,
}

impl Channel {
    /// The title prefix tag, treating an empty string as absent.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unknown Channel"
        } else {
            &self.name
        }
    }
}

/// A video fetched from a channel during one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    /// `true` for live or upcoming broadcasts.
    pub is_live: bool,
    pub channel: Channel,
}

impl Video {
    pub fn url(&self) -> String {
        format!("{WATCH_URL_BASE}{}", self.id)
    }
}

/// The four keyword tiers. Matching is case-insensitive substring search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeywordSet {
    #[serde(default)]
    pub auto_reject: Vec<String>,
    #[serde(rename = "negative_keywords", default)]
    pub negative: Vec<String>,
    #[serde(rename = "top_keywords", default)]
    pub top: Vec<String>,
    #[serde(rename = "other_keywords", default)]
    pub other: Vec<String>,
}

impl KeywordSet {
    pub fn len(&self) -> usize {
        self.auto_reject.len() + self.negative.len() + self.top.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keywords that matched a video, partitioned by tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchedKeywords {
    pub top: Vec<String>,
    pub other: Vec<String>,
    pub negative: Vec<String>,
}

/// Score and rationale for a single video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    pub score: i64,
    pub matches: MatchedKeywords,
    /// Set when an auto-reject keyword short-circuited scoring.
    pub auto_rejected: bool,
}

/// A video that passed the relevance filter, paired with its verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredVideo {
    pub video: Video,
    pub result: FilterResult,
}

/// A post already present in the destination community.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentPost {
    pub url: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_deserialization() {
        let json = r#"[
            {"channelID": "UC-yHapH6mW1ceZ_5PDUf1_g", "name": "GT World", "primary_series_tag": "GTWC"},
            {"channelID": "UC123", "name": "No Tag"}
        ]"#;

        let channels: Vec<Channel> = serde_json::from_str(json).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].id, "UC-yHapH6mW1ceZ_5PDUf1_g");
        assert_eq!(channels[0].tag(), Some("GTWC"));
        assert_eq!(channels[1].tag(), None);
    }

    #[test]
    fn test_channel_empty_tag_is_absent() {
        let channel = Channel {
            id: "UC1".to_string(),
            name: "Somebody".to_string(),
            tag: Some("  ".to_string()),
        };
        assert_eq!(channel.tag(), None);
    }

    #[test]
    fn test_channel_display_name_fallback() {
        let channel = Channel {
            id: "UC1".to_string(),
            name: String::new(),
            tag: None,
        };
        assert_eq!(channel.display_name(), "Unknown Channel");
    }

    #[test]
    fn test_keyword_set_deserialization() {
        let json = r#"{
            "auto_reject": ["shorts"],
            "negative_keywords": ["clickbait"],
            "top_keywords": ["race", "qualifying"]
        }"#;

        let keywords: KeywordSet = serde_json::from_str(json).unwrap();
        assert_eq!(keywords.auto_reject, vec!["shorts"]);
        assert_eq!(keywords.negative, vec!["clickbait"]);
        assert_eq!(keywords.top.len(), 2);
        assert!(keywords.other.is_empty());
        assert_eq!(keywords.len(), 4);
    }

    #[test]
    fn test_video_url() {
        let video = Video {
            id: "dQw4w9WgXcQ".to_string(),
            title: "Title".to_string(),
            description: String::new(),
            published_at: Utc::now(),
            is_live: false,
            channel: Channel {
                id: "UC1".to_string(),
                name: "Channel".to_string(),
                tag: None,
            },
        };
        assert_eq!(video.url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
