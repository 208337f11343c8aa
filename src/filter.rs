//! Keyword relevance scoring.
//!
//! Each keyword is tested as a case-insensitive substring of the title and the
//! description. A keyword counts at most once per video, however many times
//! and in however many fields it appears.
//!
//! Scoring:
//! - any auto-reject keyword (when enabled) short-circuits to [`AUTO_REJECT_SCORE`]
//! - `+top_keyword_points` per top keyword
//! - `+other_keyword_points` per other keyword
//! - `+negative_keyword_points` (normally negative) per negative keyword
//!
//! A video is kept when it was not auto-rejected and its score reaches the
//! threshold.

use crate::config::ScoringConfig;
use crate::models::{FilterResult, KeywordSet, MatchedKeywords, ScoredVideo, Video};
use tracing::{debug, instrument};

/// Score reported for auto-rejected videos.
pub const AUTO_REJECT_SCORE: i64 = -1000;

#[derive(Debug, Clone)]
pub struct VideoFilter {
    keywords: KeywordSet,
    scoring: ScoringConfig,
}

impl VideoFilter {
    pub fn new(keywords: KeywordSet, scoring: ScoringConfig) -> Self {
        Self { keywords, scoring }
    }

    pub fn threshold(&self) -> i64 {
        self.scoring.threshold
    }

    /// `true` if auto-reject is on and an auto-reject keyword appears in either field.
    pub fn should_auto_reject(&self, title: &str, description: &str) -> bool {
        if !self.scoring.auto_reject {
            return false;
        }
        let haystack = Haystack::new(title, description);
        self.keywords.auto_reject.iter().any(|k| haystack.contains(k))
    }

    /// Score a title/description pair.
    pub fn score(&self, title: &str, description: &str) -> FilterResult {
        if self.should_auto_reject(title, description) {
            return FilterResult {
                score: AUTO_REJECT_SCORE,
                matches: MatchedKeywords::default(),
                auto_rejected: true,
            };
        }

        let haystack = Haystack::new(title, description);
        let matching = |tier: &[String]| -> Vec<String> {
            tier.iter().filter(|k| haystack.contains(k)).cloned().collect()
        };

        let matches = MatchedKeywords {
            top: matching(&self.keywords.top),
            other: matching(&self.keywords.other),
            negative: matching(&self.keywords.negative),
        };

        let points = |per_match: i64, matched: &[String]| {
            per_match.saturating_mul(i64::try_from(matched.len()).unwrap_or(i64::MAX))
        };
        let score = points(self.scoring.top_keyword_points, &matches.top)
            .saturating_add(points(self.scoring.other_keyword_points, &matches.other))
            .saturating_add(points(self.scoring.negative_keyword_points, &matches.negative));

        FilterResult {
            score,
            matches,
            auto_rejected: false,
        }
    }

    pub fn passes(&self, score: i64) -> bool {
        score >= self.scoring.threshold
    }

    /// `true` if the video was not auto-rejected and its score passes.
    pub fn accepts(&self, result: &FilterResult) -> bool {
        !result.auto_rejected && self.passes(result.score)
    }

    /// Keep the videos that pass, paired with their score, in input order.
    ///
    /// Videos with an empty title are skipped without being scored. The input
    /// is not modified.
    #[instrument(level = "info", skip_all, fields(input = videos.len()))]
    pub fn filter(&self, videos: &[Video]) -> Vec<ScoredVideo> {
        videos
            .iter()
            .filter(|video| !video.title.is_empty())
            .filter_map(|video| {
                let result = self.score(&video.title, &video.description);
                let keep = self.accepts(&result);
                debug!(
                    video_id = %video.id,
                    published = %video.published_at,
                    score = result.score,
                    keep,
                    "Scored video"
                );
                keep.then(|| ScoredVideo {
                    video: video.clone(),
                    result,
                })
            })
            .collect()
    }
}

/// Lowercased title and description, computed once per video.
struct Haystack {
    title: String,
    description: String,
}

impl Haystack {
    fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_lowercase(),
            description: description.to_lowercase(),
        }
    }

    fn contains(&self, keyword: &str) -> bool {
        if keyword.trim().is_empty() {
            return false;
        }
        let keyword = keyword.to_lowercase();
        self.title.contains(&keyword) || self.description.contains(&keyword)
    }
}
