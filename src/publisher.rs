//! Post formatting and submission.
//!
//! A post is built from a [`ScoredVideo`]:
//!
//! ```text
//! title: [LIVE] [TAG] Original video title        (cut to 200 chars)
//! url:   https://www.youtube.com/watch?v=<id>
//! body:  Channel: <name>
//!
//!        Description:
//!        <first 500 chars>...
//!
//!        Video score: <score>
//!
//!        Top keywords: a, b
//!        Other keywords: c
//!        Negative keywords: d
//! ```
//!
//! Submission happens at most once per video per cycle; a failure is logged
//! and the video is picked up again next cycle if it is still recent.

use crate::dedupe::{is_url_already_posted, CheckFailurePolicy};
use crate::lemmy::{Destination, NewPost};
use crate::models::{ScoredVideo, Video};
use crate::utils::{truncate_then_ellipsis, truncate_with_ellipsis};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::{error, info, instrument};

/// Longest title accepted, ellipsis included.
pub const MAX_TITLE_CHARS: usize = 200;

/// Description characters kept in the body before the ellipsis.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

pub const LIVE_MARKER: &str = "[LIVE]";

/// Result of trying to publish one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Posted { post_id: i64 },
    Duplicate,
    Failed,
}

/// Post title: optional live marker, optional channel tag, then the video title.
pub fn post_title(video: &Video) -> String {
    let mut title = match video.channel.tag() {
        Some(tag) => format!("[{tag}] {}", video.title),
        None => video.title.clone(),
    };
    if video.is_live {
        title = format!("{LIVE_MARKER} {title}");
    }
    truncate_with_ellipsis(&title, MAX_TITLE_CHARS)
}

/// Post body with the channel, a shortened description, and the scoring rationale.
pub fn post_body(scored: &ScoredVideo) -> String {
    let video = &scored.video;
    let matches = &scored.result.matches;

    let mut body = format!("Channel: {}\n\n", video.channel.display_name());

    if !video.description.is_empty() {
        let description = truncate_then_ellipsis(&video.description, MAX_DESCRIPTION_CHARS);
        body.push_str(&format!("Description:\n{description}\n\n"));
    }

    body.push_str(&format!("Video score: {}\n\n", scored.result.score));

    for (label, keywords) in [
        ("Top keywords", &matches.top),
        ("Other keywords", &matches.other),
        ("Negative keywords", &matches.negative),
    ] {
        if !keywords.is_empty() {
            body.push_str(&format!("{label}: {}\n", keywords.iter().join(", ")));
        }
    }

    body
}

pub fn build_post(scored: &ScoredVideo) -> NewPost {
    NewPost {
        title: post_title(&scored.video),
        url: scored.video.url(),
        body: post_body(scored),
    }
}

/// Publishes scored videos to a destination, checking for duplicates first.
#[derive(Debug, Clone, Copy)]
pub struct Publisher {
    pub duplicate_window_days: i64,
    pub check_failure_policy: CheckFailurePolicy,
}

impl Publisher {
    pub fn new(duplicate_window_days: i64, check_failure_policy: CheckFailurePolicy) -> Self {
        Self {
            duplicate_window_days,
            check_failure_policy,
        }
    }

    #[instrument(level = "info", skip_all, fields(video_id = %scored.video.id))]
    pub async fn publish<D: Destination>(
        &self,
        destination: &D,
        scored: &ScoredVideo,
        now: DateTime<Utc>,
    ) -> PublishOutcome {
        let post = build_post(scored);

        if is_url_already_posted(
            destination,
            &post.url,
            self.duplicate_window_days,
            now,
            self.check_failure_policy,
        )
        .await
        {
            info!(title = %scored.video.title, "Video already posted");
            return PublishOutcome::Duplicate;
        }

        info!(title = %post.title, "Posting video");
        match destination.create_post(&post).await {
            Ok(post_id) => {
                info!(post_id, title = %post.title, "Successfully posted video");
                PublishOutcome::Posted { post_id }
            }
            Err(e) => {
                error!(error = %e, title = %post.title, "Failed to post video");
                PublishOutcome::Failed
            }
        }
    }
}
