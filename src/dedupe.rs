//! Duplicate detection against the destination's recent posts.
//!
//! Only the newest [`RECENT_POST_LIMIT`] posts are inspected, and only those
//! published inside the lookback window count. URLs are compared verbatim.

use crate::config::DEFAULT_DUPLICATE_DAYS;
use crate::lemmy::Destination;
use crate::models::RecentPost;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument, warn};

/// How many of the newest posts are scanned.
pub const RECENT_POST_LIMIT: usize = 100;

/// What to report when the recent posts cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckFailurePolicy {
    /// Report "not posted" and let the post go ahead.
    FailOpen,
    /// Report "already posted" and skip the video this cycle.
    FailClosed,
}

impl CheckFailurePolicy {
    pub fn from_skip_flag(skip_on_check_failure: bool) -> Self {
        if skip_on_check_failure {
            CheckFailurePolicy::FailClosed
        } else {
            CheckFailurePolicy::FailOpen
        }
    }
}

/// `true` if a post with exactly `url` was published at or after `cutoff`.
///
/// Posts without a URL or without a readable timestamp never match.
pub fn posted_within(posts: &[RecentPost], url: &str, cutoff: DateTime<Utc>) -> bool {
    posts.iter().any(|post| {
        post.url.as_deref() == Some(url) && post.published.is_some_and(|published| published >= cutoff)
    })
}

/// Start of the duplicate window. A window too large to subtract from `now`
/// falls back to the default number of days.
pub fn window_start(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    Duration::try_days(window_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or_else(|| {
            warn!(
                window_days,
                default = DEFAULT_DUPLICATE_DAYS,
                "check_duplicate_days out of range, using default"
            );
            now - Duration::days(DEFAULT_DUPLICATE_DAYS)
        })
}

/// Ask the destination whether `url` was already posted in the last `window_days` days.
#[instrument(level = "debug", skip(destination, now, policy))]
pub async fn is_url_already_posted<D: Destination>(
    destination: &D,
    url: &str,
    window_days: i64,
    now: DateTime<Utc>,
    policy: CheckFailurePolicy,
) -> bool {
    let cutoff = window_start(now, window_days);
    match destination.recent_posts(RECENT_POST_LIMIT).await {
        Ok(posts) => {
            let found = posted_within(&posts, url, cutoff);
            debug!(scanned = posts.len(), found, "Checked recent posts");
            found
        }
        Err(e) => {
            let assume_posted = policy == CheckFailurePolicy::FailClosed;
            warn!(error = %e, assume_posted, "Could not fetch recent posts for duplicate check");
            assume_posted
        }
    }
}
