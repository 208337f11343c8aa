//! Orchestrator: fetch → filter → publish.
//!
//! A cycle fetches every configured channel in order, scores the videos,
//! and publishes the ones that pass, one at a time. In continuous mode the
//! next cycle starts once the check interval has elapsed since the previous
//! cycle finished; a failing cycle is logged and never ends the loop.

use crate::config::{BotConfig, RunMode, DEFAULT_CHECK_INTERVAL_MINUTES, DEFAULT_LOOKBACK_HOURS};
use crate::dedupe::CheckFailurePolicy;
use crate::error::BotError;
use crate::filter::VideoFilter;
use crate::lemmy::{Destination, LemmyCommunity};
use crate::models::{Channel, Video};
use crate::publisher::{PublishOutcome, Publisher};
use crate::youtube::{VideoSource, YouTubeClient};
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use std::time::{Duration as StdDuration, Instant};
use tracing::{error, info, instrument, warn};

/// How often the continuous loop checks whether the next cycle is due.
const POLL_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub passed: usize,
    /// IDs of the posts created this cycle.
    pub posted: Vec<i64>,
    pub duplicates: usize,
    pub failed: usize,
}

/// The bot. `source` or `destination` is `None` when its credentials were
/// missing or rejected; cycles then refuse to run.
pub struct Bot<S, D> {
    source: Option<S>,
    destination: Option<D>,
    channels: Vec<Channel>,
    filter: VideoFilter,
    publisher: Publisher,
    lookback: Duration,
    check_interval: StdDuration,
}

impl<S: VideoSource, D: Destination> Bot<S, D> {
    pub fn new(config: BotConfig, source: Option<S>, destination: Option<D>) -> Self {
        let BotConfig {
            settings,
            channels,
            keywords,
        } = config;
        Self {
            source,
            destination,
            channels,
            filter: VideoFilter::new(keywords, settings.scoring.clone()),
            publisher: Publisher::new(
                settings.lemmy.check_duplicate_days,
                CheckFailurePolicy::from_skip_flag(settings.lemmy.skip_on_check_failure),
            ),
            lookback: lookback_window(settings.youtube.lookback_hours),
            check_interval: check_interval(settings.youtube.check_interval_minutes),
        }
    }

    #[cfg(test)]
    pub fn with_check_interval(mut self, interval: StdDuration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Videos published after this instant are considered new.
    pub fn lookback_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.lookback).unwrap_or_else(|| {
            warn!(
                lookback_hours = self.lookback.num_hours(),
                "Lookback reaches before the earliest representable time, using default"
            );
            now - Duration::hours(DEFAULT_LOOKBACK_HOURS)
        })
    }

    /// When the cycle after one finishing now is due.
    fn next_run(&self) -> tokio::time::Instant {
        let now = tokio::time::Instant::now();
        now.checked_add(self.check_interval).unwrap_or_else(|| {
            warn!(
                interval_secs = self.check_interval.as_secs(),
                "check_interval_minutes out of range, using default"
            );
            now + StdDuration::from_secs(DEFAULT_CHECK_INTERVAL_MINUTES * 60)
        })
    }

    #[instrument(level = "info", skip_all, fields(channel = %channel.display_name()))]
    async fn fetch_channel_videos(&self, source: &S, channel: &Channel, cutoff: DateTime<Utc>) -> Vec<Video> {
        if channel.id.is_empty() {
            error!("Channel ID not found for channel");
            return Vec::new();
        }
        info!(channel_id = %channel.id, "Fetching videos for channel");
        match source.channel_videos(channel, cutoff).await {
            Ok(videos) => {
                info!(count = videos.len(), since = %cutoff, "Found videos for channel");
                videos
            }
            Err(e) => {
                error!(channel_id = %channel.id, error = %e, "Failed to fetch channel videos");
                Vec::new()
            }
        }
    }

    /// Run one fetch → filter → publish pass.
    #[instrument(level = "info", skip_all)]
    pub async fn run_cycle(&self) -> Result<CycleReport, BotError> {
        let (Some(source), Some(destination)) = (self.source.as_ref(), self.destination.as_ref()) else {
            return Err(BotError::NotConfigured(
                "bot not fully initialized; check YouTube and Lemmy configuration".to_string(),
            ));
        };

        let t0 = Instant::now();
        info!("Starting video processing");
        let now = Utc::now();
        let cutoff = self.lookback_time(now);

        let videos: Vec<Video> = stream::iter(&self.channels)
            .then(|channel| self.fetch_channel_videos(source, channel, cutoff))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();
        info!(count = videos.len(), "Fetched videos in total");

        let passed = self.filter.filter(&videos);
        info!(count = passed.len(), threshold = self.filter.threshold(), "Videos passed filtering");

        let mut report = CycleReport {
            fetched: videos.len(),
            passed: passed.len(),
            ..CycleReport::default()
        };
        for scored in &passed {
            match self.publisher.publish(destination, scored, now).await {
                PublishOutcome::Posted { post_id } => report.posted.push(post_id),
                PublishOutcome::Duplicate => report.duplicates += 1,
                PublishOutcome::Failed => report.failed += 1,
            }
        }

        info!(
            posted = report.posted.len(),
            duplicates = report.duplicates,
            failed = report.failed,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Cycle complete"
        );
        Ok(report)
    }

    /// Run a cycle and log, rather than return, any error.
    async fn run_cycle_logged(&self) -> Option<CycleReport> {
        match self.run_cycle().await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "Cycle failed");
                None
            }
        }
    }

    pub async fn run_once(&self) -> Option<CycleReport> {
        info!("Running bot in single run mode");
        self.run_cycle_logged().await
    }

    /// Run a cycle now and then forever at the check interval.
    pub async fn run_continuously(&self) {
        info!(
            interval_minutes = self.check_interval.as_secs() / 60,
            "Running bot in continuous mode"
        );
        loop {
            self.run_cycle_logged().await;

            let next_run = self.next_run();
            while tokio::time::Instant::now() < next_run {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }

    pub async fn run(&self, mode: RunMode) {
        match mode {
            RunMode::Single => {
                self.run_once().await;
            }
            RunMode::Continuous => self.run_continuously().await,
        }
    }
}

fn lookback_window(hours: i64) -> Duration {
    Duration::try_hours(hours).unwrap_or_else(|| {
        warn!(hours, default = DEFAULT_LOOKBACK_HOURS, "lookback_hours out of range, using default");
        Duration::hours(DEFAULT_LOOKBACK_HOURS)
    })
}

fn check_interval(minutes: u64) -> StdDuration {
    minutes
        .checked_mul(60)
        .map(StdDuration::from_secs)
        .unwrap_or_else(|| {
            warn!(
                minutes,
                default = DEFAULT_CHECK_INTERVAL_MINUTES,
                "check_interval_minutes out of range, using default"
            );
            StdDuration::from_secs(DEFAULT_CHECK_INTERVAL_MINUTES * 60)
        })
}

impl Bot<YouTubeClient, LemmyCommunity> {
    /// Build the bot against the real APIs.
    ///
    /// Missing or placeholder credentials, a rejected login, or an unknown
    /// community leave the corresponding side empty; the error is logged here
    /// and every cycle will refuse to run.
    pub async fn connect(config: BotConfig) -> Self {
        let timeout = config.settings.operation.request_timeout();
        let source = match config.settings.youtube.api_key() {
            None => {
                error!("YouTube API key not configured");
                None
            }
            Some(key) => match YouTubeClient::new(key, timeout) {
                Ok(client) => Some(client),
                Err(e) => {
                    error!(error = %e, "Failed to create YouTube client");
                    None
                }
            },
        };

        let destination = match config.settings.lemmy.credentials() {
            None => {
                error!("Lemmy credentials not configured");
                None
            }
            Some(creds) => {
                match LemmyCommunity::connect(
                    &creds.instance_url,
                    &creds.username,
                    &creds.password,
                    &creds.community,
                    timeout,
                )
                .await
                {
                    Ok(community) => {
                        info!(community_id = community.id(), "Lemmy destination ready");
                        Some(community)
                    }
                    Err(e) => {
                        error!(
                            instance = %creds.instance_url,
                            community = %creds.community,
                            error = %e,
                            "Failed to connect to Lemmy community"
                        );
                        None
                    }
                }
            }
        };

        if config.channels.is_empty() {
            warn!("No channels configured");
        }
        Self::new(config, source, destination)
    }
}
