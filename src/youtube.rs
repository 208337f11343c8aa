//! YouTube Data API v3 video source.
//!
//! Listing a channel takes three kinds of request:
//! 1. `channels.list` to find the channel's uploads playlist
//! 2. `playlistItems.list`, drained page by page, to find uploads newer than the cutoff
//! 3. `videos.list` per recent upload, for the description and live status
//!
//! The [`VideoSource`] trait is the seam the orchestrator depends on, so it can
//! be driven by an in-memory source in tests.

use crate::error::BotError;
use crate::models::{Channel, Video};
use crate::utils::{base_url, http_client, parse_timestamp};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/";

/// Maximum page size accepted by `playlistItems.list`.
const PAGE_SIZE: &str = "50";

/// Anything that can list a channel's recent videos.
pub trait VideoSource {
    /// Videos of `channel` published at or after `published_after`, in upload order.
    async fn channel_videos(
        &self,
        channel: &Channel,
        published_after: DateTime<Utc>,
    ) -> Result<Vec<Video>, BotError>;
}

/// HTTP client for the YouTube Data API.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    base: Url,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, BotError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(api_key: &str, root: &str, timeout: Duration) -> Result<Self, BotError> {
        Ok(Self {
            http: http_client(timeout)?,
            base: base_url(root)?,
            api_key: api_key.to_string(),
        })
    }

    async fn get<T>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T, BotError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.base.join(endpoint)?;
        let response = self
            .http
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BotError::from_response(response).await);
        }
        Ok(response.json::<T>().await?)
    }

    /// The uploads playlist of a channel, or `None` if the channel does not exist.
    #[instrument(level = "debug", skip(self))]
    pub async fn uploads_playlist(&self, channel_id: &str) -> Result<Option<String>, BotError> {
        let response: ChannelListResponse = self
            .get(
                "youtube/v3/channels",
                &[("part", "contentDetails"), ("id", channel_id)],
            )
            .await?;
        Ok(response
            .items
            .into_iter()
            .next()
            .map(|item| item.content_details.related_playlists.uploads))
    }

    /// IDs and publish times of uploads at or after `published_after`, across all pages.
    #[instrument(level = "debug", skip(self, published_after))]
    pub async fn recent_uploads(
        &self,
        playlist_id: &str,
        published_after: DateTime<Utc>,
    ) -> Result<Vec<(String, DateTime<Utc>)>, BotError> {
        let mut uploads = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params = vec![
                ("part", "snippet,contentDetails"),
                ("playlistId", playlist_id),
                ("maxResults", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let page: PlaylistItemsResponse = self.get("youtube/v3/playlistItems", &params).await?;
            pages += 1;

            for item in page.items {
                let details = item.content_details;
                let Some(published) = details.video_published_at.as_deref().and_then(parse_timestamp)
                else {
                    debug!(video_id = %details.video_id, "Upload has no publish time; skipping");
                    continue;
                };
                if published >= published_after {
                    uploads.push((details.video_id, published));
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(pages, recent = uploads.len(), "Drained playlist");
        Ok(uploads)
    }

    /// Full details for one video, or `None` if it is gone or private.
    #[instrument(level = "debug", skip(self))]
    pub async fn video_details(&self, video_id: &str) -> Result<Option<VideoResource>, BotError> {
        let response: VideoListResponse = self
            .get(
                "youtube/v3/videos",
                &[
                    ("part", "snippet,contentDetails,liveStreamingDetails"),
                    ("id", video_id),
                ],
            )
            .await?;
        Ok(response.items.into_iter().next())
    }
}

impl VideoSource for YouTubeClient {
    #[instrument(level = "info", skip_all, fields(channel = %channel.display_name(), channel_id = %channel.id))]
    async fn channel_videos(
        &self,
        channel: &Channel,
        published_after: DateTime<Utc>,
    ) -> Result<Vec<Video>, BotError> {
        let t0 = Instant::now();
        let Some(playlist) = self.uploads_playlist(&channel.id).await? else {
            warn!("No channel found with this ID");
            return Ok(Vec::new());
        };

        let uploads = self.recent_uploads(&playlist, published_after).await?;
        let mut videos = Vec::with_capacity(uploads.len());
        for (video_id, published_at) in uploads {
            match self.video_details(&video_id).await? {
                Some(resource) => videos.push(resource.into_video(published_at, channel)),
                None => warn!(%video_id, "Video details unavailable; skipping"),
            }
        }

        info!(
            count = videos.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Listed channel videos"
        );
        Ok(videos)
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistItemDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemDetails {
    video_id: String,
    video_published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

/// The parts of a `videos.list` item the bot reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    pub live_streaming_details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    pub live_broadcast_content: String,
}

impl VideoResource {
    /// Live or upcoming broadcast, as opposed to a regular upload or a finished stream.
    pub fn is_live_stream(&self) -> bool {
        self.live_streaming_details.is_some()
            && matches!(self.snippet.live_broadcast_content.as_str(), "live" | "upcoming")
    }

    fn into_video(self, published_at: DateTime<Utc>, channel: &Channel) -> Video {
        let is_live = self.is_live_stream();
        Video {
            id: self.id,
            title: self.snippet.title,
            description: self.snippet.description,
            published_at,
            is_live,
            channel: channel.clone(),
        }
    }
}
