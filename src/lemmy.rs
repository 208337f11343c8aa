//! Lemmy API v3 destination.
//!
//! [`LemmyClient`] holds the HTTP session (base URL and JWT). Once a community
//! has been resolved it is wrapped in a [`LemmyCommunity`], which implements
//! [`Destination`], the seam the publisher and duplicate check depend on.

use crate::error::BotError;
use crate::models::RecentPost;
use crate::utils::{base_url, http_client, parse_timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// A post ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub url: String,
    pub body: String,
}

/// Where qualifying videos are posted.
pub trait Destination {
    /// The newest `limit` posts, newest first.
    async fn recent_posts(&self, limit: usize) -> Result<Vec<RecentPost>, BotError>;

    /// Submit one post. Returns the new post's ID.
    async fn create_post(&self, post: &NewPost) -> Result<i64, BotError>;
}

/// Authenticated session against one Lemmy instance.
#[derive(Debug, Clone)]
pub struct LemmyClient {
    http: reqwest::Client,
    base: Url,
    jwt: Option<String>,
}

impl LemmyClient {
    pub fn new(instance_url: &str, timeout: Duration) -> Result<Self, BotError> {
        Ok(Self {
            http: http_client(timeout)?,
            base: base_url(instance_url)?,
            jwt: None,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, BotError> {
        let jwt = self.jwt.as_deref().ok_or(BotError::NotAuthenticated)?;
        Ok(request.bearer_auth(jwt))
    }

    async fn read_json<T>(response: reqwest::Response) -> Result<T, BotError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if !response.status().is_success() {
            return Err(BotError::from_response(response).await);
        }
        Ok(response.json::<T>().await?)
    }

    /// Log in and keep the returned JWT for subsequent calls.
    #[instrument(level = "info", skip(self, password), fields(instance = %self.base))]
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), BotError> {
        let response = self
            .http
            .post(self.base.join("api/v3/user/login")?)
            .json(&LoginRequest {
                username_or_email: username,
                password,
            })
            .send()
            .await?;
        let body: LoginResponse = Self::read_json(response).await?;
        let jwt = body.jwt.filter(|t| !t.is_empty()).ok_or(BotError::NotAuthenticated)?;
        self.jwt = Some(jwt);
        info!("Logged in to Lemmy");
        Ok(())
    }

    /// Look up a community's numeric ID by name (case-insensitive).
    #[instrument(level = "info", skip(self))]
    pub async fn community_id(&self, name: &str) -> Result<i64, BotError> {
        let request = self
            .http
            .get(self.base.join("api/v3/community")?)
            .query(&[("name", name)]);
        let response = self.authorize(request)?.send().await?;
        let body: CommunityResponse = Self::read_json(response).await?;
        let community = body.community_view.community;
        if community.name.eq_ignore_ascii_case(name) {
            info!(community_id = community.id, "Resolved community");
            Ok(community.id)
        } else {
            Err(BotError::NotFound(format!("community '{name}'")))
        }
    }

    #[instrument(level = "info", skip(self, post), fields(title = %post.title, url = %post.url))]
    pub async fn create_post(&self, community_id: i64, post: &NewPost) -> Result<i64, BotError> {
        let request = self.http.post(self.base.join("api/v3/post")?).json(&CreatePostRequest {
            name: &post.title,
            community_id,
            url: &post.url,
            body: &post.body,
        });
        let response = self.authorize(request)?.send().await?;
        let body: PostResponse = Self::read_json(response).await?;
        Ok(body.post_view.post.id)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn recent_posts(&self, community_id: i64, limit: usize) -> Result<Vec<RecentPost>, BotError> {
        let community_id = community_id.to_string();
        let limit = limit.to_string();
        let request = self.http.get(self.base.join("api/v3/post/list")?).query(&[
            ("community_id", community_id.as_str()),
            ("limit", limit.as_str()),
            ("sort", "New"),
        ]);
        let response = self.authorize(request)?.send().await?;
        let body: PostListResponse = Self::read_json(response).await?;
        Ok(body
            .posts
            .into_iter()
            .map(|view| RecentPost {
                url: view.post.url,
                published: view.post.published.as_deref().and_then(parse_timestamp),
            })
            .collect())
    }
}

/// A resolved community on a logged-in instance.
#[derive(Debug, Clone)]
pub struct LemmyCommunity {
    client: LemmyClient,
    id: i64,
}

impl LemmyCommunity {
    /// Log in and resolve `community` in one go.
    pub async fn connect(
        instance_url: &str,
        username: &str,
        password: &str,
        community: &str,
        timeout: Duration,
    ) -> Result<Self, BotError> {
        let mut client = LemmyClient::new(instance_url, timeout)?;
        client.login(username, password).await?;
        let id = client.community_id(community).await?;
        Ok(Self { client, id })
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

impl Destination for LemmyCommunity {
    async fn recent_posts(&self, limit: usize) -> Result<Vec<RecentPost>, BotError> {
        self.client.recent_posts(self.id, limit).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<i64, BotError> {
        self.client.create_post(self.id, post).await
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username_or_email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    jwt: Option<String>,
}

#[derive(Deserialize)]
struct CommunityResponse {
    community_view: CommunityView,
}

#[derive(Deserialize)]
struct CommunityView {
    community: CommunityInfo,
}

#[derive(Deserialize)]
struct CommunityInfo {
    id: i64,
    name: String,
}

#[derive(Serialize)]
struct CreatePostRequest<'a> {
    name: &'a str,
    community_id: i64,
    url: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct PostResponse {
    post_view: PostView,
}

#[derive(Deserialize)]
struct PostView {
    post: PostInfo,
}

#[derive(Deserialize)]
struct PostInfo {
    id: i64,
}

#[derive(Deserialize)]
struct PostListResponse {
    #[serde(default)]
    posts: Vec<PostListView>,
}

#[derive(Deserialize)]
struct PostListView {
    post: PostListInfo,
}

#[derive(Deserialize)]
struct PostListInfo {
    url: Option<String>,
    published: Option<String>,
}
