//! Configuration loading.
//!
//! The config directory holds three files:
//!
//! ```text
//! config/
//! ├── config.yaml     # settings: credentials, intervals, scoring, mode
//! ├── channels.json   # [{ "channelID", "name", "primary_series_tag"? }]
//! └── keywords.json   # { auto_reject, negative_keywords, top_keywords, other_keywords }
//! ```
//!
//! Nothing here is fatal. A missing or malformed file is logged and replaced
//! by defaults (settings) or an empty collection (channels, keywords).
//! Credentials can be overridden from the environment, see
//! [`Settings::apply_env_overrides`].

use crate::models::{Channel, KeywordSet};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const SETTINGS_FILE: &str = "config.yaml";
pub const CHANNELS_FILE: &str = "channels.json";
pub const KEYWORDS_FILE: &str = "keywords.json";

pub const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 60;
pub const DEFAULT_LOOKBACK_HOURS: i64 = 24;
pub const DEFAULT_DUPLICATE_DAYS: i64 = 7;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

const PLACEHOLDER_API_KEY: &str = "YOUR_YOUTUBE_API_KEY";
const PLACEHOLDER_INSTANCE: &str = "https://lemmy.example.com";
const PLACEHOLDER_USERNAME: &str = "YOUR_USERNAME";
const PLACEHOLDER_PASSWORD: &str = "YOUR_PASSWORD";
const PLACEHOLDER_COMMUNITY: &str = "YOUR_COMMUNITY";

/// Top-level `config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub youtube: YoutubeSettings,
    pub lemmy: LemmySettings,
    pub scoring: ScoringConfig,
    pub operation: OperationSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct YoutubeSettings {
    pub api_key: String,
    pub check_interval_minutes: u64,
    pub lookback_hours: i64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
        }
    }
}

impl YoutubeSettings {
    /// The API key, unless it is empty or still the sample placeholder.
    pub fn api_key(&self) -> Option<&str> {
        configured(&self.api_key, PLACEHOLDER_API_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LemmySettings {
    pub instance_url: String,
    pub username: String,
    pub password: String,
    pub community: String,
    pub check_duplicate_days: i64,
    /// Treat a failed recent-posts fetch as "already posted" instead of "not posted".
    pub skip_on_check_failure: bool,
}

impl Default for LemmySettings {
    fn default() -> Self {
        Self {
            instance_url: String::new(),
            username: String::new(),
            password: String::new(),
            community: String::new(),
            check_duplicate_days: DEFAULT_DUPLICATE_DAYS,
            skip_on_check_failure: false,
        }
    }
}

/// Lemmy login details, present only when every field is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmyCredentials {
    pub instance_url: String,
    pub username: String,
    pub password: String,
    pub community: String,
}

impl LemmySettings {
    pub fn credentials(&self) -> Option<LemmyCredentials> {
        Some(LemmyCredentials {
            instance_url: configured(&self.instance_url, PLACEHOLDER_INSTANCE)?.to_string(),
            username: configured(&self.username, PLACEHOLDER_USERNAME)?.to_string(),
            password: configured(&self.password, PLACEHOLDER_PASSWORD)?.to_string(),
            community: configured(&self.community, PLACEHOLDER_COMMUNITY)?.to_string(),
        })
    }
}

/// Point values per keyword tier and the pass threshold.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub top_keyword_points: i64,
    pub other_keyword_points: i64,
    /// Added once per matched negative keyword; normally below zero.
    pub negative_keyword_points: i64,
    pub threshold: i64,
    pub auto_reject: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            top_keyword_points: 25,
            other_keyword_points: 5,
            negative_keyword_points: -15,
            threshold: 25,
            auto_reject: true,
        }
    }
}

/// How the orchestrator schedules cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Single,
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OperationSettings {
    /// `continuous` or `single_run`; any other value means a single run.
    pub mode: String,
    pub log_level: String,
    /// Per-request limit for YouTube and Lemmy calls.
    pub request_timeout_seconds: u64,
}

impl Default for OperationSettings {
    fn default() -> Self {
        Self {
            mode: "single_run".to_string(),
            log_level: "INFO".to_string(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl OperationSettings {
    pub fn run_mode(&self) -> RunMode {
        if self.mode.trim().eq_ignore_ascii_case("continuous") {
            RunMode::Continuous
        } else {
            RunMode::Single
        }
    }

    /// The configured request timeout; zero falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_seconds == 0 {
            warn!(
                default = DEFAULT_REQUEST_TIMEOUT_SECONDS,
                "request_timeout_seconds must be positive, using default"
            );
            return Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS);
        }
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Settings {
    /// Override credentials from the environment.
    ///
    /// Recognised variables: `YOUTUBE_API_KEY`, `LEMMY_INSTANCE_URL`,
    /// `LEMMY_USERNAME`, `LEMMY_PASSWORD`, `LEMMY_COMMUNITY`. Empty values are
    /// ignored. `lookup` is normally `|k| std::env::var(k).ok()`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut String); 5] = [
            ("YOUTUBE_API_KEY", &mut self.youtube.api_key),
            ("LEMMY_INSTANCE_URL", &mut self.lemmy.instance_url),
            ("LEMMY_USERNAME", &mut self.lemmy.username),
            ("LEMMY_PASSWORD", &mut self.lemmy.password),
            ("LEMMY_COMMUNITY", &mut self.lemmy.community),
        ];
        for (var, slot) in targets {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                info!(var, "Using value from environment");
                *slot = value;
            }
        }
    }
}

fn configured<'a>(value: &'a str, placeholder: &str) -> Option<&'a str> {
    let value = value.trim();
    if value.is_empty() || value == placeholder {
        None
    } else {
        Some(value)
    }
}

/// Read and parse `config.yaml`, surfacing any error to the caller.
///
/// Used before logging is up so the configured log level can be honoured;
/// the caller reports the error once the subscriber exists.
pub fn read_settings(config_dir: &Path) -> Result<Settings, Box<dyn Error>> {
    let path = config_dir.join(SETTINGS_FILE);
    let raw = fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let settings: Settings = serde_yaml::from_str(&raw)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    Ok(settings)
}

/// Load `channels.json`, or an empty list if it is missing or malformed.
#[instrument(level = "info", skip_all, fields(dir = %config_dir.display()))]
pub fn load_channels(config_dir: &Path) -> Vec<Channel> {
    match read_json::<Vec<Channel>>(&config_dir.join(CHANNELS_FILE)) {
        Ok(channels) => {
            info!(count = channels.len(), "Loaded channels");
            channels
        }
        Err(e) => {
            warn!(error = %e, "Failed to load channels; continuing with none");
            Vec::new()
        }
    }
}

/// Load `keywords.json`, or empty tiers if it is missing or malformed.
#[instrument(level = "info", skip_all, fields(dir = %config_dir.display()))]
pub fn load_keywords(config_dir: &Path) -> KeywordSet {
    match read_json::<KeywordSet>(&config_dir.join(KEYWORDS_FILE)) {
        Ok(keywords) => {
            if keywords.is_empty() {
                warn!("Keyword file has no keywords; every video will score 0");
            }
            info!(
                auto_reject = keywords.auto_reject.len(),
                negative = keywords.negative.len(),
                top = keywords.top.len(),
                other = keywords.other.len(),
                "Loaded keywords"
            );
            keywords
        }
        Err(e) => {
            warn!(error = %e, "Failed to load keywords; continuing with empty lists");
            KeywordSet::default()
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let raw = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&raw).map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    Ok(value)
}

/// Everything the bot needs from disk and the environment.
#[derive(Debug, Clone, Default)]
pub struct BotConfig {
    pub settings: Settings,
    pub channels: Vec<Channel>,
    pub keywords: KeywordSet,
}

impl BotConfig {
    /// Assemble the full configuration from already-read settings plus the two JSON files.
    pub fn assemble<F>(settings: Settings, config_dir: &Path, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = settings;
        settings.apply_env_overrides(env);
        Self {
            settings,
            channels: load_channels(config_dir),
            keywords: load_keywords(config_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const SAMPLE_YAML: &str = r#"
youtube:
  api_key: "abc123"
  check_interval_minutes: 15
  lookback_hours: 48
lemmy:
  instance_url: "https://lemmy.world"
  username: "bot"
  password: "hunter2"
  community: "motorsport"
  check_duplicate_days: 3
scoring:
  threshold: 30
  auto_reject: false
operation:
  mode: continuous
  log_level: DEBUG
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_read_settings_full() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), SAMPLE_YAML).unwrap();

        let settings = read_settings(dir.path()).unwrap();
        assert_eq!(settings.youtube.api_key(), Some("abc123"));
        assert_eq!(settings.youtube.check_interval_minutes, 15);
        assert_eq!(settings.youtube.lookback_hours, 48);
        assert_eq!(settings.lemmy.check_duplicate_days, 3);
        assert!(!settings.lemmy.skip_on_check_failure);
        assert_eq!(settings.scoring.threshold, 30);
        assert!(!settings.scoring.auto_reject);
        // Unspecified scoring values keep their defaults.
        assert_eq!(settings.scoring.top_keyword_points, 25);
        assert_eq!(settings.scoring.negative_keyword_points, -15);
        assert_eq!(settings.operation.run_mode(), RunMode::Continuous);
        assert_eq!(settings.operation.log_level, "DEBUG");
    }

    #[test]
    fn test_read_settings_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_settings(dir.path()).is_err());
    }

    #[test]
    fn test_read_settings_malformed_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "youtube: [unclosed").unwrap();
        assert!(read_settings(dir.path()).is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.youtube.check_interval_minutes, 60);
        assert_eq!(settings.youtube.lookback_hours, 24);
        assert_eq!(settings.lemmy.check_duplicate_days, 7);
        assert_eq!(settings.scoring, ScoringConfig::default());
        assert_eq!(settings.operation.run_mode(), RunMode::Single);
        assert!(settings.youtube.api_key().is_none());
        assert!(settings.lemmy.credentials().is_none());
    }

    #[test]
    fn test_unknown_mode_is_single() {
        let op = OperationSettings {
            mode: "whenever".to_string(),
            log_level: "INFO".to_string(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        };
        assert_eq!(op.run_mode(), RunMode::Single);
    }

    #[test]
    fn test_request_timeout() {
        let mut op = OperationSettings::default();
        assert_eq!(op.request_timeout(), Duration::from_secs(30));

        op.request_timeout_seconds = 5;
        assert_eq!(op.request_timeout(), Duration::from_secs(5));

        op.request_timeout_seconds = 0;
        assert_eq!(op.request_timeout(), Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS));
    }

    #[test]
    fn test_placeholders_count_as_unconfigured() {
        let mut settings = Settings::default();
        settings.youtube.api_key = "YOUR_YOUTUBE_API_KEY".to_string();
        settings.lemmy = LemmySettings {
            instance_url: "https://lemmy.example.com".to_string(),
            username: "bot".to_string(),
            password: "pw".to_string(),
            community: "c".to_string(),
            ..LemmySettings::default()
        };
        assert!(settings.youtube.api_key().is_none());
        assert!(settings.lemmy.credentials().is_none());

        settings.lemmy.instance_url = "https://lemmy.world".to_string();
        settings.lemmy.community = "YOUR_COMMUNITY".to_string();
        assert!(settings.lemmy.credentials().is_none());

        settings.lemmy.community = "motorsport".to_string();
        let creds = settings.lemmy.credentials().unwrap();
        assert_eq!(creds.instance_url, "https://lemmy.world");
        assert_eq!(creds.community, "motorsport");
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("YOUTUBE_API_KEY", "from-env"),
            ("LEMMY_PASSWORD", "env-secret"),
            ("LEMMY_USERNAME", "   "),
        ]);
        let mut settings = Settings::default();
        settings.youtube.api_key = "from-file".to_string();
        settings.lemmy.username = "file-user".to_string();

        settings.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.youtube.api_key, "from-env");
        assert_eq!(settings.lemmy.password, "env-secret");
        // Blank environment values do not clobber the file.
        assert_eq!(settings.lemmy.username, "file-user");
    }

    #[test]
    fn test_load_channels_and_keywords() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CHANNELS_FILE),
            r#"[{"channelID": "UC1", "name": "One", "primary_series_tag": "F1"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(KEYWORDS_FILE),
            r#"{"top_keywords": ["race"], "other_keywords": ["review"]}"#,
        )
        .unwrap();

        let channels = load_channels(dir.path());
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].tag(), Some("F1"));

        let keywords = load_keywords(dir.path());
        assert_eq!(keywords.top, vec!["race"]);
        assert_eq!(keywords.other, vec!["review"]);
        assert!(keywords.auto_reject.is_empty());
    }

    #[test]
    fn test_missing_or_malformed_json_falls_back_to_empty() {
        let dir = tempdir().unwrap();
        assert!(load_channels(dir.path()).is_empty());
        assert!(load_keywords(dir.path()).is_empty());

        fs::write(dir.path().join(CHANNELS_FILE), "{ not json").unwrap();
        fs::write(dir.path().join(KEYWORDS_FILE), "[1, 2, 3]").unwrap();
        assert!(load_channels(dir.path()).is_empty());
        assert!(load_keywords(dir.path()).is_empty());
    }

    #[test]
    fn test_assemble_applies_env() {
        let dir = tempdir().unwrap();
        let config = BotConfig::assemble(Settings::default(), dir.path(), |k| {
            (k == "LEMMY_COMMUNITY").then(|| "racing".to_string())
        });
        assert_eq!(config.settings.lemmy.community, "racing");
        assert!(config.channels.is_empty());

        let untouched = BotConfig::assemble(Settings::default(), dir.path(), no_env);
        assert_eq!(untouched.settings, Settings::default());
    }
}
