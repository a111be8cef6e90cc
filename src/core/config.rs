use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default seconds between two nags at an exact multiple of the elapsed time
pub const DEFAULT_NAG_INTERVAL: u64 = 60;
/// Nag interval used while the debug toggle is on
pub const DEFAULT_DEBUG_INTERVAL: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;
pub const DEFAULT_GROWL_PORT: u16 = 23053;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("no feed configured: set [feed] nag or [server] api and token")]
    MissingFeed,
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("no config directory available on this platform")]
    NoConfigDir,
}

/// Where session data comes from, chosen once per config load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
    Calendar { url: url::Url },
    Api { url: url::Url, token: String },
}

impl FeedKind {
    pub fn label(&self) -> &'static str {
        match self {
            FeedKind::Calendar { .. } => "calendar",
            FeedKind::Api { .. } => "api",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowlConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for GrowlConfig {
    fn default() -> Self {
        GrowlConfig {
            host: "localhost".to_string(),
            port: DEFAULT_GROWL_PORT,
            password: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub feed: FeedKind,
    pub development: bool,
    pub nag_interval: Duration,
    pub debug_interval: Duration,
    pub request_timeout: Duration,
    pub growl: GrowlConfig,
    /// File this config was read from, re-read on every reload
    pub source: Option<PathBuf>,
}

// On-disk layout: [feed], [server], [hatarake] and [growl] sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feed: Option<FeedSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    server: Option<ServerSection>,
    #[serde(default)]
    hatarake: HatarakeSection,
    #[serde(default)]
    growl: GrowlSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeedSection {
    nag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    api: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HatarakeSection {
    #[serde(default)]
    development: bool,
    nag_interval: Option<u64>,
    debug_interval: Option<u64>,
    request_timeout: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GrowlSection {
    host: Option<String>,
    port: Option<u16>,
    password: Option<String>,
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        directories::ProjectDirs::from("com", "hatarake", "hatarake")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from an explicit path, or from the default location
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        config.source = Some(path);
        Ok(config)
    }

    /// Re-read the file this config came from
    pub fn reload(&self) -> Result<Self, ConfigError> {
        match &self.source {
            Some(path) => Self::load(Some(path)),
            None => Ok(self.clone()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let feed = match (file.feed.and_then(|f| f.nag), file.server) {
            (Some(nag), _) if !nag.trim().is_empty() => FeedKind::Calendar {
                url: parse_url(&nag)?,
            },
            (
                _,
                Some(ServerSection {
                    api: Some(api),
                    token: Some(token),
                }),
            ) => FeedKind::Api {
                url: parse_url(&api)?,
                token,
            },
            _ => return Err(ConfigError::MissingFeed),
        };

        let hatarake = file.hatarake;
        let defaults = GrowlConfig::default();

        Ok(Config {
            feed,
            development: hatarake.development,
            nag_interval: Duration::from_secs(
                hatarake.nag_interval.unwrap_or(DEFAULT_NAG_INTERVAL),
            ),
            debug_interval: Duration::from_secs(
                hatarake.debug_interval.unwrap_or(DEFAULT_DEBUG_INTERVAL),
            ),
            request_timeout: Duration::from_secs(
                hatarake.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            ),
            growl: GrowlConfig {
                host: file.growl.host.unwrap_or(defaults.host),
                port: file.growl.port.unwrap_or(defaults.port),
                password: file.growl.password.filter(|p| !p.is_empty()),
            },
            source: None,
        })
    }

    /// Render back to TOML with the token and password masked
    pub fn to_redacted_toml(&self) -> anyhow::Result<String> {
        let (feed, server) = match &self.feed {
            FeedKind::Calendar { url } => (
                Some(FeedSection {
                    nag: Some(url.to_string()),
                }),
                None,
            ),
            FeedKind::Api { url, .. } => (
                None,
                Some(ServerSection {
                    api: Some(url.to_string()),
                    token: Some("********".to_string()),
                }),
            ),
        };
        let file = ConfigFile {
            feed,
            server,
            hatarake: HatarakeSection {
                development: self.development,
                nag_interval: Some(self.nag_interval.as_secs()),
                debug_interval: Some(self.debug_interval.as_secs()),
                request_timeout: Some(self.request_timeout.as_secs()),
            },
            growl: GrowlSection {
                host: Some(self.growl.host.clone()),
                port: Some(self.growl.port),
                password: self.growl.password.as_ref().map(|_| "********".to_string()),
            },
        };
        Ok(toml::to_string_pretty(&file)?)
    }
}

fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    url::Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_feed() {
        let config = Config::from_toml(
            r#"
            [feed]
            nag = "https://example.com/pomodoro.ics"

            [hatarake]
            development = true
            "#,
        )
        .unwrap();

        assert_eq!(config.feed.label(), "calendar");
        assert!(config.development);
        assert_eq!(config.nag_interval, Duration::from_secs(DEFAULT_NAG_INTERVAL));
        assert_eq!(config.growl, GrowlConfig::default());
    }

    #[test]
    fn test_api_feed() {
        let config = Config::from_toml(
            r#"
            [server]
            api = "https://tracker.example.com/api/pomodoro"
            token = "abc123"

            [growl]
            host = "10.0.0.2"
            password = "hunter2"
            "#,
        )
        .unwrap();

        match &config.feed {
            FeedKind::Api { url, token } => {
                assert_eq!(url.host_str(), Some("tracker.example.com"));
                assert_eq!(token, "abc123");
            }
            other => panic!("unexpected feed {:?}", other),
        }
        assert!(!config.development);
        assert_eq!(config.growl.host, "10.0.0.2");
        assert_eq!(config.growl.port, DEFAULT_GROWL_PORT);
        assert_eq!(config.growl.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_feed_wins_over_server() {
        let config = Config::from_toml(
            r#"
            [feed]
            nag = "https://example.com/a.ics"
            [server]
            api = "https://example.com/api"
            token = "t"
            "#,
        )
        .unwrap();
        assert_eq!(config.feed.label(), "calendar");
    }

    #[test]
    fn test_missing_feed() {
        let err = Config::from_toml("[hatarake]\ndevelopment = false\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingFeed));

        let err = Config::from_toml("[server]\napi = \"https://example.com\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingFeed));
    }

    #[test]
    fn test_invalid_url() {
        let err = Config::from_toml("[feed]\nnag = \"not a url\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_redacted_output_hides_secrets() {
        let config = Config::from_toml(
            "[server]\napi = \"https://example.com/api\"\ntoken = \"secret-token\"\n",
        )
        .unwrap();
        let rendered = config.to_redacted_toml().unwrap();
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("https://example.com/api"));
    }
}
