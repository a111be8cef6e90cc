pub mod api;
pub mod ical;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::{Config, FeedKind, Session};

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to fetch {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },
    #[error("failed to parse feed: {0}")]
    Parse(String),
    #[error("feed has no completed sessions")]
    Empty,
}

impl FeedError {
    /// Network-level failure, as opposed to bad or empty content
    pub fn is_fetch(&self) -> bool {
        matches!(self, FeedError::Fetch { .. })
    }
}

/// Anything that can produce the most recent session
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn fetch(&self) -> Result<Session, FeedError>;

    /// Pick up a freshly loaded config
    fn reconfigure(&mut self, _config: &Config) -> Result<(), FeedError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    feed: FeedKind,
}

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("Hatarake/", env!("CARGO_PKG_VERSION")))
        .build()
}

impl Fetcher {
    pub fn new(feed: FeedKind, timeout: Duration) -> Result<Self, FeedError> {
        let client = build_client(timeout).map_err(|source| FeedError::Fetch {
            url: String::new(),
            source,
        })?;
        Ok(Self { client, feed })
    }

    pub fn from_config(config: &Config) -> Result<Self, FeedError> {
        Self::new(config.feed.clone(), config.request_timeout)
    }

    pub fn feed(&self) -> &FeedKind {
        &self.feed
    }

    async fn get_text(&self, request: reqwest::RequestBuilder, url: &url::Url) -> Result<String, FeedError> {
        let fetch_err = |source| FeedError::Fetch {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(fetch_err)?;
        tracing::debug!("GET {} -> {}", url, response.status());
        let response = response.error_for_status().map_err(fetch_err)?;
        response.text().await.map_err(fetch_err)
    }

    async fn fetch_calendar(&self, url: &url::Url) -> Result<Session, FeedError> {
        let body = self.get_text(self.client.get(url.clone()), url).await?;
        let components = ical::parse_calendar(&body)?;
        tracing::debug!("Calendar has {} components", components.len());
        ical::select_most_recent(&components)
    }

    async fn fetch_api(&self, url: &url::Url, token: &str) -> Result<Session, FeedError> {
        let request = self
            .client
            .get(url.clone())
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", token))
            .query(&api::LATEST_QUERY);
        let body = self.get_text(request, url).await?;
        api::session_from_body(&body)
    }
}

#[async_trait]
impl SessionSource for Fetcher {
    async fn fetch(&self) -> Result<Session, FeedError> {
        let session = match &self.feed {
            FeedKind::Calendar { url } => self.fetch_calendar(url).await?,
            FeedKind::Api { url, token } => self.fetch_api(url, token).await?,
        };
        tracing::info!(
            "Last pomodoro from {} feed: [{}] ended {}",
            self.feed.label(),
            session.name,
            session.end
        );
        Ok(session)
    }

    fn reconfigure(&mut self, config: &Config) -> Result<(), FeedError> {
        *self = Self::from_config(config)?;
        Ok(())
    }
}
