use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::domain::Game;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Base configuration for the remote catalog service. Constructed once at
/// startup and handed to [`HttpCatalog::new`]; tests swap the whole client
/// out through the [`CatalogService`] trait instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog base url is invalid: {0}")]
    BadBaseUrl(#[from] url::ParseError),
}

/// The remote board-game catalog. Two lookups: does a user exist, and what
/// does that user own.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn user_exists(&self, username: &str) -> Result<bool, CatalogError>;

    /// The user's owned, non-expansion collection. Fetched fresh on every
    /// call; nothing is cached.
    async fn owned_collection(&self, username: &str) -> Result<Vec<Game>, CatalogError>;
}

pub struct HttpCatalog {
    http: Client,
    base_url: Url,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        // Url::join treats a base without a trailing slash as a file and
        // would drop its last path segment.
        let mut raw = config.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl CatalogService for HttpCatalog {
    async fn user_exists(&self, username: &str) -> Result<bool, CatalogError> {
        let url = self.endpoint(&format!("users/{username}"))?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status()?;
        Ok(true)
    }

    async fn owned_collection(&self, username: &str) -> Result<Vec<Game>, CatalogError> {
        let mut url = self.endpoint(&format!("collections/{username}"))?;
        url.query_pairs_mut()
            .append_pair("own", "1")
            .append_pair("exclude_subtype", "expansion");
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: CollectionResponse = response.json().await?;
        debug!(username, items = body.items.len(), "fetched collection");
        Ok(body.items.into_iter().map(Game::from).collect())
    }
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    items: Vec<CollectionItem>,
}

/// Wire shape of one collection item. The service omits player counts and
/// playing time for some entries, so everything but the name is optional.
#[derive(Debug, Deserialize)]
struct CollectionItem {
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    min_players: Option<u32>,
    #[serde(default)]
    max_players: Option<u32>,
    #[serde(default)]
    playing_time: Option<u32>,
}

impl From<CollectionItem> for Game {
    fn from(item: CollectionItem) -> Self {
        Game {
            name: item.name,
            image: item.image,
            min_players: item.min_players,
            max_players: item.max_players,
            playing_time: item.playing_time,
        }
    }
}
