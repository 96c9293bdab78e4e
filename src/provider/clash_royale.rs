//! Clash Royale API client

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{GameDataProvider, RawBattle, RawCard, RawCardList, RawPlayer};
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::models::normalize_tag;

/// Provider implementation backed by the official Clash Royale API
pub struct ClashRoyaleClient {
    client: Client,
    base_url: String,
}

impl ClashRoyaleClient {
    /// Create a client authenticated with the configured API key
    ///
    /// # Errors
    /// * `Error::Configuration` if the key is blank or the HTTP client cannot be built
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::configuration("Clash Royale API key is required"));
        }

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .map_err(|e| Error::configuration(format!("API key is not a valid header value: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL-safe form of a player tag, e.g. `%23ABC123`
    pub fn format_player_tag(tag: &str) -> Result<String> {
        let tag = normalize_tag(tag)?;
        Ok(urlencoding::encode(&tag).into_owned())
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, what: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(classify_transport)?;

        if let Some(err) = classify_status(response.status(), what) {
            warn!("Request to {} failed: {}", endpoint, err);
            return Err(err);
        }

        response.json::<T>().await.map_err(classify_transport)
    }
}

#[async_trait]
impl GameDataProvider for ClashRoyaleClient {
    async fn get_player(&self, tag: &str) -> Result<RawPlayer> {
        let endpoint = format!("/players/{}", Self::format_player_tag(tag)?);
        self.get_json(&endpoint, &format!("player {tag}")).await
    }

    async fn get_player_battles(&self, tag: &str) -> Result<Vec<RawBattle>> {
        let endpoint = format!("/players/{}/battlelog", Self::format_player_tag(tag)?);
        self.get_json(&endpoint, &format!("battle log for {tag}")).await
    }

    async fn get_cards(&self) -> Result<Vec<RawCard>> {
        let list: RawCardList = self.get_json("/cards", "card list").await?;
        Ok(list.items)
    }
}

/// Maps a non-success status onto the error taxonomy
fn classify_status(status: StatusCode, what: &str) -> Option<Error> {
    if status.is_success() {
        return None;
    }

    let err = match status {
        StatusCode::NOT_FOUND => Error::not_found(what),
        StatusCode::TOO_MANY_REQUESTS => Error::transient("API rate limit exceeded"),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            Error::transient(format!("API request timed out ({status})"))
        }
        s if s.is_server_error() => Error::transient(format!("Clash Royale API server error ({s})")),
        StatusCode::FORBIDDEN => Error::Provider {
            status: Some(status.as_u16()),
            message: "Invalid API key or access forbidden".to_string(),
        },
        s => Error::Provider {
            status: Some(s.as_u16()),
            message: format!("API request failed with status {s}"),
        },
    };

    Some(err)
}

fn classify_transport(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::transient("API request timed out")
    } else if err.is_connect() {
        Error::transient(format!("Failed to connect to Clash Royale API: {err}"))
    } else if err.is_decode() || err.is_builder() {
        Error::Provider {
            status: err.status().map(|s| s.as_u16()),
            message: format!("Unusable API response: {err}"),
        }
    } else {
        Error::transient(format!("API request failed: {err}"))
    }
}
