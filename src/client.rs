use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::article::{Article, ArticlesResponse, Source, SourcesResponse};
use crate::config::Config;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} returned {status}")]
    Status { status: StatusCode, url: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Thin client for the news API. Every request carries the `apiKey` parameter.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("NewsReader/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            &config.base_url,
            &config.news_api_key,
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /v1/articles`; an empty source key omits the `source` parameter.
    pub async fn fetch_articles(&self, source_key: &str) -> Result<Vec<Article>, ClientError> {
        let response: ArticlesResponse = self.get_json("/v1/articles", Some(source_key)).await?;
        info!(
            "Fetched {} articles for source '{}'",
            response.articles.len(),
            source_key
        );
        Ok(response.articles)
    }

    pub async fn fetch_sources(&self) -> Result<Vec<Source>, ClientError> {
        let response: SourcesResponse = self.get_json("/v1/sources", None).await?;
        info!("Fetched {} sources", response.sources.len());
        Ok(response.sources)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        source_key: Option<&str>,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);

        let mut params = vec![("apiKey", self.api_key.as_str())];
        if let Some(key) = source_key.filter(|k| !k.is_empty()) {
            params.push(("source", key));
        }

        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| Self::classify(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { status, url });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::classify(e, &url))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn classify(err: reqwest::Error, url: &str) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
            }
        } else {
            ClientError::Http(err)
        }
    }
}
