use std::time::Duration;

use reqwest::Client;

use crate::catalog::{CatalogEntry, CatalogResponse, ModelSource};
use crate::error::{OrcError, Result};

pub const OPENROUTER_API: &str = "https://openrouter.ai/api/v1";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";

pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterClient {
    /// Build a client from an explicit key, or `$OPENROUTER_API_KEY` when `None`.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(api_key, std::env::var(API_KEY_ENV).ok())?;
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| OPENROUTER_API.to_string());
        Ok(Self {
            http: Client::builder().timeout(Duration::from_secs(15)).build()?,
            api_key,
            base_url,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List every model in the catalog.
    pub async fn fetch_models(&self) -> Result<Vec<CatalogEntry>> {
        let url = format!("{}/models", self.base_url);
        tracing::debug!(%url, "listing models");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(OrcError::Api { status, body });
        }
        let body: CatalogResponse = resp.json().await?;
        tracing::debug!(count = body.data.len(), "catalog received");
        Ok(body.data)
    }
}

impl ModelSource for OpenRouterClient {
    async fn list_models(&self) -> Result<Vec<CatalogEntry>> {
        self.fetch_models().await
    }
}

impl From<reqwest::Error> for OrcError {
    fn from(e: reqwest::Error) -> Self {
        OrcError::Http(Box::new(e))
    }
}

/// Explicit key wins over the environment; blank values count as missing.
pub fn resolve_api_key(explicit: Option<String>, env: Option<String>) -> Result<String> {
    let usable = |k: Option<String>| k.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
    usable(explicit)
        .or_else(|| usable(env))
        .ok_or(OrcError::NoApiKey)
}
