//! Pollinations image generation provider.
//!
//! Images are produced by a single `GET /image/{prompt}` call; every option
//! travels in the query string and the response body is the raw image.

use crate::error::{parse_retry_after, sanitize_error_message, Result, VibranceError};
use crate::generation::provider::ImageProvider;
use crate::generation::types::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProviderKind,
};
use async_trait::async_trait;
use reqwest::Url;
use std::time::{Duration, Instant};

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://gen.pollinations.ai";

const API_KEY_ENV: &str = "POLLINATIONS_API_KEY";
const BASE_URL_ENV: &str = "POLLINATIONS_BASE_URL";

/// Builder for PollinationsProvider.
#[derive(Debug, Clone)]
pub struct PollinationsProviderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
}

impl Default for PollinationsProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl PollinationsProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `POLLINATIONS_API_KEY`; anonymous if neither is set.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the service URL. Falls back to `POLLINATIONS_BASE_URL`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the provider, resolving environment fallbacks.
    pub fn build(self) -> Result<PollinationsProvider> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        let base_url = self
            .base_url
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|e| VibranceError::InvalidRequest(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(VibranceError::InvalidRequest(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }

        if api_key.is_none() {
            tracing::debug!("no {API_KEY_ENV} configured, using anonymous access");
        }

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(PollinationsProvider {
            client,
            api_key,
            base_url,
            timeout: self.timeout,
        })
    }
}

/// Pollinations image generation provider.
pub struct PollinationsProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: Url,
    timeout: Duration,
}

impl PollinationsProvider {
    /// Creates a new `PollinationsProviderBuilder`.
    pub fn builder() -> PollinationsProviderBuilder {
        PollinationsProviderBuilder::new()
    }

    /// Builds the full request URL for `request`.
    pub fn request_url(&self, request: &GenerationRequest) -> Url {
        let (width, height) = request.dimensions();
        let mut url = self.base_url.clone();

        // cannot_be_a_base was rejected in build()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("image")
                .push(&request.effective_prompt());
        }

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("model", &request.model)
                .append_pair("width", &width.to_string())
                .append_pair("height", &height.to_string())
                .append_pair("nologo", bool_str(request.nologo))
                .append_pair("enhance", bool_str(request.enhance))
                .append_pair("safe", bool_str(request.safe));
            if let Some(seed) = request.seed {
                query.append_pair("seed", &seed.to_string());
            }
            if let Some(negative) = &request.negative_prompt {
                query.append_pair("negative_prompt", negative);
            }
        }

        url
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> VibranceError {
        let text = sanitize_error_message(text);
        match status {
            401 | 403 => VibranceError::Auth(text),
            429 => {
                let retry_after = parse_retry_after(headers).map(Duration::from_secs);
                VibranceError::RateLimited { retry_after }
            }
            400 | 422 => VibranceError::InvalidRequest(text),
            _ => VibranceError::Api {
                status,
                message: text,
            },
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> VibranceError {
        if err.is_timeout() {
            VibranceError::Timeout(self.timeout)
        } else {
            VibranceError::Network(err)
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[async_trait]
impl ImageProvider for PollinationsProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        request.validate()?;
        let start = Instant::now();
        let url = self.request_url(request);
        tracing::debug!(model = %request.model, seed = ?request.seed, "requesting image");

        let mut http = self.client.get(url);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }
        let response = http.send().await.map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?
            .to_vec();
        if data.is_empty() {
            return Err(VibranceError::Decode("empty image body".into()));
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let format = ImageFormat::from_magic_bytes(&data).unwrap_or_default();
        let (width, height) = request.dimensions();
        tracing::info!(bytes = data.len(), duration_ms, "image generated");

        Ok(GeneratedImage::new(
            data,
            format,
            ImageProviderKind::Pollinations,
            GenerationMetadata {
                model: Some(request.model.clone()),
                seed: request.seed,
                width: Some(width),
                height: Some(height),
                duration_ms: Some(duration_ms),
            },
        ))
    }

    fn kind(&self) -> ImageProviderKind {
        ImageProviderKind::Pollinations
    }
}
