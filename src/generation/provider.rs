//! Image provider trait and utilities.

use crate::error::{Result, VibranceError};
use crate::generation::types::{GeneratedImage, GenerationRequest, ImageProviderKind};
use async_trait::async_trait;

/// Largest number of images a single batch may request.
pub const MAX_BATCH_SIZE: u32 = 8;

/// Exclusive upper bound for randomly chosen batch seeds.
const RANDOM_SEED_RANGE: u64 = 1_000_000;

/// Trait for image generation providers.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates an image from the given request.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;

    /// Returns the kind of this provider.
    fn kind(&self) -> ImageProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.kind() {
            ImageProviderKind::Pollinations => "Pollinations",
        }
    }
}

/// Extension trait for providers with retry and batch logic.
#[async_trait]
pub trait ImageProviderExt: ImageProvider {
    /// Generates with automatic retries on transient failures.
    async fn generate_with_retries(
        &self,
        request: &GenerationRequest,
        max_retries: u32,
    ) -> Result<GeneratedImage> {
        let mut attempt = 0;
        loop {
            match self.generate(request).await {
                Ok(image) => return Ok(image),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = e.retry_after().unwrap_or(std::time::Duration::from_secs(1));
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis(),
                        "retrying after transient error: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Generates `count` variations concurrently.
    ///
    /// Image `i` uses seed `base + i`, where `base` is the request's seed or a
    /// random value. Each image is retried up to `max_retries` times on its
    /// own; the batch fails as a whole once any image runs out of retries.
    async fn generate_batch(
        &self,
        request: &GenerationRequest,
        count: u32,
        max_retries: u32,
    ) -> Result<Vec<GeneratedImage>> {
        let seeds = batch_seeds(request.seed, count)?;
        tracing::debug!(count, ?seeds, "generating batch");

        let requests: Vec<GenerationRequest> = seeds
            .into_iter()
            .map(|seed| request.clone().with_seed(seed))
            .collect();

        futures::future::try_join_all(
            requests
                .iter()
                .map(|req| self.generate_with_retries(req, max_retries)),
        )
        .await
    }
}

impl<T: ImageProvider> ImageProviderExt for T {}

/// Seeds for a batch of `count` images.
pub fn batch_seeds(base: Option<u64>, count: u32) -> Result<Vec<u64>> {
    if count == 0 || count > MAX_BATCH_SIZE {
        return Err(VibranceError::InvalidRequest(format!(
            "image count must be between 1 and {MAX_BATCH_SIZE}, got {count}"
        )));
    }
    let base = match base {
        Some(seed) => seed,
        None => random_seed()?,
    };
    Ok((0..u64::from(count))
        .map(|i| base.wrapping_add(i))
        .collect())
}

fn random_seed() -> Result<u64> {
    let raw = getrandom::u64()
        .map_err(|e| VibranceError::InvalidRequest(format!("no entropy for random seed: {e}")))?;
    Ok(raw % RANDOM_SEED_RANGE)
}
