//! Fetchers: the per-data-type remote reads a panel supplies.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use nodedeck_core::{CacheKey, DeviceId, FetchError, Generation, PanelData, Payload};

/// Performs the remote read(s) for one data type.
///
/// Implementations bound their own network timeout and always resolve.
#[async_trait]
pub trait DataFetcher<T: PanelData>: Send + Sync {
    async fn fetch(&self, device: &DeviceId) -> Result<T, FetchError>;
}

/// Adapts an async closure into a [`DataFetcher`].
pub struct FnFetcher<F>(F);

impl<F> FnFetcher<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<T, F, Fut> DataFetcher<T> for FnFetcher<F>
where
    T: PanelData,
    F: Fn(DeviceId) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FetchError>> + Send,
{
    async fn fetch(&self, device: &DeviceId) -> Result<T, FetchError> {
        (self.0)(device.clone()).await
    }
}

/// One load or refresh attempt, owned by the task executing it.
pub struct FetchRequest<T: PanelData> {
    pub key: CacheKey,
    pub generation: Generation,
    fetcher: Arc<dyn DataFetcher<T>>,
}

impl<T: PanelData> FetchRequest<T> {
    pub fn new(key: CacheKey, generation: Generation, fetcher: Arc<dyn DataFetcher<T>>) -> Self {
        Self {
            key,
            generation,
            fetcher,
        }
    }

    /// Run the fetcher and serialize its result.
    pub async fn run(&self) -> Result<Payload, FetchError> {
        let value = self.fetcher.fetch(&self.key.device).await?;
        value.encode().map_err(|e| FetchError::Decode {
            reason: e.to_string(),
        })
    }
}
