//! Get-or-load metadata cache.
//!
//! Entries live under the `model` namespace, keyed by the model name as
//! given by the caller. Concurrent misses on the same name may each resolve
//! and store; the last write wins.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::resolver::MetadataSource;
use super::types::Metadata;
use crate::cache::CacheStore;
use crate::error::ModelResult;

/// Cache namespace for model metadata.
pub const MODEL_NAMESPACE: &str = "model";

/// Metadata lookups backed by a [`CacheStore`].
#[derive(Clone)]
pub struct MetadataCache {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn MetadataSource>,
}

impl MetadataCache {
    pub fn new(store: Arc<dyn CacheStore>, source: Arc<dyn MetadataSource>) -> Self {
        Self { store, source }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn source(&self) -> &Arc<dyn MetadataSource> {
        &self.source
    }

    /// Return cached metadata, resolving and storing it on a miss.
    ///
    /// A cached value that no longer decodes is treated as a miss. A failed
    /// store write is logged and does not fail the lookup.
    pub async fn get_or_load(&self, model_name: &str) -> ModelResult<Arc<Metadata>> {
        if let Some(value) = self.store.get(MODEL_NAMESPACE, model_name).await? {
            match serde_json::from_value::<Metadata>(value) {
                Ok(metadata) => {
                    trace!(model = model_name, "model cache hit");
                    return Ok(Arc::new(metadata));
                }
                Err(e) => {
                    warn!(model = model_name, error = %e, "cached model metadata is unreadable, reloading");
                }
            }
        }

        debug!(
            model = model_name,
            "model cache miss, fetching database metadata"
        );
        let metadata = self.source.resolve(model_name).await?;

        let value = serde_json::to_value(&metadata)?;
        if let Err(e) = self.store.set(MODEL_NAMESPACE, model_name, value).await {
            warn!(model = model_name, error = %e, "failed to save model metadata to cache");
        }

        Ok(Arc::new(metadata))
    }

    /// Drop the cached entry for a model. Returns true if one existed.
    pub async fn invalidate(&self, model_name: &str) -> ModelResult<bool> {
        Ok(self.store.remove(MODEL_NAMESPACE, model_name).await?)
    }
}
