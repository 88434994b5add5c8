//! Model registry.
//!
//! A [`ModelRegistry`] holds the collaborators every model needs: the
//! relational executor, the metadata cache and the defaults applied to new
//! handles. Build one at startup and share it.
//!
//! ```ignore
//! let executor = Arc::new(SqliteExecutor::open("app.db")?);
//! let registry = ModelRegistry::new(executor);
//! let customers = registry.get_model("customers").await?;
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheStore, MemoryCacheStore, SqliteCacheStore};
use crate::config::{CacheBackend, Settings, SettingsError};
use crate::error::ModelResult;
use crate::metadata::{ControlSchema, MetadataCache, MetadataResolver, MetadataSource};
use crate::model::{Globals, Model};
use crate::store::RelationalExecutor;

/// Factory for [`Model`] handles.
#[derive(Clone)]
pub struct ModelRegistry {
    executor: Arc<dyn RelationalExecutor>,
    cache: MetadataCache,
    strict_mode: bool,
    enforce_permissions: bool,
}

impl ModelRegistry {
    /// Registry with an in-memory cache and the default control tables.
    pub fn new(executor: Arc<dyn RelationalExecutor>) -> Self {
        let source = Arc::new(MetadataResolver::new(executor.clone()));
        Self {
            cache: MetadataCache::new(Arc::new(MemoryCacheStore::new()), source),
            executor,
            strict_mode: false,
            enforce_permissions: false,
        }
    }

    /// Registry configured from settings.
    pub fn from_settings(
        settings: &Settings,
        executor: Arc<dyn RelationalExecutor>,
    ) -> Result<Self, SettingsError> {
        if settings.model.dialect != executor.dialect() {
            warn!(
                configured = %settings.model.dialect,
                executor = %executor.dialect(),
                "configured dialect differs from the executor's"
            );
        }

        let store: Arc<dyn CacheStore> = match settings.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryCacheStore::new()),
            CacheBackend::Sqlite => {
                let opened = match settings.cache.resolved_path()? {
                    Some(path) => SqliteCacheStore::open_at(path),
                    None => SqliteCacheStore::open(),
                };
                Arc::new(opened.map_err(|e| SettingsError::InvalidConfig(e.to_string()))?)
            }
        };

        let control = settings.control.control_schema()?;
        debug!(
            header_table = %control.header_table,
            columns_table = %control.columns_table,
            "model registry configured"
        );

        Ok(Self::new(executor)
            .with_cache_store(store)
            .with_control_schema(control)
            .with_strict_mode(settings.model.strict_mode)
            .with_permission_enforcement(settings.model.enforce_permissions))
    }

    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache = MetadataCache::new(store, self.source());
        self
    }

    pub fn with_control_schema(self, control: ControlSchema) -> Self {
        let source = Arc::new(MetadataResolver::with_control_schema(
            self.executor.clone(),
            control,
        ));
        self.with_metadata_source(source)
    }

    /// Replace the metadata source, e.g. with a fixed set of models.
    pub fn with_metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.cache = MetadataCache::new(self.cache.store().clone(), source);
        self
    }

    /// Default strict mode for new handles.
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    /// Default permission enforcement for new handles.
    pub fn with_permission_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_permissions = enforce;
        self
    }

    pub fn executor(&self) -> &Arc<dyn RelationalExecutor> {
        &self.executor
    }

    pub fn metadata_cache(&self) -> &MetadataCache {
        &self.cache
    }

    fn source(&self) -> Arc<dyn MetadataSource> {
        self.cache.source().clone()
    }

    /// Resolve a model and return a handle on it.
    pub async fn get_model(&self, model_name: &str) -> ModelResult<Model> {
        self.get_model_with_globals(model_name, Globals::new()).await
    }

    /// Resolve a model and bind `globals` for its raw query text.
    pub async fn get_model_with_globals(
        &self,
        model_name: &str,
        globals: Globals,
    ) -> ModelResult<Model> {
        let metadata = self.cache.get_or_load(model_name).await?;
        Ok(Model::new(model_name, metadata, self.executor.clone())
            .with_globals(globals)
            .with_strict_mode(self.strict_mode)
            .with_permission_enforcement(self.enforce_permissions))
    }
}
