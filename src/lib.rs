//! # recordmodel
//!
//! Metadata-driven record access: generic select/insert/update/delete over
//! tables described in a control schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  ModelRegistry::get_model                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [metadata::cache]
//! ┌─────────────────────────────────────────────────────────┐
//! │      MetadataCache (CacheStore, namespace "model")       │
//! └─────────────────────────────────────────────────────────┘
//!                          │ miss
//!                          ▼ [metadata::resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │       MetadataResolver (models / models_det tables)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model]
//! ┌─────────────────────────────────────────────────────────┐
//! │  Model: field translation, filters, single-row mutation  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql + store]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Statement -> RelationalExecutor / Transaction     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod model;
pub mod registry;
pub mod sql;
pub mod store;

pub use error::{ModelError, ModelResult};
pub use filter::{FilterItem, FilterPredicate, Filters, Operator};
pub use metadata::{FieldDescriptor, Metadata, MetadataRecord, Permissions};
pub use model::{
    FieldValues, Globals, InsertResult, Model, MutationResult, SelectResult, UpdateValues,
};
pub use registry::ModelRegistry;
pub use store::{QueryOutput, RelationalExecutor, SqliteExecutor, Transaction};
