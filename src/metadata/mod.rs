//! Model metadata: data model, resolution from the control schema, caching.

pub mod cache;
mod resolver;
mod types;

pub use cache::{MetadataCache, MODEL_NAMESPACE};
pub use resolver::{ControlSchema, MetadataResolver, MetadataSource};
pub use types::{
    FieldDescriptor, Metadata, MetadataRecord, Operation, Permissions, SelectSource,
};
