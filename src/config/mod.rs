//! Configuration module for recordmodel.
//!
//! Handles model defaults, control table naming, the cache backend, and
//! environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, CacheBackend, CacheSettings, ControlSettings, ModelSettings, Settings,
    SettingsError,
};
