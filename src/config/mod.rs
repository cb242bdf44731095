//! Configuration module for marketscore
//!
//! This module handles:
//! - Compiled-in ideal targets per marketplace
//! - User overrides of those targets (load, save, restore)
//! - User-level settings (default marketplace, storage directory)

mod store;
mod targets;
mod user_config;

pub use store::{
    ConfigError, ConfigStore, FileStore, KeyValueStore, MemoryStore, Overrides, StoreError,
    MAX_PERSISTED_BYTES, OVERRIDES_KEY, OVERRIDES_VERSION,
};
pub use targets::{
    default_targets, is_supported_marketplace, normalize_marketplace_id, supported_marketplaces,
    IdealTargets, GLOBAL_DEFAULT_MARKETPLACE,
};
pub use user_config::{UserConfig, MARKETPLACE_ENV};
