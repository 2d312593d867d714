pub mod api;
pub mod auth;
pub mod config;
pub mod fallback;
pub mod gather;
pub mod headers;
pub mod http_client;
pub mod output;
pub mod query;

// re-export modules used in tests
pub use crate::auth::{discover_api_key, DiscoveryError, KeyDiscovery};
pub use crate::config::{Config, ConfigStore, ConfigUpdate, DiscoveryConfig};
