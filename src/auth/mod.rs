pub mod discovery;
pub mod validator;

pub use discovery::{discover_api_key, DiscoveryError, KeyDiscovery, Progress, Stage};
pub use validator::{ApiKeyValidator, KeyValidator};
