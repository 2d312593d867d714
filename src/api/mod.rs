pub mod client;
pub mod types;

pub use client::{ApiError, CatalogClient, SearchOptions, DEFAULT_SEARCH_LIMIT};
pub use types::{Offer, SearchResult};
