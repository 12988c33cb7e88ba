pub mod client;
pub mod error;
pub mod lock_probe;
pub mod parse;
pub(crate) mod rate_limit;
pub mod sizes;
pub mod types;

pub use client::{extract_store_origin, CatalogFetch, ShopifyClient};
pub use error::ScraperError;
pub use lock_probe::LockProber;
pub use parse::parse_catalog;
pub use sizes::normalize_size;
pub use types::{ShopifyProduct, ShopifyProductsResponse, ShopifyVariant};
