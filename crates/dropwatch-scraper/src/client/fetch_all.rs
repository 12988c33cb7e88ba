//! Page-number pagination over `products.json`.

use std::time::Duration;

use crate::error::ScraperError;
use crate::types::ShopifyProduct;

use super::ShopifyClient;

/// Products collected by [`ShopifyClient::fetch_catalog`].
#[derive(Debug)]
pub struct CatalogFetch {
    pub products: Vec<ShopifyProduct>,
    /// Pages that returned at least one product.
    pub pages_fetched: u32,
    /// Set when a later page failed and pagination stopped early. The
    /// products from earlier pages are still returned.
    pub truncated_by: Option<ScraperError>,
    /// `true` when the page cap was reached while pages were still full.
    pub hit_page_cap: bool,
}

impl CatalogFetch {
    /// `true` when every page up to the natural end was read.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.truncated_by.is_none() && !self.hit_page_cap
    }
}

impl ShopifyClient {
    /// Fetches the whole catalog, page 1 upward, until a page comes back
    /// empty or with a non-success status, or `max_pages` is reached.
    ///
    /// `inter_request_delay_ms` is slept between page requests (not before
    /// the first).
    ///
    /// A transient failure after page 1 ends the loop and the pages already
    /// collected are returned with [`CatalogFetch::truncated_by`] set.
    ///
    /// # Errors
    ///
    /// Returns the page-1 error when the very first page cannot be fetched;
    /// nothing is collected in that case.
    pub async fn fetch_catalog(
        &self,
        store_url: &str,
        limit: u32,
        max_pages: u32,
        inter_request_delay_ms: u64,
    ) -> Result<CatalogFetch, ScraperError> {
        let mut fetch = CatalogFetch {
            products: Vec::new(),
            pages_fetched: 0,
            truncated_by: None,
            hit_page_cap: false,
        };

        for page in 1..=max_pages {
            if page > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            let response = match self.fetch_products_page(store_url, limit, page).await {
                Ok(response) => response,
                Err(e) if page == 1 => return Err(e),
                Err(e) if e.is_status() => {
                    tracing::debug!(page, error = %e, "catalog pagination ended on status");
                    return Ok(fetch);
                }
                Err(e) => {
                    tracing::warn!(
                        page,
                        pages_fetched = fetch.pages_fetched,
                        error = %e,
                        "catalog page failed — continuing with pages already fetched"
                    );
                    fetch.truncated_by = Some(e);
                    return Ok(fetch);
                }
            };

            if response.products.is_empty() {
                tracing::debug!(page, "catalog pagination reached an empty page");
                return Ok(fetch);
            }

            tracing::debug!(page, products = response.products.len(), "fetched catalog page");
            fetch.pages_fetched += 1;
            fetch.products.extend(response.products);
        }

        tracing::warn!(
            max_pages,
            "catalog page cap reached before an empty page; later pages were not read"
        );
        fetch.hit_page_cap = true;
        Ok(fetch)
    }
}
