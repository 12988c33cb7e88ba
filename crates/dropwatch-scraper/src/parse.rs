//! Flattening from raw storefront products to [`dropwatch_core::Variant`] rows.
//!
//! Size parsing is delegated to [`crate::sizes`]; this module only handles
//! the structural conversion.

use dropwatch_core::Variant;

use crate::client::extract_store_origin;
use crate::sizes::normalize_size;
use crate::types::{ShopifyProduct, ShopifyVariant};

/// Flattens every variant of every product into a [`Variant`].
///
/// Output order is product order, then variant order within each product.
/// Duplicate variant IDs are passed through unchanged. Products without
/// variants contribute nothing.
#[must_use]
pub fn parse_catalog(products: &[ShopifyProduct], store_url: &str) -> Vec<Variant> {
    let origin = extract_store_origin(store_url);
    products
        .iter()
        .flat_map(|product| {
            product
                .variants
                .iter()
                .map(|variant| parse_variant(product, variant, &origin))
        })
        .collect()
}

fn parse_variant(product: &ShopifyProduct, variant: &ShopifyVariant, origin: &str) -> Variant {
    let variant_id = variant.id.to_string();
    Variant {
        url: format!(
            "{origin}/products/{}?variant={variant_id}",
            product.handle
        ),
        variant_id,
        product_title: product.title.clone(),
        product_type: product.product_type.clone().unwrap_or_default(),
        size_label: normalize_size(&variant.title),
        available: variant.available,
        price: variant.price.clone(),
    }
}
