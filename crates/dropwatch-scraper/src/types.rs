//! Storefront response types for the public `products.json` endpoint.
//!
//! ### `product_type`
//! A plain string; often empty (`""`). Absent on some themes, so it is
//! modelled as `Option<String>`.
//!
//! ### `available` on variants
//! Boolean; `true` when the variant is in stock. May be absent on older
//! stores, in which case we default to `true`.
//!
//! ### `price`
//! Always a decimal string (`"45.00"`), never a number. Carried through
//! untouched.
//!
//! ### Variant `title`
//! The size lives here on apparel stores (`"Small"`, `"2X-Large / Black"`).
//! Single-variant products report `"Default Title"`.

use serde::Deserialize;

/// Top-level response from `GET /products.json`.
#[derive(Debug, Deserialize)]
pub struct ShopifyProductsResponse {
    #[serde(default)]
    pub products: Vec<ShopifyProduct>,
}

/// A single product from the storefront.
#[derive(Debug, Deserialize)]
pub struct ShopifyProduct {
    /// Numeric product ID.
    pub id: i64,

    /// Display name of the product (e.g., `"Logo Hoodie"`).
    pub title: String,

    /// URL slug for the product page (e.g., `"logo-hoodie"`).
    pub handle: String,

    /// Product category string. May be empty or absent.
    #[serde(default)]
    pub product_type: Option<String>,

    /// Vendor name as configured on the store.
    #[serde(default)]
    pub vendor: Option<String>,

    /// Tags as a JSON array of strings.
    #[serde(default)]
    pub tags: Vec<String>,

    /// All purchasable variants for this product.
    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,
}

/// A single purchasable variant of a [`ShopifyProduct`].
#[derive(Debug, Deserialize)]
pub struct ShopifyVariant {
    /// Numeric variant ID.
    pub id: i64,

    /// Display title of the variant, usually the size (e.g. `"X-Large"`).
    pub title: String,

    /// Stock-keeping unit. May be `null` or an empty string.
    #[serde(default)]
    pub sku: Option<String>,

    /// Current price as a decimal string (e.g., `"45.00"`).
    pub price: String,

    /// Whether this variant is currently available for purchase.
    /// Defaults to `true` when absent.
    #[serde(default = "default_available")]
    pub available: bool,

    /// 1-based position within the product.
    #[serde(default)]
    pub position: Option<i32>,
}

/// Default value for `ShopifyVariant::available` when the field is absent.
fn default_available() -> bool {
    true
}
