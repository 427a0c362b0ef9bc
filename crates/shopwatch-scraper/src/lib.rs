pub mod client;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod types;

pub use client::{ClientOptions, ShopifyClient};
pub use error::ScraperError;
pub use normalize::normalize_product;
pub use types::{ShopifyImage, ShopifyProduct, ShopifyProductsResponse, ShopifyVariant, VariantPrice};
