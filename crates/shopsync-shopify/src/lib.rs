pub mod client;
pub mod error;
pub mod normalize;
pub mod pagination;
mod retry;
pub mod types;

pub use client::{AdminClientConfig, ShopifyAdminClient};
pub use error::ShopifyError;
pub use normalize::normalize_product;
pub use types::{ProductsPage, RawProduct, RawVariant};
