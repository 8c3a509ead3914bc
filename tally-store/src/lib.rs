pub mod app_config;
pub mod memory;
pub mod sheets;
pub mod shopify;

pub use app_config::Config;
pub use memory::{InMemoryLedgerStore, StaticOrderSource};
pub use sheets::SheetsLedgerStore;
pub use shopify::ShopifyOrderSource;
