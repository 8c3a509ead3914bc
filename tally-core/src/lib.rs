pub mod classify;
pub mod models;
pub mod routing;
pub mod sku;
pub mod source;
pub mod store;

pub use classify::{classify, Classified, Disposition};
pub use models::{Bucket, OrderNumber, OrderRecord, RemoteOrder};
pub use routing::{Region, Warehouse};
pub use sku::SkuList;
pub use source::{Cursor, OrderPage, OrderQuery, OrderSource, SourceError, StatusFilter};
pub use store::{LedgerStore, StoreError};
