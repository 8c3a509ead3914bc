use async_trait::async_trait;

/// Durable tabular storage: one table per fulfillment bucket, a stock table,
/// and scalar cells for run bookkeeping.
///
/// Tables have a header row the store owns; `read_table` and `write_table`
/// operate on the data region below it only. Writes replace that region
/// wholesale, so callers must read before writing to avoid lost updates.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Ordered data rows of a table, header excluded.
    async fn read_table(&self, table: &str) -> Result<Vec<Vec<String>>, StoreError>;

    /// Full overwrite of a table's data region; the header is preserved.
    async fn write_table(&self, table: &str, rows: Vec<Vec<String>>) -> Result<(), StoreError>;

    /// A single scalar cell; `None` when empty.
    async fn read_cell(&self, table: &str, cell: &str) -> Result<Option<String>, StoreError>;

    async fn write_cell(&self, table: &str, cell: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ledger store transport failure: {0}")]
    Transport(String),

    #[error("ledger store returned an unexpected payload: {0}")]
    Payload(String),
}
