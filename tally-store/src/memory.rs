use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use tally_core::{
    Cursor, LedgerStore, OrderPage, OrderQuery, OrderSource, RemoteOrder, SourceError,
    StatusFilter, StoreError,
};

#[derive(Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    cells: HashMap<String, String>,
    writes: usize,
}

/// In-memory `LedgerStore` for tests and local runs. Unknown tables read as
/// empty rather than failing, which matches a freshly provisioned ledger.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    tables: Mutex<HashMap<String, TableState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_table(&self, table: &str, rows: Vec<Vec<String>>) {
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().rows = rows;
    }

    pub fn seed_cell(&self, table: &str, cell: &str, value: &str) {
        let mut tables = self.tables.lock().unwrap();
        tables
            .entry(table.to_string())
            .or_default()
            .cells
            .insert(cell.to_string(), value.to_string());
    }

    pub fn rows(&self, table: &str) -> Vec<Vec<String>> {
        let tables = self.tables.lock().unwrap();
        tables.get(table).map(|t| t.rows.clone()).unwrap_or_default()
    }

    pub fn cell(&self, table: &str, cell: &str) -> Option<String> {
        let tables = self.tables.lock().unwrap();
        tables.get(table)?.cells.get(cell).cloned()
    }

    /// How many times a table's data region has been rewritten.
    pub fn writes_to(&self, table: &str) -> usize {
        let tables = self.tables.lock().unwrap();
        tables.get(table).map(|t| t.writes).unwrap_or(0)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn read_table(&self, table: &str) -> Result<Vec<Vec<String>>, StoreError> {
        Ok(self.rows(table))
    }

    async fn write_table(&self, table: &str, rows: Vec<Vec<String>>) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let state = tables.entry(table.to_string()).or_default();
        state.rows = rows;
        state.writes += 1;
        Ok(())
    }

    async fn read_cell(&self, table: &str, cell: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cell(table, cell))
    }

    async fn write_cell(&self, table: &str, cell: &str, value: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .entry(table.to_string())
            .or_default()
            .cells
            .insert(cell.to_string(), value.to_string());
        Ok(())
    }
}

/// `OrderSource` over fixed data, with real pagination so callers exercise
/// the cursor loop.
pub struct StaticOrderSource {
    open: Vec<RemoteOrder>,
    all: Vec<RemoteOrder>,
    page_size: usize,
}

impl StaticOrderSource {
    /// `open` answers `StatusFilter::Open` queries, `all` answers
    /// `StatusFilter::Any`.
    pub fn new(open: Vec<RemoteOrder>, all: Vec<RemoteOrder>) -> Self {
        Self {
            open,
            all,
            page_size: 250,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl OrderSource for StaticOrderSource {
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, SourceError> {
        let pool = match query.status {
            StatusFilter::Open => &self.open,
            StatusFilter::Any => &self.all,
        };
        let matching: Vec<&RemoteOrder> = pool
            .iter()
            .filter(|order| order.created_at.with_timezone(&Utc) >= query.created_at_min)
            .collect();

        let offset: usize = match &query.cursor {
            Some(cursor) => cursor
                .as_str()
                .parse()
                .map_err(|_| SourceError::Payload(format!("bad cursor {:?}", cursor.as_str())))?,
            None => 0,
        };
        let orders: Vec<RemoteOrder> = matching
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|order| (*order).clone())
            .collect();
        let consumed = offset + orders.len();
        let next = (consumed < matching.len()).then(|| Cursor::new(consumed.to_string()));

        Ok(OrderPage { orders, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn order(number: i64, created_at: &str) -> RemoteOrder {
        serde_json::from_str(&format!(
            r#"{{"order_number": {number}, "created_at": "{created_at}"}}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_pagination_walks_all_pages() {
        let source = StaticOrderSource::new(
            vec![
                order(1, "2024-01-01T00:00:00Z"),
                order(2, "2024-01-02T00:00:00Z"),
                order(3, "2024-01-03T00:00:00Z"),
            ],
            vec![],
        )
        .with_page_size(2);

        let min = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let mut query = OrderQuery::new(StatusFilter::Open, min);
        let mut seen = Vec::new();
        loop {
            let page = source.list_orders(&query).await.unwrap();
            seen.extend(page.orders.iter().map(|o| o.order_number));
            match page.next {
                Some(cursor) => query = query.with_cursor(cursor),
                None => break,
            }
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_created_at_min_filters() {
        let source = StaticOrderSource::new(
            vec![order(1, "2024-01-01T00:00:00Z"), order(2, "2024-06-01T00:00:00Z")],
            vec![],
        );
        let min = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let page = source
            .list_orders(&OrderQuery::new(StatusFilter::Open, min))
            .await
            .unwrap();
        assert_eq!(page.orders.len(), 1);
        assert_eq!(page.orders[0].order_number, 2);
    }
}
