use crate::config::EngineConfig;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tally_core::{Bucket, LedgerStore, OrderNumber, OrderRecord, StoreError};
use tracing::warn;

/// The five ledger tables held in memory for the duration of a run.
///
/// Invariant maintained structurally: an order number appears in at most one
/// table. New rows are staged separately so they end up prepended ahead of
/// the surviving stored rows on rewrite.
pub struct LedgerTables {
    existing: HashMap<Bucket, Vec<OrderRecord>>,
    fresh: HashMap<Bucket, Vec<OrderRecord>>,
    index: HashMap<OrderNumber, Bucket>,
    dirty: HashSet<Bucket>,
}

impl LedgerTables {
    pub async fn load(store: &dyn LedgerStore, config: &EngineConfig) -> Result<Self, StoreError> {
        let mut existing: HashMap<Bucket, Vec<OrderRecord>> = HashMap::new();
        let mut index = HashMap::new();

        for bucket in Bucket::ALL {
            let table = config.table_for(bucket);
            let rows = store.read_table(table).await?;
            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                let Some(record) = OrderRecord::from_row(&row) else {
                    warn!(table, ?row, "skipping malformed ledger row");
                    continue;
                };
                if index.contains_key(&record.order_number) {
                    warn!(
                        table,
                        order = record.order_number,
                        "order number already present in another table, keeping first"
                    );
                    continue;
                }
                index.insert(record.order_number, bucket);
                records.push(record);
            }
            existing.insert(bucket, records);
        }

        Ok(Self {
            existing,
            fresh: HashMap::new(),
            index,
            dirty: HashSet::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, order_number: OrderNumber) -> bool {
        self.index.contains_key(&order_number)
    }

    pub fn order_numbers(&self) -> HashSet<OrderNumber> {
        self.index.keys().copied().collect()
    }

    /// Oldest order date across every table; `None` when the ledger is empty.
    pub fn oldest_order_date(&self) -> Option<NaiveDate> {
        self.existing
            .values()
            .flatten()
            .map(|record| record.order_date)
            .min()
    }

    /// Remove and return every stored order whose number is absent from the
    /// given open set. Absence from "still open" implies completion.
    pub fn drain_absent(&mut self, open: &HashSet<OrderNumber>) -> Vec<OrderRecord> {
        let mut drained = Vec::new();
        for (bucket, records) in self.existing.iter_mut() {
            let before = records.len();
            records.retain(|record| {
                if open.contains(&record.order_number) {
                    true
                } else {
                    drained.push(record.clone());
                    false
                }
            });
            if records.len() != before {
                self.dirty.insert(*bucket);
            }
        }
        for record in &drained {
            self.index.remove(&record.order_number);
        }
        drained
    }

    /// Stage a newly classified order for its bucket. Returns `false`
    /// without inserting when the order number is already present anywhere
    /// in the ledger.
    pub fn insert_new(&mut self, bucket: Bucket, record: OrderRecord) -> bool {
        if self.index.contains_key(&record.order_number) {
            return false;
        }
        self.index.insert(record.order_number, bucket);
        self.fresh.entry(bucket).or_default().push(record);
        self.dirty.insert(bucket);
        true
    }

    /// A bucket's rows as they will be persisted: staged rows first
    /// (most recent ahead), then the surviving stored rows in place.
    pub fn rows_for(&self, bucket: Bucket) -> Vec<Vec<String>> {
        let fresh = self.fresh.get(&bucket).map(Vec::as_slice).unwrap_or(&[]);
        let existing = self.existing.get(&bucket).map(Vec::as_slice).unwrap_or(&[]);
        fresh
            .iter()
            .chain(existing.iter())
            .map(OrderRecord::to_row)
            .collect()
    }

    /// Rewrite every table touched this run. Untouched tables are left
    /// alone so a no-change run writes nothing.
    pub async fn persist(
        &self,
        store: &dyn LedgerStore,
        config: &EngineConfig,
    ) -> Result<(), StoreError> {
        for bucket in Bucket::ALL {
            if !self.dirty.contains(&bucket) {
                continue;
            }
            store
                .write_table(config.table_for(bucket), self.rows_for(bucket))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::SkuList;
    use tally_store::memory::InMemoryLedgerStore;

    fn record(number: OrderNumber, date: &str) -> OrderRecord {
        OrderRecord {
            order_number: number,
            skus: SkuList::parse("A"),
            country: "US".to_string(),
            email: String::new(),
            order_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        }
    }

    async fn loaded(rows: Vec<(&str, Vec<OrderRecord>)>) -> LedgerTables {
        let store = InMemoryLedgerStore::new();
        for (table, records) in rows {
            store.seed_table(table, records.iter().map(OrderRecord::to_row).collect());
        }
        LedgerTables::load(&store, &EngineConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_oldest_date_across_tables() {
        let tables = loaded(vec![
            ("USA", vec![record(1, "2024-03-05")]),
            ("UK", vec![record(2, "2024-01-02"), record(3, "2024-06-01")]),
        ])
        .await;
        assert_eq!(
            tables.oldest_order_date(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }

    #[tokio::test]
    async fn test_drain_absent() {
        let mut tables = loaded(vec![(
            "USA",
            vec![record(1, "2024-01-01"), record(2, "2024-01-02")],
        )])
        .await;

        let open = HashSet::from([2]);
        let drained = tables.drain_absent(&open);

        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].order_number, 1);
        assert!(!tables.contains(1));
        assert!(tables.contains(2));
    }

    #[tokio::test]
    async fn test_insert_skips_duplicates_across_tables() {
        let mut tables = loaded(vec![("USA", vec![record(1, "2024-01-01")])]).await;

        // Same number, different bucket: still refused.
        assert!(!tables.insert_new(Bucket::Partial, record(1, "2024-01-01")));
        assert!(tables.insert_new(Bucket::Partial, record(2, "2024-01-03")));
        assert!(!tables.insert_new(Bucket::Uk, record(2, "2024-01-03")));
        assert_eq!(tables.len(), 2);
    }

    #[tokio::test]
    async fn test_fresh_rows_prepend() {
        let mut tables = loaded(vec![("USA", vec![record(1, "2024-01-01")])]).await;
        tables.insert_new(Bucket::Usa, record(2, "2024-02-01"));

        let rows = tables.rows_for(Bucket::Usa);
        assert_eq!(rows[0][0], "2");
        assert_eq!(rows[1][0], "1");
    }

    #[tokio::test]
    async fn test_persist_only_dirty_tables() {
        let store = InMemoryLedgerStore::new();
        store.seed_table("USA", vec![record(1, "2024-01-01").to_row()]);
        store.seed_table("UK", vec![record(2, "2024-01-01").to_row()]);

        let config = EngineConfig::default();
        let mut tables = LedgerTables::load(&store, &config).await.unwrap();
        tables.insert_new(Bucket::Usa, record(3, "2024-02-01"));
        tables.persist(&store, &config).await.unwrap();

        assert_eq!(store.writes_to("USA"), 1);
        assert_eq!(store.writes_to("UK"), 0);
    }
}
