use crate::config::EngineConfig;
use crate::inventory::InventoryLedger;
use crate::tables::LedgerTables;
use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tally_core::{
    classify, Disposition, LedgerStore, OrderNumber, OrderQuery, OrderSource, SourceError,
    StatusFilter, StoreError,
};
use tracing::{info, warn};
use uuid::Uuid;

const MARKER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One reconciliation pass: load prior ledger state, diff it against the
/// source's current open orders to infer what was fulfilled since the last
/// run, decrement inventory, merge newly seen orders in without duplicates,
/// and commit the whole snapshot.
///
/// "Fulfilled" is inferred from absence: an order we hold that the source no
/// longer lists as open has completed. Cancelled and archived orders count
/// as completed under this rule.
pub struct ReconciliationEngine {
    source: Arc<dyn OrderSource>,
    store: Arc<dyn LedgerStore>,
    config: EngineConfig,
}

impl ReconciliationEngine {
    pub fn new(
        source: Arc<dyn OrderSource>,
        store: Arc<dyn LedgerStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Execute one full run. Nothing is written to the store until every
    /// remote fetch and all in-memory computation has succeeded, so a failed
    /// run leaves the previously committed state untouched.
    pub async fn run(&self) -> Result<RunReport, EngineError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "reconciliation run starting");

        let mut inventory =
            InventoryLedger::load(self.store.as_ref(), &self.config.stock_table).await?;
        let marker = self.read_marker().await?;
        let mut tables = LedgerTables::load(self.store.as_ref(), &self.config).await?;
        let prior = tables.order_numbers();
        info!(ledger_orders = prior.len(), "ledger loaded");

        // Widen the open-order window to the oldest order we still hold, so
        // a late status change on an old order is not missed.
        let window_start = tables
            .oldest_order_date()
            .unwrap_or_else(|| Utc::now().with_timezone(&self.config.timezone).date_naive());
        let open = self.fetch_open_numbers(self.day_start(window_start)).await?;
        let fulfilled = tables.drain_absent(&open);
        for record in &fulfilled {
            inventory.decrement(record);
        }
        info!(
            open = open.len(),
            fulfilled = fulfilled.len(),
            "fulfillment sweep complete"
        );

        // Classify everything created since the last run.
        let since = marker.unwrap_or_else(|| self.day_start(window_start));
        let mut merged = 0usize;
        let mut duplicates_skipped = 0usize;
        let mut unroutable_skipped = 0usize;
        let mut fulfilled_direct = 0usize;

        let mut query = OrderQuery::new(StatusFilter::Any, since);
        loop {
            let page = self.source.list_orders(&query).await?;
            for raw in &page.orders {
                let Some(classified) = classify(raw) else {
                    warn!(order = raw.order_number, "skipping order without shipping destination");
                    unroutable_skipped += 1;
                    continue;
                };
                match classified.disposition {
                    Disposition::Fulfilled => {
                        // Orders we were holding are owned by the sweep
                        // above; decrementing them again would double-count.
                        if !prior.contains(&classified.record.order_number) {
                            inventory.decrement(&classified.record);
                            fulfilled_direct += 1;
                        }
                    }
                    Disposition::Shelve(bucket) => {
                        if tables.insert_new(bucket, classified.record) {
                            merged += 1;
                        } else {
                            duplicates_skipped += 1;
                        }
                    }
                }
            }
            match page.next {
                Some(cursor) => query = query.with_cursor(cursor),
                None => break,
            }
        }

        // All computation succeeded; commit the snapshot, marker last.
        tables.persist(self.store.as_ref(), &self.config).await?;
        inventory
            .commit(self.store.as_ref(), &self.config.stock_table)
            .await?;
        let completed_at = Utc::now();
        self.write_marker(completed_at).await?;

        info!(
            %run_id,
            fulfilled_from_ledger = fulfilled.len(),
            fulfilled_direct,
            merged,
            duplicates_skipped,
            unroutable_skipped,
            "reconciliation run committed"
        );

        Ok(RunReport {
            run_id,
            fulfilled_from_ledger: fulfilled.len(),
            fulfilled_direct,
            merged,
            duplicates_skipped,
            unroutable_skipped,
            completed_at,
        })
    }

    /// Page through every currently open order and collect the numbers.
    async fn fetch_open_numbers(
        &self,
        created_at_min: DateTime<Utc>,
    ) -> Result<HashSet<OrderNumber>, EngineError> {
        let mut open = HashSet::new();
        let mut query = OrderQuery::new(StatusFilter::Open, created_at_min);
        loop {
            let page = self.source.list_orders(&query).await?;
            open.extend(page.orders.iter().map(|order| order.order_number));
            match page.next {
                Some(cursor) => query = query.with_cursor(cursor),
                None => break,
            }
        }
        Ok(open)
    }

    async fn read_marker(&self) -> Result<Option<DateTime<Utc>>, EngineError> {
        let cell = self
            .store
            .read_cell(&self.config.marker_table, &self.config.marker_cell)
            .await?;
        let Some(raw) = cell else {
            return Ok(None);
        };
        match chrono::NaiveDateTime::parse_from_str(raw.trim(), MARKER_FORMAT) {
            Ok(naive) => Ok(Some(self.localize(naive))),
            Err(_) => {
                warn!(marker = %raw, "unreadable last-run marker, falling back to ledger window");
                Ok(None)
            }
        }
    }

    async fn write_marker(&self, at: DateTime<Utc>) -> Result<(), EngineError> {
        let stamp = at
            .with_timezone(&self.config.timezone)
            .format(MARKER_FORMAT)
            .to_string();
        self.store
            .write_cell(&self.config.marker_table, &self.config.marker_cell, &stamp)
            .await?;
        Ok(())
    }

    fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        self.localize(date.and_time(chrono::NaiveTime::MIN))
    }

    fn localize(&self, naive: chrono::NaiveDateTime) -> DateTime<Utc> {
        match self.config.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            // Skipped by a DST gap; read it as UTC rather than fail the run.
            LocalResult::None => Utc.from_utc_datetime(&naive),
        }
    }
}

/// Outcome summary of a completed run, keyed by a fresh run id for log
/// correlation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Ledger orders inferred fulfilled by absence from the open set.
    pub fulfilled_from_ledger: usize,
    /// Orders that arrived already fulfilled and never touched a table.
    pub fulfilled_direct: usize,
    /// New rows merged into ledger tables.
    pub merged: usize,
    /// Orders already present in some table and left alone.
    pub duplicates_skipped: usize,
    /// Records skipped for missing shipping destination.
    pub unroutable_skipped: usize,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("order source: {0}")]
    Source(#[from] SourceError),

    #[error("ledger store: {0}")]
    Store(#[from] StoreError),
}
