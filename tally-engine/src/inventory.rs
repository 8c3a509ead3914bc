use std::collections::HashMap;
use tally_core::{LedgerStore, OrderRecord, StoreError, Warehouse};
use tracing::warn;

/// Per-SKU, per-warehouse stock counters.
///
/// Advisory, never authoritative: unknown SKUs are ignored and quantities
/// may go negative, which signals over-commitment upstream rather than an
/// error here. Loaded once per run, mutated in memory, committed once.
pub struct InventoryLedger {
    stock: HashMap<String, HashMap<Warehouse, i64>>,
    /// Row order of the stock table, preserved across the rewrite.
    sku_order: Vec<String>,
}

impl InventoryLedger {
    pub async fn load(store: &dyn LedgerStore, table: &str) -> Result<Self, StoreError> {
        let rows = store.read_table(table).await?;
        Ok(Self::from_rows(rows))
    }

    /// Build from stock-table rows: one row per SKU, quantities in the
    /// fixed `Warehouse::COLUMNS` order. Blank or unparsable cells count
    /// as zero.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut stock = HashMap::new();
        let mut sku_order = Vec::new();

        for row in rows {
            let Some(sku) = row.first().map(|s| s.trim()).filter(|s| !s.is_empty()) else {
                continue;
            };
            let mut per_warehouse = HashMap::new();
            for (i, warehouse) in Warehouse::COLUMNS.iter().enumerate() {
                let cell = row.get(i + 1).map(String::as_str).unwrap_or("");
                let quantity = if cell.trim().is_empty() {
                    0
                } else {
                    cell.trim().parse().unwrap_or_else(|_| {
                        warn!(sku, cell, "unparsable stock quantity, treating as 0");
                        0
                    })
                };
                per_warehouse.insert(*warehouse, quantity);
            }
            if stock.insert(sku.to_string(), per_warehouse).is_none() {
                sku_order.push(sku.to_string());
            } else {
                warn!(sku, "duplicate stock row, keeping the later one");
            }
        }

        Self { stock, sku_order }
    }

    /// Apply the decrement protocol for one fulfilled order: resolve the
    /// warehouse from the shipping country, then take one unit per SKU
    /// occurrence across all bundles. SKUs not in the ledger are skipped.
    pub fn decrement(&mut self, order: &OrderRecord) {
        let warehouse = Warehouse::for_country(&order.country);
        for sku in order.skus.iter_skus() {
            if let Some(per_warehouse) = self.stock.get_mut(sku) {
                if let Some(quantity) = per_warehouse.get_mut(&warehouse) {
                    *quantity -= 1;
                }
            }
        }
    }

    pub fn quantity(&self, sku: &str, warehouse: Warehouse) -> Option<i64> {
        self.stock.get(sku)?.get(&warehouse).copied()
    }

    /// Snapshot in stock-table row form, original row order preserved.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        self.sku_order
            .iter()
            .map(|sku| {
                let per_warehouse = &self.stock[sku];
                let mut row = vec![sku.clone()];
                row.extend(
                    Warehouse::COLUMNS
                        .iter()
                        .map(|w| per_warehouse[w].to_string()),
                );
                row
            })
            .collect()
    }

    /// Write the full current snapshot, replacing prior content wholesale.
    pub async fn commit(&self, store: &dyn LedgerStore, table: &str) -> Result<(), StoreError> {
        store.write_table(table, self.to_rows()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::SkuList;

    fn rows() -> Vec<Vec<String>> {
        vec![
            to_row(&["A", "10", "5", "3", "2"]),
            to_row(&["B", "4", "4", "4", "4"]),
            to_row(&["C", "1", "", "0", "1"]),
        ]
    }

    fn to_row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn order(skus: &str, country: &str) -> OrderRecord {
        OrderRecord {
            order_number: 1,
            skus: SkuList::parse(skus),
            country: country.to_string(),
            email: String::new(),
            order_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_bundle_split_decrement() {
        let mut ledger = InventoryLedger::from_rows(rows());
        ledger.decrement(&order("A+B,C", "GB"));

        assert_eq!(ledger.quantity("A", Warehouse::Uk), Some(9));
        assert_eq!(ledger.quantity("B", Warehouse::Uk), Some(3));
        assert_eq!(ledger.quantity("C", Warehouse::Uk), Some(0));
        // Other warehouses untouched.
        assert_eq!(ledger.quantity("A", Warehouse::Usa), Some(5));
    }

    #[test]
    fn test_repeated_bundle_decrements_twice() {
        let mut ledger = InventoryLedger::from_rows(rows());
        ledger.decrement(&order("A+B,A+B", "US"));
        assert_eq!(ledger.quantity("A", Warehouse::Usa), Some(3));
        assert_eq!(ledger.quantity("B", Warehouse::Usa), Some(2));
    }

    #[test]
    fn test_unknown_sku_skipped() {
        let mut ledger = InventoryLedger::from_rows(rows());
        ledger.decrement(&order("NOPE,A", "FR"));
        assert_eq!(ledger.quantity("A", Warehouse::Spns), Some(2));
        assert_eq!(ledger.quantity("NOPE", Warehouse::Spns), None);
    }

    #[test]
    fn test_no_zero_floor() {
        let mut ledger = InventoryLedger::from_rows(rows());
        ledger.decrement(&order("C", "US"));
        ledger.decrement(&order("C", "US"));
        assert_eq!(ledger.quantity("C", Warehouse::Usa), Some(-2));
    }

    #[test]
    fn test_snapshot_preserves_row_order() {
        let ledger = InventoryLedger::from_rows(rows());
        let snapshot = ledger.to_rows();
        assert_eq!(snapshot[0][0], "A");
        assert_eq!(snapshot[2], to_row(&["C", "1", "0", "0", "1"]));
    }
}
