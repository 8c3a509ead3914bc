use serde::Deserialize;
use tally_core::Bucket;

/// Everything the engine needs to know about the ledger layout, passed in
/// explicitly at construction. Defaults match the production spreadsheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub uk_table: String,
    pub usa_table: String,
    pub apac_table: String,
    pub other_table: String,
    pub partial_table: String,
    pub stock_table: String,
    pub marker_table: String,
    pub marker_cell: String,
    /// Time zone the Last-Run Marker is persisted in.
    pub timezone: chrono_tz::Tz,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            uk_table: "UK".to_string(),
            usa_table: "USA".to_string(),
            apac_table: "StorkUp".to_string(),
            other_table: "SPNS".to_string(),
            partial_table: "Partially Fulfilled".to_string(),
            stock_table: "Stock".to_string(),
            marker_table: "Last Update".to_string(),
            marker_cell: "A2".to_string(),
            timezone: chrono_tz::Europe::London,
        }
    }
}

impl EngineConfig {
    /// Ledger table holding the given bucket's rows.
    pub fn table_for(&self, bucket: Bucket) -> &str {
        match bucket {
            Bucket::Uk => &self.uk_table,
            Bucket::Usa => &self.usa_table,
            Bucket::Apac => &self.apac_table,
            Bucket::Other => &self.other_table,
            Bucket::Partial => &self.partial_table,
        }
    }
}
