pub mod config;
pub mod inventory;
pub mod recon;
pub mod tables;

pub use config::EngineConfig;
pub use inventory::InventoryLedger;
pub use recon::{EngineError, ReconciliationEngine, RunReport};
pub use tables::LedgerTables;
