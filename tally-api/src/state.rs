use std::sync::Arc;
use tally_engine::ReconciliationEngine;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReconciliationEngine>,
    /// One run at a time; concurrent triggers queue behind this.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(engine: ReconciliationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}
