use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn healthz() -> &'static str {
    "ok"
}

/// Trigger one reconciliation run. Succeeds only on full completion; any
/// failure is surfaced with its message and leaves the prior committed
/// ledger state untouched.
pub async fn run(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let _guard = state.run_lock.lock().await;
    let report = state
        .engine
        .run()
        .await
        .map_err(|err| AppError::RunFailed(err.to_string()))?;

    Ok(Json(json!({
        "status": "ok",
        "message": "orders reconciled and ledger updated",
        "report": report,
    })))
}
