use crate::models::RemoteOrder;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Opaque pagination token. Produced and consumed by an `OrderSource`
/// implementation; callers only pass it back unchanged and loop until no
/// cursor is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which orders a query should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Orders the source still considers unresolved.
    Open,
    /// Every order regardless of state.
    Any,
}

#[derive(Debug, Clone)]
pub struct OrderQuery {
    pub status: StatusFilter,
    pub created_at_min: DateTime<Utc>,
    pub cursor: Option<Cursor>,
}

impl OrderQuery {
    pub fn new(status: StatusFilter, created_at_min: DateTime<Utc>) -> Self {
        Self {
            status,
            created_at_min,
            cursor: None,
        }
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// One page of results; `next` is present while more pages remain.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<RemoteOrder>,
    pub next: Option<Cursor>,
}

/// Paginated feed of orders, queryable by minimum creation date and status.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("order source transport failure: {0}")]
    Transport(String),

    #[error("order source returned an unexpected payload: {0}")]
    Payload(String),
}
