use crate::routing::Region;
use crate::sku::SkuList;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Canonical order identity. Every set and map operation uses this integer
/// form; string conversion happens only at the store boundary.
pub type OrderNumber = i64;

/// Fulfillment state as reported by the remote order source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Fulfilled,
    Partial,
    #[serde(other)]
    Other,
}

/// An order as it arrives from the remote source.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrder {
    pub order_number: OrderNumber,
    #[serde(default)]
    pub fulfillment_status: Option<FulfillmentStatus>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub sku: Option<String>,
    /// Per-item status; empty or absent means the item has not shipped.
    #[serde(default)]
    pub fulfillment_status: Option<String>,
}

impl LineItem {
    pub fn is_unfulfilled(&self) -> bool {
        self.fulfillment_status
            .as_deref()
            .map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub country_code: Option<String>,
}

/// The mutually exclusive categories an unfinished order is filed under.
/// Each bucket owns exactly one ledger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    Uk,
    Usa,
    Apac,
    Other,
    Partial,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Uk,
        Bucket::Usa,
        Bucket::Apac,
        Bucket::Other,
        Bucket::Partial,
    ];

    pub fn for_region(region: Region) -> Self {
        match region {
            Region::Uk => Bucket::Uk,
            Region::Usa => Bucket::Usa,
            Region::Apac => Bucket::Apac,
            Region::Other => Bucket::Other,
        }
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A normalized order as held in a ledger table. Never mutated in place:
/// a bucket change is a delete-then-reinsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_number: OrderNumber,
    pub skus: SkuList,
    pub country: String,
    pub email: String,
    pub order_date: NaiveDate,
}

impl OrderRecord {
    /// Serialize to the five-column ledger row form.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.order_number.to_string(),
            self.skus.to_string(),
            self.country.clone(),
            self.email.clone(),
            self.order_date.format(DATE_FORMAT).to_string(),
        ]
    }

    /// Parse a ledger row. Returns `None` for rows missing the order number
    /// or date; middle columns tolerate trailing-cell truncation.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let order_number = row.first()?.trim().parse().ok()?;
        let order_date = NaiveDate::parse_from_str(row.get(4)?.trim(), DATE_FORMAT).ok()?;
        Some(Self {
            order_number,
            skus: SkuList::parse(row.get(1).map(String::as_str).unwrap_or("")),
            country: row.get(2).cloned().unwrap_or_default(),
            email: row.get(3).cloned().unwrap_or_default(),
            order_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> OrderRecord {
        OrderRecord {
            order_number: 1001,
            skus: SkuList::parse("A+B,C"),
            country: "US".to_string(),
            email: "buyer@example.com".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_row_round_trip() {
        let row = record().to_row();
        assert_eq!(row[0], "1001");
        assert_eq!(row[4], "2024-01-01");
        assert_eq!(OrderRecord::from_row(&row).unwrap(), record());
    }

    #[test]
    fn test_malformed_rows_rejected() {
        assert!(OrderRecord::from_row(&[]).is_none());
        let mut row = record().to_row();
        row[0] = "not-a-number".to_string();
        assert!(OrderRecord::from_row(&row).is_none());
        let short = vec!["1001".to_string(), "A".to_string()];
        assert!(OrderRecord::from_row(&short).is_none());
    }

    #[test]
    fn test_status_deserialization() {
        let order: RemoteOrder = serde_json::from_str(
            r#"{"order_number": 7, "fulfillment_status": "restocked", "created_at": "2024-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(order.fulfillment_status, Some(FulfillmentStatus::Other));
        assert!(order.line_items.is_empty());
        assert!(order.shipping_address.is_none());
    }
}
