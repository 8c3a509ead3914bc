use crate::models::{Bucket, FulfillmentStatus, OrderRecord, RemoteOrder};
use crate::routing::Region;
use crate::sku::SkuList;

/// Where a classified order goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Terminal: decrement inventory, never stored in a ledger table.
    Fulfilled,
    /// File under the given bucket's ledger table.
    Shelve(Bucket),
}

#[derive(Debug, Clone)]
pub struct Classified {
    pub disposition: Disposition,
    pub record: OrderRecord,
}

/// Normalize a raw remote order and assign its fulfillment bucket.
///
/// Returns `None` for orders without a shipping destination; those are
/// skipped entirely. For partially fulfilled orders only the still-unshipped
/// line items contribute SKUs. The creation timestamp is truncated to its
/// calendar date.
pub fn classify(order: &RemoteOrder) -> Option<Classified> {
    let country = order
        .shipping_address
        .as_ref()?
        .country_code
        .as_deref()?
        .to_string();

    let partial = order.fulfillment_status == Some(FulfillmentStatus::Partial);
    let tokens = order
        .line_items
        .iter()
        .filter(|item| !partial || item.is_unfulfilled())
        .filter_map(|item| item.sku.as_deref())
        .filter(|sku| !sku.is_empty());
    let skus = SkuList::from_tokens(tokens);

    let record = OrderRecord {
        order_number: order.order_number,
        skus,
        email: order.email.clone().unwrap_or_default(),
        order_date: order.created_at.date_naive(),
        country: country.clone(),
    };

    let disposition = match order.fulfillment_status {
        Some(FulfillmentStatus::Fulfilled) => Disposition::Fulfilled,
        Some(FulfillmentStatus::Partial) => Disposition::Shelve(Bucket::Partial),
        _ => Disposition::Shelve(Bucket::for_region(Region::of(&country))),
    };

    Some(Classified {
        disposition,
        record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, ShippingAddress};
    use chrono::DateTime;

    fn raw(status: Option<&str>, country: Option<&str>, items: Vec<LineItem>) -> RemoteOrder {
        let status_json = match status {
            Some(s) => format!("\"{s}\""),
            None => "null".to_string(),
        };
        let mut order: RemoteOrder = serde_json::from_str(&format!(
            r#"{{"order_number": 42, "fulfillment_status": {status_json}, "created_at": "2024-05-02T17:45:00+01:00"}}"#
        ))
        .unwrap();
        order.line_items = items;
        order.email = Some("a@b.com".to_string());
        order.shipping_address = country.map(|code| ShippingAddress {
            country_code: Some(code.to_string()),
        });
        order
    }

    fn item(sku: &str, status: Option<&str>) -> LineItem {
        LineItem {
            sku: Some(sku.to_string()),
            fulfillment_status: status.map(String::from),
        }
    }

    #[test]
    fn test_skips_without_destination() {
        assert!(classify(&raw(None, None, vec![item("A", None)])).is_none());
    }

    #[test]
    fn test_partial_keeps_only_unshipped_items() {
        let order = raw(
            Some("partial"),
            Some("GB"),
            vec![item("A", Some("fulfilled")), item("B", None)],
        );
        let classified = classify(&order).unwrap();
        assert_eq!(classified.disposition, Disposition::Shelve(Bucket::Partial));
        assert_eq!(classified.record.skus.to_string(), "B");
    }

    #[test]
    fn test_non_partial_keeps_all_items() {
        let order = raw(
            None,
            Some("US"),
            vec![item("A", Some("fulfilled")), item("B", None)],
        );
        let classified = classify(&order).unwrap();
        assert_eq!(classified.disposition, Disposition::Shelve(Bucket::Usa));
        assert_eq!(classified.record.skus.to_string(), "A,B");
    }

    #[test]
    fn test_fulfilled_is_terminal() {
        let order = raw(Some("fulfilled"), Some("FR"), vec![item("A", None)]);
        let classified = classify(&order).unwrap();
        assert_eq!(classified.disposition, Disposition::Fulfilled);
    }

    #[test]
    fn test_region_buckets() {
        for (country, bucket) in [
            ("GB", Bucket::Uk),
            ("US", Bucket::Usa),
            ("SG", Bucket::Apac),
            ("FR", Bucket::Other),
        ] {
            let classified = classify(&raw(None, Some(country), vec![])).unwrap();
            assert_eq!(classified.disposition, Disposition::Shelve(bucket));
        }
    }

    #[test]
    fn test_date_truncation() {
        let order = raw(None, Some("GB"), vec![]);
        let classified = classify(&order).unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-05-02T17:45:00+01:00")
            .unwrap()
            .date_naive();
        assert_eq!(classified.record.order_date, expected);
    }
}
