use crate::app_config::SourceConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use serde::Deserialize;
use tally_core::{Cursor, OrderPage, OrderQuery, OrderSource, RemoteOrder, SourceError, StatusFilter};
use tracing::debug;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const FIELDS: &str = "order_number,fulfillment_status,line_items,email,created_at,shipping_address";

/// `OrderSource` over the Shopify Admin REST orders endpoint.
///
/// Pagination follows the `Link` response header: the `rel="next"` URL is
/// handed back as an opaque `Cursor` and followed verbatim on the next call.
pub struct ShopifyOrderSource {
    http: reqwest::Client,
    orders_url: String,
    token: String,
    page_size: u32,
}

impl ShopifyOrderSource {
    pub fn new(config: &SourceConfig) -> Self {
        let orders_url = format!(
            "https://{}.myshopify.com/admin/api/{}/orders.json",
            config.shop, config.api_version
        );
        Self {
            http: reqwest::Client::new(),
            orders_url,
            token: config.access_token.clone(),
            page_size: config.page_size,
        }
    }
}

#[derive(Deserialize)]
struct OrdersEnvelope {
    #[serde(default)]
    orders: Vec<RemoteOrder>,
}

#[async_trait]
impl OrderSource for ShopifyOrderSource {
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, SourceError> {
        let request = match &query.cursor {
            // A cursor is a ready-to-follow next-page URL.
            Some(cursor) => self.http.get(cursor.as_str()),
            None => {
                let status = match query.status {
                    StatusFilter::Open => "open",
                    StatusFilter::Any => "any",
                };
                self.http.get(&self.orders_url).query(&[
                    ("status", status.to_string()),
                    ("created_at_min", query.created_at_min.to_rfc3339()),
                    ("limit", self.page_size.to_string()),
                    ("fields", FIELDS.to_string()),
                ])
            }
        };

        let response = request
            .header(ACCESS_TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceError::Transport(format!(
                "{} from orders endpoint",
                response.status()
            )));
        }

        let next = next_cursor(response.headers());
        let envelope: OrdersEnvelope = response
            .json()
            .await
            .map_err(|err| SourceError::Payload(err.to_string()))?;
        debug!(orders = envelope.orders.len(), has_next = next.is_some(), "orders page fetched");

        Ok(OrderPage {
            orders: envelope.orders,
            next,
        })
    }
}

/// Extract the `rel="next"` target from a `Link` header, if present.
fn next_cursor(headers: &HeaderMap) -> Option<Cursor> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',')
        .find(|part| part.contains("rel=\"next\""))
        .and_then(|part| part.split(';').next())
        .map(|url| Cursor::new(url.trim().trim_start_matches('<').trim_end_matches('>')))
}
