//! GE Tracker API client for Grand Exchange price data
//!
//! Same client shape as the Wise Old Man client: rate limited, retried on
//! server errors, never retried on client errors. Authentication is a Bearer
//! token plus GE Tracker's versioned Accept header.

use crate::error::{PartyError, Result};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, info, instrument, warn};

/// Default base URL for the GE Tracker API
pub const DEFAULT_BASE_URL: &str = "https://www.ge-tracker.com/api";

/// Versioned media type GE Tracker expects in the Accept header
const ACCEPT_HEADER: &str = "application/x.getracker.v2.1+json";

/// Configuration for the GE Tracker API client
#[derive(Debug, Clone)]
pub struct GeTrackerConfig {
    /// Base URL of the API
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Rate limit: requests per minute (default: 60)
    pub rate_limit_per_min: u32,
    /// Maximum number of retry attempts (default: 3)
    pub max_retries: usize,
}

impl Default for GeTrackerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: 30,
            rate_limit_per_min: 60,
            max_retries: 3,
        }
    }
}

impl GeTrackerConfig {
    /// Create a new configuration with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Override the base URL (used by tests against a local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the rate limit
    pub fn with_rate_limit(mut self, rate_limit_per_min: u32) -> Self {
        self.rate_limit_per_min = rate_limit_per_min;
        self
    }

    /// Set the maximum retry attempts
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// GE Tracker API client
#[derive(Debug, Clone)]
pub struct GeTrackerClient {
    client: Client,
    config: GeTrackerConfig,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl GeTrackerClient {
    /// Create a new client with the given configuration
    pub fn new(config: GeTrackerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PartyError::network_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_minute(
            NonZeroU32::new(config.rate_limit_per_min)
                .ok_or_else(|| PartyError::config("Rate limit must be greater than 0"))?,
        );
        let rate_limiter = Arc::new(DefaultDirectRateLimiter::direct(quota));

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Make an authenticated GET request with retry logic
    #[instrument(skip(self), fields(path = %path))]
    async fn make_request(&self, path: &str) -> Result<Response> {
        self.rate_limiter.until_ready().await;

        let url = self.build_url(path);
        debug!("Making request to: {}", url);

        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(10))
            .take(self.config.max_retries);

        // 4xx responses are final; only transient failures reach a retry
        let response = RetryIf::spawn(
            retry_strategy,
            || async {
                let request = self
                    .client
                    .get(&url)
                    .bearer_auth(&self.config.api_key)
                    .header(reqwest::header::ACCEPT, ACCEPT_HEADER);

                match request.send().await {
                    Ok(response) => {
                        if response.status().is_success() {
                            debug!("Request successful: {}", response.status());
                            Ok(response)
                        } else if response.status().is_client_error() {
                            error!("Client error: {}", response.status());
                            Err(PartyError::ge_tracker_with_status(
                                format!("API returned client error: {}", response.status()),
                                response.status().as_u16(),
                            ))
                        } else {
                            warn!("Server error, will retry: {}", response.status());
                            Err(PartyError::ge_tracker_with_status(
                                format!("API returned server error: {}", response.status()),
                                response.status().as_u16(),
                            ))
                        }
                    }
                    Err(e) if e.is_timeout() => {
                        warn!("Request timeout, will retry: {}", e);
                        Err(PartyError::network_with_source("Request timeout", e))
                    }
                    Err(e) if e.is_connect() => {
                        warn!("Connection error, will retry: {}", e);
                        Err(PartyError::network_with_source("Connection error", e))
                    }
                    Err(e) => {
                        error!("Request failed: {}", e);
                        Err(PartyError::network_with_source("Request failed", e))
                    }
                }
            },
            PartyError::is_retryable,
        )
        .await?;

        Ok(response)
    }

    /// Make a request and unwrap GE Tracker's `data` envelope
    async fn request_data<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.make_request(path).await?;
        let text = response
            .text()
            .await
            .map_err(|e| PartyError::network_with_source("Failed to read response body", e))?;

        let envelope: GeTrackerResponse<T> =
            serde_json::from_str(&text).map_err(PartyError::from)?;
        Ok(envelope.data)
    }

    /// Search items by name fragment, for autocomplete and price lookups
    #[instrument(skip(self))]
    pub async fn search_items(&self, name: &str) -> Result<Vec<ItemSummary>> {
        info!("Searching GE Tracker items for '{}'", name);
        let encoded: String = name
            .chars()
            .map(|c| if c == ' ' { '+' } else { c })
            .collect();
        self.request_data(&format!("items/search/{}", encoded)).await
    }

    /// Fetch full price details for a single item
    #[instrument(skip(self))]
    pub async fn item(&self, item_id: i64) -> Result<ItemDetail> {
        info!("Fetching GE Tracker item {}", item_id);
        self.request_data(&format!("items/{}", item_id)).await
    }

    /// Fetch the current highest-margin flip candidates
    #[instrument(skip(self))]
    pub async fn highest_margins(&self) -> Result<Vec<ItemDetail>> {
        info!("Fetching GE Tracker highest margins");
        self.request_data("highest-margins").await
    }

    /// Fetch current blast furnace money-making rates
    #[instrument(skip(self))]
    pub async fn blast_furnace(&self) -> Result<Vec<BlastFurnaceMethod>> {
        info!("Fetching GE Tracker blast furnace rates");
        self.request_data("blast-furnace").await
    }
}

// ============================================================================
// API Response Models
// ============================================================================

/// Envelope wrapping every GE Tracker response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeTrackerResponse<T> {
    pub data: T,
}

/// Minimal item record returned by the search endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    /// In-game item ID
    pub item_id: i64,
    /// Item name
    pub name: String,
}

/// Full item price record
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    /// In-game item ID
    pub item_id: i64,
    /// Item name
    pub name: String,
    /// Current instant-buy price
    pub buying: Option<i64>,
    /// Current instant-sell price
    pub selling: Option<i64>,
    /// Volume traded at the buy price
    pub buying_quantity: Option<i64>,
    /// Volume traded at the sell price
    pub selling_quantity: Option<i64>,
    /// Guide price
    pub overall: Option<i64>,
    /// Estimated profit per flip after tax
    pub approx_profit: Option<i64>,
    /// GE buy limit per 4 hours
    pub buy_limit: Option<i64>,
    /// Tax paid on sale
    pub tax: Option<i64>,
}

impl ItemDetail {
    /// Margin between instant-buy and instant-sell, when both are known
    pub fn margin(&self) -> Option<i64> {
        match (self.buying, self.selling) {
            (Some(buy), Some(sell)) => Some(buy - sell),
            _ => None,
        }
    }
}

/// One blast furnace money-making method
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlastFurnaceMethod {
    /// Bar being smelted
    pub name: String,
    /// Cost of the ore (plus coal) per bar
    pub cost: Option<i64>,
    /// Sell price per bar
    pub sale_price: Option<i64>,
    /// Profit per bar
    pub profit: Option<i64>,
    /// Estimated profit per hour
    pub hourly_profit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GeTrackerConfig::new("token");
        assert_eq!(config.api_key, "token");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.rate_limit_per_min, 60);
    }

    #[test]
    fn test_config_builder() {
        let config = GeTrackerConfig::new("token")
            .with_base_url("http://localhost:9001")
            .with_timeout(15)
            .with_rate_limit(10)
            .with_max_retries(1);

        assert_eq!(config.base_url, "http://localhost:9001");
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.rate_limit_per_min, 10);
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_rate_limit_validation() {
        let config = GeTrackerConfig::new("token").with_rate_limit(0);
        assert!(GeTrackerClient::new(config).is_err());
    }

    #[test]
    fn test_url_building() {
        let config = GeTrackerConfig::new("token").with_base_url("http://example.com/");
        let client = GeTrackerClient::new(config).unwrap();
        assert_eq!(
            client.build_url("items/search/rune+scimitar"),
            "http://example.com/items/search/rune+scimitar"
        );
    }

    #[test]
    fn test_item_detail_deserialization() {
        let json = r#"{
            "data": {
                "itemId": 1333,
                "name": "Rune scimitar",
                "buying": 15200,
                "selling": 14900,
                "buyingQuantity": 2100,
                "sellingQuantity": 1800,
                "overall": 15050,
                "approxProfit": 150,
                "buyLimit": 70,
                "tax": 152
            }
        }"#;

        let envelope: GeTrackerResponse<ItemDetail> = serde_json::from_str(json).unwrap();
        let item = envelope.data;
        assert_eq!(item.item_id, 1333);
        assert_eq!(item.name, "Rune scimitar");
        assert_eq!(item.margin(), Some(300));
    }

    #[test]
    fn test_item_detail_missing_prices() {
        let json = r#"{"data": {"itemId": 4151, "name": "Abyssal whip"}}"#;
        let envelope: GeTrackerResponse<ItemDetail> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.margin(), None);
    }

    #[test]
    fn test_search_results_deserialization() {
        let json = r#"{
            "data": [
                {"itemId": 1333, "name": "Rune scimitar"},
                {"itemId": 1319, "name": "Rune 2h sword"}
            ]
        }"#;

        let envelope: GeTrackerResponse<Vec<ItemSummary>> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.len(), 2);
        assert_eq!(envelope.data[1].name, "Rune 2h sword");
    }

    #[test]
    fn test_blast_furnace_deserialization() {
        let json = r#"{
            "data": [
                {
                    "name": "Runite bar",
                    "cost": 11800,
                    "salePrice": 12400,
                    "profit": 600,
                    "hourlyProfit": 900000
                }
            ]
        }"#;

        let envelope: GeTrackerResponse<Vec<BlastFurnaceMethod>> =
            serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data[0].profit, Some(600));
    }

    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Minimal HTTP server answering every request with a fixed status,
    /// counting how many requests it saw
    async fn spawn_status_server(status_line: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{{}}",
                    status_line
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (base_url, hits) = spawn_status_server("401 Unauthorized").await;
        let config = GeTrackerConfig::new("token")
            .with_base_url(base_url)
            .with_max_retries(3);
        let client = GeTrackerClient::new(config).unwrap();

        let err = client.item(1333).await.unwrap_err();
        assert!(matches!(
            err,
            PartyError::GeTracker {
                status_code: Some(401),
                ..
            }
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let (base_url, hits) = spawn_status_server("503 Service Unavailable").await;
        let config = GeTrackerConfig::new("token")
            .with_base_url(base_url)
            .with_max_retries(1);
        let client = GeTrackerClient::new(config).unwrap();

        let err = client.item(1333).await.unwrap_err();
        assert!(matches!(
            err,
            PartyError::GeTracker {
                status_code: Some(503),
                ..
            }
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
