//! Wise Old Man API client with rate limiting and retry logic
//!
//! Talks to the public Wise Old Man v2 API (https://api.wiseoldman.net/v2) to
//! fetch the clan's group roster and pending name changes. Requests carry the
//! group's API key and a descriptive User-Agent, as the API requires.

use crate::error::{PartyError, Result};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, info, instrument, warn};

/// Default base URL for the Wise Old Man v2 API
pub const DEFAULT_BASE_URL: &str = "https://api.wiseoldman.net/v2";

/// Configuration for the Wise Old Man API client
#[derive(Debug, Clone)]
pub struct WomConfig {
    /// Base URL of the API (default: the public v2 endpoint)
    pub base_url: String,
    /// API key sent as the `x-api-key` header
    pub api_key: String,
    /// Value of the `User-Agent` header (WOM asks for a Discord handle here)
    pub user_agent: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Rate limit: requests per minute (default: 90, under WOM's 100/min cap)
    pub rate_limit_per_min: u32,
    /// Maximum number of retry attempts (default: 3)
    pub max_retries: usize,
}

impl Default for WomConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            user_agent: String::new(),
            timeout_secs: 30,
            rate_limit_per_min: 90,
            max_retries: 3,
        }
    }
}

impl WomConfig {
    /// Create a new configuration with the minimum required parameters
    pub fn new(api_key: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user_agent: user_agent.into(),
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

/// Wise Old Man API client
#[derive(Debug, Clone)]
pub struct WomClient {
    client: Client,
    config: WomConfig,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl WomClient {
    /// Create a new client with the given configuration
    pub fn new(config: WomConfig) -> Result<Self> {
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
                    .header("x-api-key", &self.config.api_key)
                    .header(reqwest::header::USER_AGENT, &self.config.user_agent);

                match request.send().await {
                    Ok(response) => {
                        if response.status().is_success() {
                            debug!("Request successful: {}", response.status());
                            Ok(response)
                        } else if response.status().is_client_error() {
                            error!("Client error: {}", response.status());
                            Err(PartyError::wom_with_status(
                                format!("API returned client error: {}", response.status()),
                                response.status().as_u16(),
                            ))
                        } else {
                            warn!("Server error, will retry: {}", response.status());
                            Err(PartyError::wom_with_status(
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

    /// Make a request and parse the JSON response
    async fn request_json<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.make_request(path).await?;
        let text = response
            .text()
            .await
            .map_err(|e| PartyError::network_with_source("Failed to read response body", e))?;

        serde_json::from_str(&text).map_err(PartyError::from)
    }

    /// Fetch the full group details including all memberships
    #[instrument(skip(self))]
    pub async fn group_details(&self, group_id: u64) -> Result<GroupDetail> {
        info!("Fetching WOM group {}", group_id);
        self.request_json(&format!("groups/{}", group_id)).await
    }

    /// Fetch name changes recorded for the group's players
    ///
    /// Only approved changes carry a `resolved_at` timestamp; pending and
    /// denied ones are filtered out by the caller.
    #[instrument(skip(self))]
    pub async fn group_name_changes(&self, group_id: u64) -> Result<Vec<NameChange>> {
        info!("Fetching WOM name changes for group {}", group_id);
        self.request_json(&format!("groups/{}/name-changes", group_id))
            .await
    }
}

// ============================================================================
// API Response Models
// ============================================================================

/// Group details from `GET /groups/{id}`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetail {
    /// Group ID
    pub id: u64,
    /// Group display name
    pub name: String,
    /// In-game clan chat channel, if configured
    pub clan_chat: Option<String>,
    /// Number of members reported by WOM
    pub member_count: Option<u32>,
    /// All current memberships with their group role
    pub memberships: Vec<GroupMembership>,
}

/// A single membership entry within a group
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    /// Group role in WOM's lowercase_snake form (e.g. "deputy_owner")
    pub role: String,
    /// Timestamp the membership was created
    pub created_at: Option<String>,
    /// The player behind the membership
    pub player: Player,
}

/// Player information embedded in membership entries
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// WOM player ID, stable across name changes
    pub id: u64,
    /// Lowercase username
    pub username: String,
    /// Display name with original capitalization
    pub display_name: String,
    /// Account type (regular, ironman, ...)
    #[serde(rename = "type")]
    pub account_type: Option<String>,
}

/// A name change entry from `GET /groups/{id}/name-changes`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameChange {
    /// Name change ID
    pub id: u64,
    /// Player ID the change belongs to
    pub player_id: u64,
    /// Previous name
    pub old_name: String,
    /// New name
    pub new_name: String,
    /// Review status (pending, approved, denied)
    pub status: String,
    /// Timestamp the change was approved, if it was
    pub resolved_at: Option<String>,
}

impl NameChange {
    /// Whether this change was approved and should be applied
    pub fn is_approved(&self) -> bool {
        self.status == "approved" && self.resolved_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = WomConfig::new("wom-key", "discord: tester#0001");
        assert_eq!(config.api_key, "wom-key");
        assert_eq!(config.user_agent, "discord: tester#0001");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30); // default
    }

    #[test]
    fn test_config_builder() {
        let config = WomConfig::new("wom-key", "agent")
            .with_base_url("http://localhost:9000")
            .with_timeout(60)
            .with_rate_limit(30)
            .with_max_retries(5);

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.rate_limit_per_min, 30);
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_url_building() {
        let config = WomConfig::new("key", "agent").with_base_url("http://example.com/");
        let client = WomClient::new(config).unwrap();
        assert_eq!(
            client.build_url("groups/141"),
            "http://example.com/groups/141"
        );
        assert_eq!(
            client.build_url("/groups/141/name-changes"),
            "http://example.com/groups/141/name-changes"
        );
    }

    #[test]
    fn test_rate_limit_validation() {
        let config = WomConfig::new("key", "agent").with_rate_limit(0);
        let result = WomClient::new(config);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("Rate limit must be greater than 0"));
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let config = WomConfig::new("key", "agent");
        assert!(WomClient::new(config).is_ok());
    }

    #[test]
    fn test_group_detail_deserialization() {
        let json = r#"{
            "id": 141,
            "name": "302 Party",
            "clanChat": "302party",
            "memberCount": 2,
            "memberships": [
                {
                    "role": "owner",
                    "createdAt": "2023-01-15T10:00:00.000Z",
                    "player": {
                        "id": 1001,
                        "username": "zezima",
                        "displayName": "Zezima",
                        "type": "regular"
                    }
                },
                {
                    "role": "deputy_owner",
                    "player": {
                        "id": 1002,
                        "username": "durial321",
                        "displayName": "Durial321"
                    }
                }
            ]
        }"#;

        let group: GroupDetail = serde_json::from_str(json).unwrap();
        assert_eq!(group.id, 141);
        assert_eq!(group.name, "302 Party");
        assert_eq!(group.memberships.len(), 2);
        assert_eq!(group.memberships[0].role, "owner");
        assert_eq!(group.memberships[0].player.display_name, "Zezima");
        assert_eq!(group.memberships[1].role, "deputy_owner");
        assert!(group.memberships[1].player.account_type.is_none());
    }

    #[test]
    fn test_name_change_deserialization() {
        let json = r#"[
            {
                "id": 55,
                "playerId": 1001,
                "oldName": "Zezima",
                "newName": "Zezima II",
                "status": "approved",
                "resolvedAt": "2024-02-01T12:00:00.000Z"
            },
            {
                "id": 56,
                "playerId": 1002,
                "oldName": "Durial321",
                "newName": "Durial322",
                "status": "pending",
                "resolvedAt": null
            }
        ]"#;

        let changes: Vec<NameChange> = serde_json::from_str(json).unwrap();
        assert_eq!(changes.len(), 2);
        assert!(changes[0].is_approved());
        assert_eq!(changes[0].old_name, "Zezima");
        assert_eq!(changes[0].new_name, "Zezima II");
        assert!(!changes[1].is_approved());
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
        let (base_url, hits) = spawn_status_server("404 Not Found").await;
        let config = WomConfig::new("key", "agent")
            .with_base_url(base_url)
            .with_max_retries(3);
        let client = WomClient::new(config).unwrap();

        let err = client.group_details(141).await.unwrap_err();
        assert!(matches!(
            err,
            PartyError::Wom {
                status_code: Some(404),
                ..
            }
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let (base_url, hits) = spawn_status_server("500 Internal Server Error").await;
        let config = WomConfig::new("key", "agent")
            .with_base_url(base_url)
            .with_max_retries(1);
        let client = WomClient::new(config).unwrap();

        let err = client.group_details(141).await.unwrap_err();
        assert!(matches!(
            err,
            PartyError::Wom {
                status_code: Some(500),
                ..
            }
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
