//! Bitquery analytics source.
//!
//! One 30-day "basic" query for metadata and aggregate trades, followed by
//! six concurrent per-window queries for volume and transaction counts.

pub mod queries;
pub mod response;

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::chains::ChainProfile;
use crate::config::Settings;
use crate::error::ProviderError;
use crate::models::{AnalyticsSnapshot, TimeWindow};
use crate::providers::AnalyticsSource;
use crate::utils::to_iso8601;

use self::queries::{token_data_query, window_metrics_query};
use self::response::{
    build_snapshot, GraphQlEnvelope, TokenDataResponse, WindowMetricsNetwork,
    WindowMetricsResponse,
};

/// GraphQL client for the Bitquery indexing service.
#[derive(Clone)]
pub struct BitqueryClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl BitqueryClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build Bitquery HTTP client")?;

        Ok(Self {
            http,
            endpoint: settings.bitquery_url.clone(),
            api_key: settings.bitquery_api_key().map(str::to_string),
        })
    }

    /// Network identifier for `chain`, failing instead of guessing.
    fn network<'a>(&self, chain: &'a ChainProfile) -> Result<&'a str, ProviderError> {
        chain
            .analytics_network
            .as_deref()
            .ok_or_else(|| ProviderError::UnmappedNetwork(chain.name.clone()))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        api_key: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphQlEnvelope<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        envelope.into_data()
    }

    async fn fetch_window(
        &self,
        api_key: &str,
        chain: &ChainProfile,
        network: &str,
        address: &str,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<(TimeWindow, WindowMetricsNetwork), ProviderError> {
        let response: WindowMetricsResponse = self
            .request(
                api_key,
                window_metrics_query(chain.kind),
                json!({
                    "network": network,
                    "token": address,
                    "from": to_iso8601(&window.since(now)),
                }),
            )
            .await?;
        let metrics = response.into_network()?;

        debug!(
            "Bitquery {} window for {} on {}: {} row(s)",
            window.label(),
            address,
            chain.name,
            metrics.dex_trades.len()
        );

        Ok((window, metrics))
    }

    async fn fetch(
        &self,
        address: &str,
        chain: &ChainProfile,
    ) -> Result<AnalyticsSnapshot, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential)?;
        let network = self.network(chain)?;

        let now = Utc::now();

        let basic: TokenDataResponse = self
            .request(
                api_key,
                token_data_query(chain.kind),
                json!({
                    "network": network,
                    "token": address,
                    "from": to_iso8601(&TimeWindow::D30.since(now)),
                    "till": to_iso8601(&now),
                }),
            )
            .await?;
        let basic = basic.into_network()?;

        // All windows must succeed; the first failure aborts the rest
        let windows = futures::future::try_join_all(
            TimeWindow::ALL
                .iter()
                .map(|window| self.fetch_window(api_key, chain, network, address, *window, now)),
        )
        .await?;

        debug!(
            "Bitquery returned {} transfer row(s) and {} dex row(s) for {} on {}",
            basic.transfers.len(),
            basic.dex_trades.len(),
            address,
            chain.name
        );

        Ok(build_snapshot(basic, windows))
    }
}

#[async_trait]
impl AnalyticsSource for BitqueryClient {
    async fn fetch_analytics(
        &self,
        address: &str,
        chain: &ChainProfile,
    ) -> Result<AnalyticsSnapshot, ProviderError> {
        self.fetch(address, chain).await.map_err(|e| {
            error!("Bitquery API error for {} on {}: {}", address, chain.name, e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    use crate::chains::{ChainKind, ChainTable};

    #[derive(Clone, Copy)]
    enum Reply {
        Success,
        ServerError,
        FirstWindowRejected,
    }

    /// Local Bitquery stand-in that records every request it receives.
    struct StubServer {
        reply: Reply,
        requests: AtomicUsize,
        window_requests: AtomicUsize,
        authorizations: Mutex<Vec<String>>,
        variables: Mutex<Vec<Value>>,
    }

    impl StubServer {
        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    async fn answer(
        State(stub): State<Arc<StubServer>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        stub.requests.fetch_add(1, Ordering::SeqCst);
        let authorization = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        stub.authorizations.lock().unwrap().push(authorization);
        let variables = body["variables"].clone();
        stub.variables.lock().unwrap().push(variables.clone());

        // Only the basic query carries `till`
        let is_window = variables.get("till").is_none();

        match stub.reply {
            Reply::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "upstream unavailable" })),
            ),
            Reply::FirstWindowRejected
                if is_window && stub.window_requests.fetch_add(1, Ordering::SeqCst) == 0 =>
            {
                (
                    StatusCode::OK,
                    Json(json!({ "data": null, "errors": [{ "message": "query too complex" }] })),
                )
            },
            _ if is_window => (
                StatusCode::OK,
                Json(json!({
                    "data": { "ethereum": { "dexTrades": [{ "volumeUSD": 10.0, "transactions": 4 }] } }
                })),
            ),
            _ => (
                StatusCode::OK,
                Json(json!({
                    "data": {
                        "ethereum": {
                            "transfers": [{
                                "currency": { "name": "Polygon Token", "symbol": "PT" },
                                "firstTransaction": 100
                            }],
                            "supply": [{ "totalSupply": 1000.0 }],
                            "dexTrades": [{
                                "tradeAmount": 50.0,
                                "baseAmount": 25.0,
                                "lastPrice": 2.0,
                                "liquidity": 7.5
                            }]
                        }
                    }
                })),
            ),
        }
    }

    async fn spawn_stub(reply: Reply) -> (Arc<StubServer>, BitqueryClient) {
        let stub = Arc::new(StubServer {
            reply,
            requests: AtomicUsize::new(0),
            window_requests: AtomicUsize::new(0),
            authorizations: Mutex::new(Vec::new()),
            variables: Mutex::new(Vec::new()),
        });
        let app = Router::new().route("/", post(answer)).with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let settings = Settings {
            bitquery_api_key: Some("test-key".to_string()),
            bitquery_url: format!("http://{}", addr),
            request_timeout_secs: 5,
            ..Default::default()
        };
        (stub, BitqueryClient::new(&settings).unwrap())
    }

    fn polygon() -> ChainProfile {
        ChainTable::from_settings(&Settings::default())
            .get("polygon")
            .cloned()
            .unwrap()
    }

    fn client(api_key: Option<&str>) -> BitqueryClient {
        let settings = Settings {
            bitquery_api_key: api_key.map(str::to_string),
            // Unroutable so an accidental request fails fast
            bitquery_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        BitqueryClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_request() {
        let chain = ChainProfile::new("ethereum", ChainKind::Evm).with_analytics_network("ethereum");

        let result = client(None).fetch_analytics("0xabc", &chain).await;

        assert!(matches!(result, Err(ProviderError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_unmapped_network_fails_loudly() {
        let chain = ChainProfile::new("fantom", ChainKind::Evm);

        let result = client(Some("key")).fetch_analytics("0xabc", &chain).await;

        match result {
            Err(ProviderError::UnmappedNetwork(name)) => assert_eq!(name, "fantom"),
            other => panic!("expected UnmappedNetwork, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_basic_and_six_window_queries() {
        let (stub, client) = spawn_stub(Reply::Success).await;

        let snapshot = client.fetch_analytics("0xabc", &polygon()).await.unwrap();

        assert_eq!(stub.requests(), 7);
        assert!(stub
            .authorizations
            .lock()
            .unwrap()
            .iter()
            .all(|auth| auth == "Bearer test-key"));
        assert!(stub
            .variables
            .lock()
            .unwrap()
            .iter()
            .all(|vars| vars["network"] == "matic" && vars["token"] == "0xabc"));

        assert_eq!(snapshot.name, "Polygon Token");
        assert_eq!(snapshot.symbol, "PT");
        assert_eq!(snapshot.price, 2.0);
        assert_eq!(snapshot.market_cap, 2000.0);
        assert_eq!(snapshot.liquidity, 7.5);
        assert_eq!(snapshot.launch_block, Some(100));
        assert_eq!(snapshot.volume.h6, 10.0);
        assert_eq!(snapshot.transactions.d30, 4);
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let (stub, client) = spawn_stub(Reply::ServerError).await;

        let result = client.fetch_analytics("0xabc", &polygon()).await;

        match result {
            Err(ProviderError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("upstream unavailable"));
            },
            other => panic!("expected Status, got {:?}", other.map(|_| ())),
        }
        // The basic query fails first, so no window query is sent
        assert_eq!(stub.requests(), 1);
    }

    #[tokio::test]
    async fn test_rejected_window_aborts_snapshot() {
        let (_stub, client) = spawn_stub(Reply::FirstWindowRejected).await;

        let result = client.fetch_analytics("0xabc", &polygon()).await;

        match result {
            Err(ProviderError::GraphQl(message)) => assert_eq!(message, "query too complex"),
            other => panic!("expected GraphQl, got {:?}", other.map(|_| ())),
        }
    }
}
