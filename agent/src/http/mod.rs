//! HTTP stats source backed by `reqwest`.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use sofatracker_core::errors::FetchError;
use sofatracker_core::provider::{Endpoint, StatsSource};

/// Fetches endpoints from the stats backend at `api_base`.
///
/// Every request carries a `t=<epoch millis>` query parameter so
/// intermediaries never serve a cached stat line.
#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    api_base: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl HttpStatsSource {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.api_base, endpoint.path())
    }
}

#[async_trait::async_trait]
impl StatsSource for HttpStatsSource {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
        let path = endpoint.path();
        let url = self.url(endpoint);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("t", Utc::now().timestamp_millis())])
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(format!("{path}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(path));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                endpoint: path,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Malformed(format!("{path}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn live(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        // Echo the cache-buster back so the test can see it was sent.
        Json(json!({"events": [], "t": query.get("t").cloned()}))
    }

    async fn player(Path((match_id, name)): Path<(u64, String)>) -> Json<Value> {
        Json(json!({"matchId": match_id, "name": name, "tackles": 2}))
    }

    async fn broken_lineups() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    async fn not_json() -> &'static str {
        "<html>maintenance</html>"
    }

    /// Serve the fake backend on an ephemeral port and return its base URL.
    async fn serve() -> String {
        let app = Router::new()
            .route("/live", get(live))
            .route("/player/:match_id/:name", get(player))
            .route("/lineups/:match_id", get(broken_lineups))
            .route("/lineups/0", get(not_json));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn source(base: &str) -> HttpStatsSource {
        HttpStatsSource::new(base, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn sends_cache_buster() {
        let base = serve().await;
        let value = source(&base).fetch(&Endpoint::Live).await.unwrap();
        let t: i64 = value["t"].as_str().unwrap().parse().unwrap();
        assert!(t > 0);
    }

    #[tokio::test]
    async fn player_name_is_url_encoded() {
        let base = serve().await;
        let value = source(&base)
            .fetch(&Endpoint::Player {
                match_id: 9,
                name: "De La Cruz".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(value["matchId"], 9);
        assert_eq!(value["name"], "De La Cruz");
    }

    #[tokio::test]
    async fn status_codes_map_to_fetch_errors() {
        let base = serve().await;
        let source = source(&base);

        let err = source
            .fetch(&Endpoint::Lineups { match_id: 4 })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));

        let err = source
            .fetch(&Endpoint::Player {
                match_id: 1,
                name: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));

        let err = source
            .fetch(&Endpoint::Lineups { match_id: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_backend() {
        // Bind and drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = source(&format!("http://{addr}"))
            .fetch(&Endpoint::Live)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unreachable(_)));
    }
}
