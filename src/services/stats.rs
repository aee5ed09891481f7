//! Stats (view counter) client
//!
//! HTTP client for the hit collector: `POST /hit` records a visit and
//! `GET /stats` returns hit counts per URI. Calls carry bounded timeouts and
//! are never retried.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::StatsConfig;
use crate::models::stats::{EndpointHit, StatsQuery, ViewStats};
use crate::utils::errors::{EventHubError, Result, StatsError, StatsResult};
use crate::utils::helpers::format_timestamp;
use crate::utils::logging::log_stats_failure;

/// Hit counting collaborator
#[async_trait]
pub trait ViewCounter: Send + Sync {
    /// Record one visit of `hit.uri`
    async fn hit(&self, hit: &EndpointHit) -> StatsResult<()>;

    /// Hit counts for the queried URIs
    async fn stats(&self, query: &StatsQuery) -> StatsResult<Vec<ViewStats>>;
}

/// [`ViewCounter`] backed by the stats HTTP service
#[derive(Debug, Clone)]
pub struct StatsClient {
    client: Client,
    base_url: String,
    app_name: String,
}

impl StatsClient {
    pub fn new(config: &StatsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .user_agent("event-hub/0.1")
            .build()
            .map_err(EventHubError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_name: config.app_name.clone(),
        })
    }

    /// Application name reported with every hit
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    fn map_send_error(e: reqwest::Error) -> StatsError {
        if e.is_timeout() {
            StatsError::Timeout
        } else if e.is_connect() {
            StatsError::ServiceUnavailable
        } else {
            StatsError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl ViewCounter for StatsClient {
    async fn hit(&self, hit: &EndpointHit) -> StatsResult<()> {
        let url = format!("{}/hit", self.base_url);
        debug!(uri = %hit.uri, ip = %hit.ip, "Sending hit to stats service");

        let response = self
            .client
            .post(&url)
            .json(hit)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StatsError::RequestFailed(format!("HTTP {}: {}", status, body)))
            }
        }
    }

    async fn stats(&self, query: &StatsQuery) -> StatsResult<Vec<ViewStats>> {
        let url = format!("{}/stats", self.base_url);

        let mut params: Vec<(&str, String)> = vec![
            ("start", format_timestamp(query.start)),
            ("end", format_timestamp(query.end)),
        ];
        params.extend(query.uris.iter().map(|uri| ("uris", uri.clone())));
        params.push(("unique", query.unique.to_string()));

        debug!(uris = query.uris.len(), unique = query.unique, "Requesting view stats");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StatsError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        let body = response.text().await.map_err(Self::map_send_error)?;
        serde_json::from_str(&body).map_err(|e| StatsError::InvalidResponse(e.to_string()))
    }
}

/// Post a hit without waiting for the outcome; failures are only logged
pub fn record_hit_in_background(counter: Arc<dyn ViewCounter>, hit: EndpointHit) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = counter.hit(&hit).await {
            log_stats_failure("hit", &e.to_string(), Some(&hit.uri));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str, read_timeout_ms: u64) -> StatsConfig {
        StatsConfig {
            base_url: base_url.to_string(),
            app_name: "ewm-main-service".to_string(),
            connect_timeout_ms: 1_000,
            read_timeout_ms,
        }
    }

    fn query(uris: &[&str]) -> StatsQuery {
        StatsQuery {
            start: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2030, 1, 2, 0, 0, 0).unwrap(),
            uris: uris.iter().map(|u| u.to_string()).collect(),
            unique: true,
        }
    }

    #[tokio::test]
    async fn test_hit_posts_wire_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hit"))
            .and(body_json(serde_json::json!({
                "app": "ewm-main-service",
                "uri": "/events/3",
                "ip": "10.0.0.1",
                "timestamp": "2030-01-01 10:00:00"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = StatsClient::new(&config(&server.uri(), 1_000)).unwrap();
        let hit = EndpointHit {
            app: client.app_name().to_string(),
            uri: "/events/3".to_string(),
            ip: "10.0.0.1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap(),
        };
        client.hit(&hit).await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_sends_query_and_parses_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .and(query_param("start", "2030-01-01 00:00:00"))
            .and(query_param("end", "2030-01-02 00:00:00"))
            .and(query_param("unique", "true"))
            .and(query_param("uris", "/events/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"app": "ewm-main-service", "uri": "/events/1", "hits": 4},
                {"app": "ewm-main-service", "uri": "/events/2", "hits": 1}
            ])))
            .mount(&server)
            .await;

        let client = StatsClient::new(&config(&server.uri(), 1_000)).unwrap();
        let rows = client.stats(&query(&["/events/1", "/events/2"])).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].hits, 4);
    }

    #[tokio::test]
    async fn test_stats_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = StatsClient::new(&config(&server.uri(), 100)).unwrap();
        let err = client.stats(&query(&["/events/1"])).await.unwrap_err();
        assert_matches!(err, StatsError::Timeout);
    }

    #[tokio::test]
    async fn test_stats_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = StatsClient::new(&config(&server.uri(), 1_000)).unwrap();
        let err = client.stats(&query(&["/events/1"])).await.unwrap_err();
        assert_matches!(err, StatsError::InvalidResponse(_));
    }

    #[tokio::test]
    async fn test_hit_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hit"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = StatsClient::new(&config(&server.uri(), 1_000)).unwrap();
        let hit = EndpointHit {
            app: "ewm-main-service".to_string(),
            uri: "/events".to_string(),
            ip: "127.0.0.1".to_string(),
            timestamp: Utc::now(),
        };
        let err = client.hit(&hit).await.unwrap_err();
        assert_matches!(err, StatsError::RequestFailed(message) if message.contains("500"));
    }

    #[tokio::test]
    async fn test_background_hit_swallows_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hit"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client: Arc<dyn ViewCounter> = Arc::new(StatsClient::new(&config(&server.uri(), 1_000)).unwrap());
        let hit = EndpointHit {
            app: "ewm-main-service".to_string(),
            uri: "/events/9".to_string(),
            ip: "127.0.0.1".to_string(),
            timestamp: Utc::now(),
        };
        record_hit_in_background(client, hit).await.unwrap();
    }
}
