//! Mock stats service
//!
//! Wiremock server standing in for the hit collector.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct StatsMockServer {
    pub server: MockServer,
}

impl StatsMockServer {
    /// Accepts hits and reports no views
    pub async fn start() -> Self {
        Self::with_stats(serde_json::json!([])).await
    }

    /// Accepts hits and answers every stats query with `rows`
    pub async fn with_stats(rows: serde_json::Value) -> Self {
        let server = MockServer::start().await;
        Self::mount_hit(&server).await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Answers stats queries only after `delay`
    pub async fn slow(delay: Duration) -> Self {
        let server = MockServer::start().await;
        Self::mount_hit(&server).await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])).set_delay(delay))
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// URIs of the hits received so far
    pub async fn hit_uris(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == "/hit")
            .filter_map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).ok())
            .filter_map(|v| v["uri"].as_str().map(str::to_string))
            .collect()
    }

    async fn mount_hit(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/hit"))
            .respond_with(ResponseTemplate::new(201))
            .mount(server)
            .await;
    }
}
