use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use super::error::ScrapeError;
use super::types::{Enrichment, ScrapeRequest};

/// Anything that can turn a room identifier into enrichment fields.
///
/// The engine only depends on this trait, so tests can swap the HTTP client
/// for an in-process fake.
#[allow(async_fn_in_trait)]
pub trait Enricher {
    async fn enrich(&self, room_id: &str) -> Result<Enrichment, ScrapeError>;
}

pub struct ScrapeClient {
    client: Client,
    endpoint: String,
}

impl ScrapeClient {
    /// Build a client for the given scrape endpoint. `timeout` bounds each
    /// whole request; a timed-out call surfaces as [`ScrapeError::Network`].
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }
}

impl Enricher for ScrapeClient {
    async fn enrich(&self, room_id: &str) -> Result<Enrichment, ScrapeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ScrapeRequest::new(room_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                body: describe_error_body(&body),
            });
        }

        let bytes = response.bytes().await?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| ScrapeError::InvalidBody(e.to_string()))?;
        Enrichment::try_from(value).map_err(ScrapeError::InvalidBody)
    }
}

/// Compact JSON when the error body parses, otherwise the trimmed raw text.
fn describe_error_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value.to_string();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "<empty body>".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ScrapeClient {
        ScrapeClient::new(
            format!("{}/scrape-room", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_room_id_and_returns_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape-room"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "room_id": "981" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "title": "Studio", "beds": 2 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fields = client_for(&server)
            .enrich("981")
            .await
            .unwrap()
            .into_fields();
        assert_eq!(fields["title"], "Studio");
        assert_eq!(fields["beds"], 2);
    }

    #[tokio::test]
    async fn non_success_status_carries_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(502).set_body_json(json!({ "error": "upstream down" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).enrich("1").await.unwrap_err();
        match err {
            ScrapeError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, r#"{"error":"upstream down"}"#);
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_status_with_plain_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("  internal error \n"))
            .mount(&server)
            .await;

        let err = client_for(&server).enrich("1").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "scrape service returned status 500: internal error"
        );
    }

    #[tokio::test]
    async fn unparseable_success_body_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).enrich("1").await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn non_object_success_body_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a", "b"])))
            .mount(&server)
            .await;

        let err = client_for(&server).enrich("1").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid response body: expected a JSON object, got an array"
        );
    }

    #[tokio::test]
    async fn connection_failure_is_network_error() {
        let client =
            ScrapeClient::new("http://127.0.0.1:1/scrape-room".into(), Duration::from_secs(2))
                .unwrap();
        let err = client.enrich("1").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Network(_)));
    }

    #[test]
    fn describe_error_body_variants() {
        assert_eq!(describe_error_body(r#"{ "a" : 1 }"#), r#"{"a":1}"#);
        assert_eq!(describe_error_body("bad gateway"), "bad gateway");
        assert_eq!(describe_error_body("   "), "<empty body>");
    }
}
