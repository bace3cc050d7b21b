//! HTTP Transport
//!
//! `reqwest` implementation of [`WebhookTransport`].

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;

use crate::application::config::WebhookConfig;
use crate::domain::transport::{TransportError, TransportResponse, WebhookTransport};

/// Webhook transport backed by a shared `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client identifying itself with the configured `User-Agent`
    pub fn new(config: &WebhookConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl WebhookTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(map_error)?;

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        Json(json!({
            "received": body,
            "userAgent": header("user-agent"),
            "contentType": header("content-type"),
            "accept": header("accept"),
        }))
    }

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_millis(500)).await;
        "late"
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/echo", post(echo))
            .route("/slow", post(slow))
            .route("/html", post(|| async { axum::response::Html("<p>hi</p>") }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(&WebhookConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_post_json_sends_headers_and_body() {
        let base = spawn_server().await;
        let response = transport()
            .post_json(&format!("{base}/echo"), &json!({ "a": 1 }), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.is_json());

        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["received"], json!({ "a": 1 }));
        assert!(body["userAgent"].as_str().unwrap().starts_with("AssessmentGenerator/"));
        assert_eq!(body["contentType"], "application/json");
        assert_eq!(body["accept"], "application/json");
    }

    #[tokio::test]
    async fn test_non_json_response_is_passed_through() {
        let base = spawn_server().await;
        let response = transport()
            .post_json(&format!("{base}/html"), &json!({ "a": 1 }), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(!response.is_json());
    }

    #[tokio::test]
    async fn test_unknown_route_reports_status() {
        let base = spawn_server().await;
        let response = transport()
            .post_json(&format!("{base}/missing"), &json!({ "a": 1 }), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_timeout() {
        let base = spawn_server().await;
        let err = transport()
            .post_json(&format!("{base}/slow"), &json!({ "a": 1 }), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport()
            .post_json(&format!("http://{addr}/echo"), &json!({ "a": 1 }), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }
}
