//! HTTP webhook notification channel.

use std::time::Duration;

use async_trait::async_trait;
use flightwatch_core::Alert;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::NotificationSink;

/// Event name carried in every webhook payload.
const WEBHOOK_EVENT: &str = "flight.alert";

/// POSTs each alert as JSON to a configured URL.
pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    alert: &'a Alert,
}

impl WebhookSink {
    /// Create a webhook channel with a request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Target URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn dispatch(&self, alert: &Alert) -> Result<(), DispatchError> {
        let payload = WebhookPayload {
            event: WEBHOOK_EVENT,
            alert,
        };

        debug!(channel = "webhook", alert_id = %alert.id, url = %self.url, "Sending notification");

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if response.status().is_success() {
            debug!(channel = "webhook", alert_id = %alert.id, "Notification sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "webhook",
                status = %status,
                body = %body,
                "Webhook request failed"
            );

            Err(DispatchError::Status {
                channel: "webhook".to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use flightwatch_core::types::now;
    use flightwatch_core::{AlertSeverity, AlertType};
    use std::sync::{Arc, Mutex};

    fn alert() -> Alert {
        Alert::new(
            "QP1001",
            AlertType::Delay,
            AlertSeverity::Medium,
            "Flight QP1001 is delayed by 60 minutes",
            vec!["c1".to_string()],
            now(),
        )
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/hook")
    }

    #[tokio::test]
    async fn test_posts_alert_json() {
        let received = Arc::new(Mutex::new(Vec::<serde_json::Value>::new()));
        let sink_store = Arc::clone(&received);
        let router = Router::new().route(
            "/hook",
            post(move |Json(body): Json<serde_json::Value>| {
                let store = Arc::clone(&sink_store);
                async move {
                    store.lock().unwrap().push(body);
                    StatusCode::NO_CONTENT
                }
            }),
        );
        let url = serve(router).await;

        let sink = WebhookSink::new(url, Duration::from_secs(5)).unwrap();
        let alert = alert();
        sink.dispatch(&alert).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["event"], "flight.alert");
        assert_eq!(received[0]["alert"]["id"], alert.id.as_str());
        assert_eq!(received[0]["alert"]["alert_type"], "DELAY");
        assert_eq!(received[0]["alert"]["severity"], "medium");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let url = serve(router).await;

        let sink = WebhookSink::new(url, Duration::from_secs(5)).unwrap();
        match sink.dispatch(&alert()).await {
            Err(DispatchError::Status { status, body, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let sink = WebhookSink::new("http://127.0.0.1:1/hook", Duration::from_millis(500)).unwrap();
        assert!(matches!(
            sink.dispatch(&alert()).await,
            Err(DispatchError::Http(_))
        ));
    }
}
