//! Critical error alerting.
//!
//! A tracing layer that captures ERROR-level events (failed newsletter
//! dispatches, store errors from background jobs) and forwards them to a
//! sink, so failures on detached tasks are more than a console line.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/// A captured error event on its way to the sink.
#[derive(Debug, Clone)]
pub struct Alert {
    pub target: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, thiserror::Error)]
#[error("Alert delivery failed: {0}")]
pub struct AlertDeliveryError(String);

/// Where alerts end up.
enum AlertSink {
    /// stderr, for development.
    Console,
    /// POST to a webhook URL with a Slack-compatible payload.
    Webhook { url: String, client: reqwest::Client },
}

impl AlertSink {
    async fn deliver(&self, alert: Alert) -> Result<(), AlertDeliveryError> {
        match self {
            AlertSink::Console => {
                let fields: String = alert
                    .fields
                    .iter()
                    .map(|(k, v)| format!("\n  {}: {}", k, v))
                    .collect();
                eprintln!(
                    "CRITICAL ALERT [{}] {}\n  at: {}{}",
                    alert.target, alert.message, alert.timestamp, fields
                );
                Ok(())
            }
            AlertSink::Webhook { url, client } => {
                let payload = serde_json::json!({
                    "text": format!(
                        "*CRITICAL ERROR*\n*Target:* {}\n*Message:* {}\n*Time:* {}",
                        alert.target, alert.message, alert.timestamp
                    )
                });

                client
                    .post(url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| AlertDeliveryError(e.to_string()))?;

                Ok(())
            }
        }
    }
}

/// Tracing layer that forwards ERROR events to an [`AlertSink`].
pub struct AlertLayer {
    tx: mpsc::Sender<Alert>,
}

impl AlertLayer {
    /// Alerts go to stderr.
    pub fn console() -> Self {
        Self::with_sink(AlertSink::Console)
    }

    /// Alerts go to a webhook (Slack, Discord, etc.).
    pub fn webhook(url: String) -> Self {
        Self::with_sink(AlertSink::Webhook {
            url,
            client: reqwest::Client::new(),
        })
    }

    fn with_sink(sink: AlertSink) -> Self {
        let (tx, mut rx) = mpsc::channel::<Alert>(64);

        // Delivery happens off the hot path on a background task.
        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                if let Err(e) = sink.deliver(alert).await {
                    eprintln!("{}", e);
                }
            }
        });

        Self { tx }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != tracing::Level::ERROR {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        // Non-blocking send; a full buffer drops the alert rather than
        // stalling the event.
        let _ = self.tx.try_send(Alert {
            target: event.metadata().target().to_string(),
            message: visitor.message,
            timestamp: Utc::now(),
            fields: visitor.fields,
        });
    }
}
