use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use crate::error::{Error, Result};

/// Outbound email seam. Sends are best-effort: callers commit state first,
/// then log a failed send and move on.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(&self, to: &str, subject: &str, template: &str, data: JsonValue) -> Result<()>;
}

/// Delivers templated emails through the platform mailer's webhook endpoint.
/// The request timeout bounds how long a lifecycle operation can stall on a
/// slow mailer; a timeout counts as a delivery failure.
#[derive(Clone)]
pub struct EmailNotificationService {
    client: Client,
    mailer_url: String,
    mailer_secret: String,
}

impl EmailNotificationService {
    pub fn new(mailer_url: String, mailer_secret: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build mailer client: {}", e)))?;
        Ok(Self {
            client,
            mailer_url,
            mailer_secret,
        })
    }
}

#[async_trait]
impl NotificationGateway for EmailNotificationService {
    async fn send(&self, to: &str, subject: &str, template: &str, data: JsonValue) -> Result<()> {
        let payload = json!({
            "to": to,
            "subject": subject,
            "template": template,
            "data": data,
        });

        let response = self
            .client
            .post(&self.mailer_url)
            .header("X-Mailer-Secret", &self.mailer_secret)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::NotificationDelivery(format!("{} to {}: {}", template, to, e)))?;

        if !response.status().is_success() {
            return Err(Error::NotificationDelivery(format!(
                "{} to {}: mailer responded {}",
                template,
                to,
                response.status()
            )));
        }
        Ok(())
    }
}
