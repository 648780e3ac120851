use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{Application, ApplicationStatus};
use crate::services::notification_service::NotificationGateway;
use crate::store::{ApplicationPatch, ApplicationStore, DirectoryStore};
use crate::utils::time;

/// Periodic sweeps over the application store, independent of request
/// traffic. Each tick runs two passes: reminder emails for interviews
/// starting inside the lookahead window, and auto-denial of confirmation
/// requests whose token expired unanswered.
#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn ApplicationStore>,
    directory: Arc<dyn DirectoryStore>,
    notifier: Arc<dyn NotificationGateway>,
    lookahead: Duration,
    webapp_url: String,
}

impl ReminderService {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        directory: Arc<dyn DirectoryStore>,
        notifier: Arc<dyn NotificationGateway>,
        lookahead: Duration,
        webapp_url: String,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            lookahead,
            webapp_url,
        }
    }

    /// Sends at most one reminder per application. Each record is claimed
    /// first (reminder_sent false -> true, atomically), so concurrent sweep
    /// instances cannot double-send; a failed send releases the claim and
    /// the next tick retries. Delivery is therefore at-least-once.
    pub async fn run_reminder_sweep(&self) -> Result<usize> {
        let now = time::now();
        let due = self
            .store
            .find_reminders_due(now, now + self.lookahead)
            .await?;

        let mut sent = 0;
        for app in due {
            if !self.store.claim_reminder(app.id).await? {
                continue;
            }
            match self.send_reminder(&app).await {
                Ok(true) => sent += 1,
                // No contact on file: keep the claim, retrying cannot help.
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        application_id = %app.id,
                        error = ?e,
                        "Reminder delivery failed, releasing claim"
                    );
                    self.store.release_reminder(app.id).await?;
                }
            }
        }

        if sent > 0 {
            tracing::info!(count = sent, "Interview reminders sent");
        }
        Ok(sent)
    }

    /// Denies confirmation-pending applications whose token expired. The
    /// conditional update keeps this safe against a confirmation landing
    /// between the query and the write.
    pub async fn run_expiry_sweep(&self) -> Result<usize> {
        let now = time::now();
        let expired = self.store.find_expired_confirmations(now).await?;

        let mut denied = 0;
        for app in expired {
            let updated = self
                .store
                .conditional_update(
                    app.id,
                    ApplicationStatus::ConfirmationPending,
                    ApplicationPatch::status(ApplicationStatus::Denied).clearing_token(),
                )
                .await?;
            let Some(updated) = updated else {
                continue;
            };
            denied += 1;
            tracing::info!(application_id = %updated.id, "Confirmation expired, application denied");
            if let Err(e) = self
                .send_email(
                    updated.candidate_id,
                    "Confirmation Window Expired",
                    "confirmation_expired",
                    json!({}),
                )
                .await
            {
                tracing::error!(application_id = %updated.id, error = ?e, "Expiry email failed");
            }
        }
        Ok(denied)
    }

    /// Returns Ok(false) when the candidate has no contact on file.
    async fn send_reminder(&self, app: &Application) -> Result<bool> {
        let Some(contact) = self.directory.candidate_contact(app.candidate_id).await? else {
            tracing::warn!(
                application_id = %app.id,
                candidate_id = %app.candidate_id,
                "No contact on file, reminder skipped"
            );
            return Ok(false);
        };

        let join_url = format!(
            "{}/call/{}/{}",
            self.webapp_url, app.candidate_id, app.company_id
        );
        self.notifier
            .send(
                &contact.email,
                "Interview Reminder",
                "interview_reminder",
                json!({
                    "candidate_name": contact.name,
                    "interview_date": app.interview_date,
                    "access_credential": app.access_credential,
                    "join_url": join_url,
                }),
            )
            .await?;
        Ok(true)
    }

    async fn send_email(
        &self,
        candidate_id: Uuid,
        subject: &str,
        template: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        let Some(contact) = self.directory.candidate_contact(candidate_id).await? else {
            return Ok(());
        };
        self.notifier
            .send(&contact.email, subject, template, data)
            .await
    }
}
