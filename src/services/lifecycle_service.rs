use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{Actor, Application, ApplicationStatus, LifecycleAction};
use crate::services::notification_service::NotificationGateway;
use crate::store::{ApplicationPatch, ApplicationStore, DirectoryStore, NewApplication};
use crate::utils::time;
use crate::utils::token::{generate_access_token, generate_confirmation_token};

const ACCESS_CREDENTIAL_LENGTH: usize = 16;

/// The application state machine. Every mutation goes through a conditional
/// update keyed on the status the decision was made against, so concurrent
/// callers racing on the same application get exactly one winner; the loser
/// sees `InvalidTransition`. Emails are dispatched only after the state
/// change is durable, and a failed send never unwinds it.
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn ApplicationStore>,
    directory: Arc<dyn DirectoryStore>,
    notifier: Arc<dyn NotificationGateway>,
    webapp_url: String,
    token_ttl: Duration,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        directory: Arc<dyn DirectoryStore>,
        notifier: Arc<dyn NotificationGateway>,
        webapp_url: String,
        token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            webapp_url,
            token_ttl,
        }
    }

    /// Candidate submits an application. One active (non-Denied) application
    /// per (job, candidate) pair; a past denial does not block re-applying.
    /// No email goes out on submission.
    pub async fn submit_application(&self, actor: Actor, new: NewApplication) -> Result<Application> {
        match actor {
            Actor::Candidate(id) if id == new.candidate_id => {}
            Actor::Candidate(_) => {
                return Err(Error::Forbidden(
                    "Cannot submit an application for another candidate".to_string(),
                ))
            }
            _ => {
                return Err(Error::Forbidden(
                    "Only candidates can submit applications".to_string(),
                ))
            }
        }

        let existing = self
            .store
            .find_by_job_and_candidate(new.job_id, new.candidate_id)
            .await?;
        if existing
            .iter()
            .any(|a| a.status != ApplicationStatus::Denied)
        {
            return Err(Error::DuplicateApplication);
        }

        let application = self.store.create(new).await?;
        tracing::info!(
            application_id = %application.id,
            job_id = %application.job_id,
            candidate_id = %application.candidate_id,
            "Application submitted"
        );
        Ok(application)
    }

    /// Company schedules (or re-schedules after a reschedule request) the
    /// interview. The date must still be in the future when it is set.
    pub async fn schedule_interview(
        &self,
        actor: Actor,
        id: Uuid,
        interview_date: DateTime<Utc>,
    ) -> Result<Application> {
        let app = self.load(id).await?;
        self.ensure_company(actor, &app)?;
        if interview_date <= time::now() {
            return Err(Error::BadRequest(
                "Interview date must be in the future".to_string(),
            ));
        }

        let updated = self
            .commit(
                &app,
                LifecycleAction::ScheduleInterview,
                ApplicationPatch::status(ApplicationStatus::InterviewScheduled)
                    .with_interview_date(interview_date),
            )
            .await?;

        let accept_url = format!("{}/applications/{}/accept", self.webapp_url, id);
        let reschedule_url = format!("{}/applications/{}/reschedule", self.webapp_url, id);
        self.notify(
            &updated,
            "Interview Scheduled",
            "interview_scheduled",
            json!({
                "interview_date": interview_date,
                "accept_url": accept_url,
                "reschedule_url": reschedule_url,
            }),
        )
        .await;

        Ok(updated)
    }

    /// Candidate accepts the scheduled interview. Generates the room access
    /// credential and emails it. Duplicate clicks on the emailed link land
    /// here with a stale status and get a clean `InvalidTransition`.
    pub async fn accept_interview(&self, actor: Actor, id: Uuid) -> Result<Application> {
        let app = self.load(id).await?;
        self.ensure_candidate(actor, &app)?;

        let credential = generate_access_token(ACCESS_CREDENTIAL_LENGTH);
        let updated = self
            .commit(
                &app,
                LifecycleAction::AcceptInterview,
                ApplicationPatch::status(ApplicationStatus::InterviewConfirmed)
                    .with_access_credential(credential.clone()),
            )
            .await?;

        let join_url = format!(
            "{}/call/{}/{}",
            self.webapp_url, updated.candidate_id, updated.company_id
        );
        self.notify(
            &updated,
            "Interview Confirmed",
            "interview_confirmed",
            json!({
                "interview_date": updated.interview_date,
                "access_credential": credential,
                "join_url": join_url,
            }),
        )
        .await;

        Ok(updated)
    }

    /// Candidate asks for a different slot. No outbound email; the company
    /// listing reflects the new status.
    pub async fn request_reschedule(&self, actor: Actor, id: Uuid) -> Result<Application> {
        let app = self.load(id).await?;
        self.ensure_candidate(actor, &app)?;
        self.commit(
            &app,
            LifecycleAction::RequestReschedule,
            ApplicationPatch::status(ApplicationStatus::RescheduleRequested),
        )
        .await
    }

    /// Company asks the candidate to re-confirm out-of-band. Issues a fresh
    /// single-use token with an expiry and emails the confirmation link.
    pub async fn request_confirmation(&self, actor: Actor, id: Uuid) -> Result<Application> {
        let app = self.load(id).await?;
        self.ensure_company(actor, &app)?;

        let token = generate_confirmation_token();
        let expiry = time::now() + self.token_ttl;
        let updated = self
            .commit(
                &app,
                LifecycleAction::RequestConfirmation,
                ApplicationPatch::status(ApplicationStatus::ConfirmationPending)
                    .with_token(token.clone(), expiry),
            )
            .await?;

        let confirm_url = format!("{}/applications/confirm?token={}", self.webapp_url, token);
        self.notify(
            &updated,
            "Please Confirm Your Interview",
            "confirmation_request",
            json!({
                "confirm_url": confirm_url,
                "expires_at": expiry,
            }),
        )
        .await;

        Ok(updated)
    }

    /// Consumes a confirmation token. The token is the credential, so no
    /// actor is required. Expiry is checked here, at read time; a consumed,
    /// unknown, or stale token all collapse into `InvalidOrExpiredToken` so
    /// double-clicked links get a clear answer instead of a 500.
    pub async fn confirm_via_token(&self, token: &str) -> Result<Application> {
        let app = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(Error::InvalidOrExpiredToken)?;

        if app.status != ApplicationStatus::ConfirmationPending {
            return Err(Error::InvalidOrExpiredToken);
        }
        match app.token_expiry {
            Some(expiry) if expiry > time::now() => {}
            _ => return Err(Error::InvalidOrExpiredToken),
        }

        // Clearing the token in the same conditional write makes it
        // single-use even when two clicks race.
        self.store
            .conditional_update(
                app.id,
                ApplicationStatus::ConfirmationPending,
                ApplicationPatch::status(ApplicationStatus::Interview).clearing_token(),
            )
            .await?
            .ok_or(Error::InvalidOrExpiredToken)
    }

    /// Company hires the candidate. Also stamps the candidate's displayed
    /// position as "<job title> at <company name>". Re-invoking on an
    /// already-hired application reports success without a second email.
    pub async fn hire(&self, actor: Actor, id: Uuid) -> Result<Application> {
        let app = self.load(id).await?;
        self.ensure_company(actor, &app)?;

        if app.status == ApplicationStatus::Hired {
            return Ok(app);
        }

        let updated = self
            .commit(
                &app,
                LifecycleAction::Hire,
                ApplicationPatch::status(ApplicationStatus::Hired),
            )
            .await?;

        match self.directory.job_posting(updated.job_id).await {
            Ok(Some(posting)) => {
                let label = format!("{} at {}", posting.title, posting.company_name);
                if let Err(e) = self
                    .directory
                    .set_position_label(updated.candidate_id, &label)
                    .await
                {
                    tracing::error!(application_id = %id, error = ?e, "Failed to update position label");
                }
                self.notify(
                    &updated,
                    "Congratulations, You're Hired!",
                    "hired",
                    json!({
                        "job_title": posting.title,
                        "company_name": posting.company_name,
                        "position_label": label,
                    }),
                )
                .await;
            }
            Ok(None) => {
                tracing::warn!(application_id = %id, job_id = %updated.job_id, "Job posting missing; skipping position label");
                self.notify(&updated, "Congratulations, You're Hired!", "hired", json!({}))
                    .await;
            }
            Err(e) => {
                tracing::error!(application_id = %id, error = ?e, "Failed to load job posting");
                self.notify(&updated, "Congratulations, You're Hired!", "hired", json!({}))
                    .await;
            }
        }

        Ok(updated)
    }

    /// Company denies the candidate. Terminal. Re-invoking on an
    /// already-denied application reports success without a second email.
    pub async fn deny(&self, actor: Actor, id: Uuid) -> Result<Application> {
        let app = self.load(id).await?;
        self.ensure_company(actor, &app)?;

        if app.status == ApplicationStatus::Denied {
            return Ok(app);
        }

        let updated = self
            .commit(
                &app,
                LifecycleAction::Deny,
                ApplicationPatch::status(ApplicationStatus::Denied).clearing_token(),
            )
            .await?;

        self.notify(
            &updated,
            "Application Update",
            "application_denied",
            json!({}),
        )
        .await;

        Ok(updated)
    }

    pub async fn get_application(&self, actor: Actor, id: Uuid) -> Result<Application> {
        let app = self.load(id).await?;
        let allowed = match actor {
            Actor::Candidate(cid) => cid == app.candidate_id,
            Actor::Company(cid) => cid == app.company_id,
            Actor::System => true,
        };
        if !allowed {
            return Err(Error::Forbidden(
                "Not a party to this application".to_string(),
            ));
        }
        Ok(app)
    }

    /// Company-facing listing for one posting.
    pub async fn list_for_job(&self, actor: Actor, job_id: Uuid) -> Result<Vec<Application>> {
        let company_id = match actor {
            Actor::Company(id) => id,
            _ => {
                return Err(Error::Forbidden(
                    "Only companies can list applications for a job".to_string(),
                ))
            }
        };
        let apps = self.store.list_for_job(job_id).await?;
        Ok(apps
            .into_iter()
            .filter(|a| a.company_id == company_id)
            .collect())
    }

    /// Candidate-facing listing, optionally filtered by status.
    pub async fn list_for_candidate(
        &self,
        actor: Actor,
        candidate_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>> {
        match actor {
            Actor::Candidate(id) if id == candidate_id => {}
            Actor::System => {}
            _ => {
                return Err(Error::Forbidden(
                    "Cannot list another candidate's applications".to_string(),
                ))
            }
        }
        self.store.list_for_candidate(candidate_id, status).await
    }

    async fn load(&self, id: Uuid) -> Result<Application> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))
    }

    fn ensure_candidate(&self, actor: Actor, app: &Application) -> Result<()> {
        match actor {
            Actor::Candidate(id) if id == app.candidate_id => Ok(()),
            Actor::System => Ok(()),
            _ => Err(Error::Forbidden(
                "Only the applying candidate can perform this action".to_string(),
            )),
        }
    }

    fn ensure_company(&self, actor: Actor, app: &Application) -> Result<()> {
        match actor {
            Actor::Company(id) if id == app.company_id => Ok(()),
            Actor::System => Ok(()),
            _ => Err(Error::Forbidden(
                "Only the posting company can perform this action".to_string(),
            )),
        }
    }

    /// Validates the action against the transition table, then writes with a
    /// compare-and-set on the status the check was made against. A CAS miss
    /// means a concurrent transition won; the caller gets `InvalidTransition`.
    async fn commit(
        &self,
        app: &Application,
        action: LifecycleAction,
        patch: ApplicationPatch,
    ) -> Result<Application> {
        if !app.status.permits(action) {
            return Err(invalid_transition(app.status, action));
        }
        self.store
            .conditional_update(app.id, app.status, patch)
            .await?
            .ok_or_else(|| invalid_transition(app.status, action))
    }

    /// State is committed by the time this runs; a failed send is logged and
    /// swallowed so the transition still reports success.
    async fn notify(
        &self,
        app: &Application,
        subject: &str,
        template: &str,
        data: serde_json::Value,
    ) {
        let contact = match self.directory.candidate_contact(app.candidate_id).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                tracing::warn!(
                    application_id = %app.id,
                    candidate_id = %app.candidate_id,
                    "No contact on file, skipping {} email", template
                );
                return;
            }
            Err(e) => {
                tracing::error!(application_id = %app.id, error = ?e, "Contact lookup failed");
                return;
            }
        };

        let mut data = data;
        if let Some(obj) = data.as_object_mut() {
            obj.insert("candidate_name".to_string(), json!(contact.name));
        }

        if let Err(e) = self
            .notifier
            .send(&contact.email, subject, template, data)
            .await
        {
            tracing::error!(
                application_id = %app.id,
                template = template,
                error = ?e,
                "Email delivery failed"
            );
        }
    }
}

fn invalid_transition(from: ApplicationStatus, action: LifecycleAction) -> Error {
    Error::InvalidTransition(format!("Cannot {} from status '{}'", action.as_str(), from))
}
