pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{Application, ApplicationStatus};
use crate::models::directory::{CandidateContact, JobPosting};

/// Immutable fields captured at submission time. The store assigns the id
/// and timestamps.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
    pub cover_letter: String,
    pub resume_url: String,
}

/// Partial update applied through a conditional write. `None` leaves the
/// column alone; the nested `Option` on token fields distinguishes "set"
/// from "clear".
#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
    pub status: Option<ApplicationStatus>,
    pub interview_date: Option<DateTime<Utc>>,
    pub confirmation_token: Option<Option<String>>,
    pub token_expiry: Option<Option<DateTime<Utc>>>,
    pub access_credential: Option<String>,
    pub reminder_sent: Option<bool>,
}

impl ApplicationPatch {
    pub fn status(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_interview_date(mut self, date: DateTime<Utc>) -> Self {
        self.interview_date = Some(date);
        self
    }

    pub fn with_token(mut self, token: String, expiry: DateTime<Utc>) -> Self {
        self.confirmation_token = Some(Some(token));
        self.token_expiry = Some(Some(expiry));
        self
    }

    pub fn clearing_token(mut self) -> Self {
        self.confirmation_token = Some(None);
        self.token_expiry = Some(None);
        self
    }

    pub fn with_access_credential(mut self, credential: String) -> Self {
        self.access_credential = Some(credential);
        self
    }
}

/// Durable storage for applications.
///
/// `conditional_update` is the one concurrency-bearing method: the write
/// lands only when the record still carries `expected` as its status, so two
/// racing transitions produce exactly one winner. Implementations must make
/// that check-and-write atomic.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create(&self, new: NewApplication) -> Result<Application>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Application>>;

    /// Every application (any status) for the (job, candidate) pair.
    async fn find_by_job_and_candidate(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<Application>>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Application>>;

    /// Compare-and-set update keyed on the current status. Returns the
    /// updated record, or `None` when the status no longer matches.
    async fn conditional_update(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        patch: ApplicationPatch,
    ) -> Result<Option<Application>>;

    /// Atomically flips `reminder_sent` from false to true. Returns false
    /// when another sweep instance already claimed the record.
    async fn claim_reminder(&self, id: Uuid) -> Result<bool>;

    /// Undoes a claim after a failed send so the next sweep retries.
    async fn release_reminder(&self, id: Uuid) -> Result<()>;

    /// Confirmed interviews inside [from, until] still awaiting a reminder.
    async fn find_reminders_due(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Application>>;

    /// Confirmation-pending applications whose token expiry has passed.
    async fn find_expired_confirmations(&self, now: DateTime<Utc>) -> Result<Vec<Application>>;

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Application>>;

    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>>;
}

/// Read access to candidate and job-posting records owned by the wider
/// platform, plus the single write the lifecycle performs there: the
/// position label set on hire.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn candidate_contact(&self, candidate_id: Uuid) -> Result<Option<CandidateContact>>;

    async fn job_posting(&self, job_id: Uuid) -> Result<Option<JobPosting>>;

    async fn set_position_label(&self, candidate_id: Uuid, label: &str) -> Result<()>;
}
