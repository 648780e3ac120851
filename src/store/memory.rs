//! In-memory store implementations backing the integration tests and local
//! development without a database. The mutex gives the same linearizable
//! conditional-update semantics the Postgres store gets from single-statement
//! writes.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{Application, ApplicationStatus};
use crate::models::directory::{CandidateContact, JobPosting};
use crate::store::{ApplicationPatch, ApplicationStore, DirectoryStore, NewApplication};
use crate::utils::time;

#[derive(Default)]
pub struct MemoryApplicationStore {
    records: Mutex<HashMap<Uuid, Application>>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record as-is, bypassing the lifecycle. Test setup only.
    pub fn insert(&self, application: Application) {
        self.records
            .lock()
            .unwrap()
            .insert(application.id, application);
    }

    pub fn get(&self, id: Uuid) -> Option<Application> {
        self.records.lock().unwrap().get(&id).cloned()
    }
}

fn apply_patch(record: &mut Application, patch: ApplicationPatch) {
    if let Some(status) = patch.status {
        record.status = status;
    }
    if let Some(date) = patch.interview_date {
        record.interview_date = Some(date);
    }
    if let Some(token) = patch.confirmation_token {
        record.confirmation_token = token;
    }
    if let Some(expiry) = patch.token_expiry {
        record.token_expiry = expiry;
    }
    if let Some(credential) = patch.access_credential {
        record.access_credential = Some(credential);
    }
    if let Some(sent) = patch.reminder_sent {
        record.reminder_sent = sent;
    }
    record.updated_at = Some(time::now());
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn create(&self, new: NewApplication) -> Result<Application> {
        let now = time::now();
        let application = Application {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            candidate_id: new.candidate_id,
            company_id: new.company_id,
            status: ApplicationStatus::Applied,
            cover_letter: new.cover_letter,
            resume_url: new.resume_url,
            interview_date: None,
            confirmation_token: None,
            token_expiry: None,
            access_credential: None,
            reminder_sent: false,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.records
            .lock()
            .unwrap()
            .insert(application.id, application.clone());
        Ok(application)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Application>> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_job_and_candidate(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<Application>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.job_id == job_id && a.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Application>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|a| a.confirmation_token.as_deref() == Some(token))
            .cloned())
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        patch: ApplicationPatch,
    ) -> Result<Option<Application>> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some(record) if record.status == expected => {
                apply_patch(record, patch);
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn claim_reminder(&self, id: Uuid) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some(record) if !record.reminder_sent => {
                record.reminder_sent = true;
                record.updated_at = Some(time::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_reminder(&self, id: Uuid) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(&id) {
            record.reminder_sent = false;
            record.updated_at = Some(time::now());
        }
        Ok(())
    }

    async fn find_reminders_due(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Application>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|a| {
                matches!(
                    a.status,
                    ApplicationStatus::InterviewConfirmed | ApplicationStatus::Interview
                ) && !a.reminder_sent
                    && a.interview_date
                        .map_or(false, |d| d >= from && d <= until)
            })
            .cloned()
            .collect())
    }

    async fn find_expired_confirmations(&self, now: DateTime<Utc>) -> Result<Vec<Application>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|a| {
                a.status == ApplicationStatus::ConfirmationPending
                    && a.token_expiry.map_or(false, |e| e <= now)
            })
            .cloned()
            .collect())
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Application>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|a| {
                a.candidate_id == candidate_id && status.map_or(true, |s| a.status == s)
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryDirectoryStore {
    candidates: Mutex<HashMap<Uuid, CandidateContact>>,
    postings: Mutex<HashMap<Uuid, JobPosting>>,
    position_labels: Mutex<HashMap<Uuid, String>>,
}

impl MemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_candidate(&self, id: Uuid, contact: CandidateContact) {
        self.candidates.lock().unwrap().insert(id, contact);
    }

    pub fn insert_posting(&self, id: Uuid, posting: JobPosting) {
        self.postings.lock().unwrap().insert(id, posting);
    }

    pub fn position_label(&self, candidate_id: Uuid) -> Option<String> {
        self.position_labels
            .lock()
            .unwrap()
            .get(&candidate_id)
            .cloned()
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn candidate_contact(&self, candidate_id: Uuid) -> Result<Option<CandidateContact>> {
        Ok(self.candidates.lock().unwrap().get(&candidate_id).cloned())
    }

    async fn job_posting(&self, job_id: Uuid) -> Result<Option<JobPosting>> {
        Ok(self.postings.lock().unwrap().get(&job_id).cloned())
    }

    async fn set_position_label(&self, candidate_id: Uuid, label: &str) -> Result<()> {
        self.position_labels
            .lock()
            .unwrap()
            .insert(candidate_id, label.to_string());
        Ok(())
    }
}
