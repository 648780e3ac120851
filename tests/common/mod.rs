#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use jobboard_backend::error::{Error, Result};
use jobboard_backend::models::application::{Actor, Application, ApplicationStatus};
use jobboard_backend::models::directory::{CandidateContact, JobPosting};
use jobboard_backend::services::lifecycle_service::LifecycleService;
use jobboard_backend::services::notification_service::NotificationGateway;
use jobboard_backend::services::reminder_service::ReminderService;
use jobboard_backend::store::memory::{MemoryApplicationStore, MemoryDirectoryStore};
use jobboard_backend::store::NewApplication;

pub const WEBAPP_URL: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: JsonValue,
}

/// Gateway double that records every send and can be told to fail the next
/// N deliveries.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<SentEmail>>,
    failures_remaining: Mutex<usize>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: usize) {
        *self.failures_remaining.lock().unwrap() = n;
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, template: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.template == template)
            .count()
    }

    pub fn total(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn send(&self, to: &str, subject: &str, template: &str, data: JsonValue) -> Result<()> {
        {
            let mut remaining = self.failures_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::NotificationDelivery("simulated outage".to_string()));
            }
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            template: template.to_string(),
            data,
        });
        Ok(())
    }
}

/// One candidate, one company, one posting, wired-up services over the
/// in-memory store.
pub struct Harness {
    pub store: Arc<MemoryApplicationStore>,
    pub directory: Arc<MemoryDirectoryStore>,
    pub gateway: Arc<RecordingGateway>,
    pub lifecycle: LifecycleService,
    pub reminders: ReminderService,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryApplicationStore::new());
        let directory = Arc::new(MemoryDirectoryStore::new());
        let gateway = Arc::new(RecordingGateway::new());

        let job_id = Uuid::new_v4();
        let candidate_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();

        directory.insert_candidate(
            candidate_id,
            CandidateContact {
                name: "Alice Nguyen".to_string(),
                email: "alice@example.com".to_string(),
            },
        );
        directory.insert_posting(
            job_id,
            JobPosting {
                title: "Backend Engineer".to_string(),
                company_name: "Acme Corp".to_string(),
            },
        );

        let lifecycle = LifecycleService::new(
            store.clone(),
            directory.clone(),
            gateway.clone(),
            WEBAPP_URL.to_string(),
            Duration::hours(48),
        );
        let reminders = ReminderService::new(
            store.clone(),
            directory.clone(),
            gateway.clone(),
            Duration::hours(2),
            WEBAPP_URL.to_string(),
        );

        Self {
            store,
            directory,
            gateway,
            lifecycle,
            reminders,
            job_id,
            candidate_id,
            company_id,
        }
    }

    pub fn candidate(&self) -> Actor {
        Actor::Candidate(self.candidate_id)
    }

    pub fn company(&self) -> Actor {
        Actor::Company(self.company_id)
    }

    pub fn new_application(&self) -> NewApplication {
        NewApplication {
            job_id: self.job_id,
            candidate_id: self.candidate_id,
            company_id: self.company_id,
            cover_letter: "I would love to work on this.".to_string(),
            resume_url: "https://cdn.example.com/cv/alice.pdf".to_string(),
        }
    }

    pub async fn submit(&self) -> Application {
        self.lifecycle
            .submit_application(self.candidate(), self.new_application())
            .await
            .expect("submit application")
    }

    /// Seeds a record in an arbitrary status, bypassing the lifecycle.
    pub fn seed(&self, status: ApplicationStatus) -> Application {
        self.seed_with(status, |_| {})
    }

    pub fn seed_with(
        &self,
        status: ApplicationStatus,
        adjust: impl FnOnce(&mut Application),
    ) -> Application {
        let now = Utc::now();
        let mut application = Application {
            id: Uuid::new_v4(),
            job_id: self.job_id,
            candidate_id: self.candidate_id,
            company_id: self.company_id,
            status,
            cover_letter: "Seeded".to_string(),
            resume_url: "https://cdn.example.com/cv/alice.pdf".to_string(),
            interview_date: None,
            confirmation_token: None,
            token_expiry: None,
            access_credential: None,
            reminder_sent: false,
            created_at: Some(now),
            updated_at: Some(now),
        };
        adjust(&mut application);
        self.store.insert(application.clone());
        application
    }

    pub fn status_of(&self, id: Uuid) -> ApplicationStatus {
        self.store.get(id).expect("record exists").status
    }
}

pub fn in_hours(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
