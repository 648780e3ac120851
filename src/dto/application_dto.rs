use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Application, ApplicationStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitApplicationRequest {
    pub job_id: Uuid,
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 10000))]
    pub cover_letter: String,
    #[validate(length(min = 1, max = 2048))]
    pub resume_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub interview_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusFilterQuery {
    pub status: Option<String>,
}

/// Outward shape of an application. The confirmation token and room
/// credential are delivered by email only and never appear in API bodies.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: String,
    pub resume_url: String,
    pub interview_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        Self {
            id: app.id,
            job_id: app.job_id,
            candidate_id: app.candidate_id,
            company_id: app.company_id,
            status: app.status,
            cover_letter: app.cover_letter,
            resume_url: app.resume_url,
            interview_date: app.interview_date,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}
