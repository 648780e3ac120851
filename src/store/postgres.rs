use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::directory::{CandidateContact, JobPosting};
use crate::store::{ApplicationPatch, ApplicationStore, DirectoryStore, NewApplication};

const APPLICATION_COLUMNS: &str = "id, job_id, candidate_id, company_id, status, cover_letter, \
     resume_url, interview_date, confirmation_token, token_expiry, access_credential, \
     reminder_sent, created_at, updated_at";

#[derive(Clone)]
pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_application(row: &PgRow) -> Result<Application> {
    let raw_status: String = row.try_get("status").map_err(Error::Database)?;
    let status = ApplicationStatus::migrate_legacy(&raw_status).ok_or_else(|| {
        Error::Internal(format!("Unknown application status in store: {}", raw_status))
    })?;

    Ok(Application {
        id: row.try_get("id").map_err(Error::Database)?,
        job_id: row.try_get("job_id").map_err(Error::Database)?,
        candidate_id: row.try_get("candidate_id").map_err(Error::Database)?,
        company_id: row.try_get("company_id").map_err(Error::Database)?,
        status,
        cover_letter: row.try_get("cover_letter").map_err(Error::Database)?,
        resume_url: row.try_get("resume_url").map_err(Error::Database)?,
        interview_date: row.try_get("interview_date").map_err(Error::Database)?,
        confirmation_token: row.try_get("confirmation_token").map_err(Error::Database)?,
        token_expiry: row.try_get("token_expiry").map_err(Error::Database)?,
        access_credential: row.try_get("access_credential").map_err(Error::Database)?,
        reminder_sent: row.try_get("reminder_sent").map_err(Error::Database)?,
        created_at: row.try_get("created_at").map_err(Error::Database)?,
        updated_at: row.try_get("updated_at").map_err(Error::Database)?,
    })
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn create(&self, new: NewApplication) -> Result<Application> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO applications (id, job_id, candidate_id, company_id, status, cover_letter, resume_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {APPLICATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(new.job_id)
        .bind(new.candidate_id)
        .bind(new.company_id)
        .bind(ApplicationStatus::Applied.as_str())
        .bind(&new.cover_letter)
        .bind(&new.resume_url)
        .fetch_one(&self.pool)
        .await?;
        row_to_application(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_application).transpose()
    }

    async fn find_by_job_and_candidate(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<Application>> {
        let rows = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE job_id = $1 AND candidate_id = $2 ORDER BY created_at DESC"
        ))
        .bind(job_id)
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_application).collect()
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Application>> {
        let row = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE confirmation_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_application).transpose()
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected: ApplicationStatus,
        patch: ApplicationPatch,
    ) -> Result<Option<Application>> {
        // Single statement so the status check and the write are atomic.
        // $5/$7 flag whether the token columns are being written at all,
        // since "clear" and "leave alone" both arrive as NULL values.
        let row = sqlx::query(&format!(
            r#"
            UPDATE applications SET
                status = COALESCE($3, status),
                interview_date = COALESCE($4, interview_date),
                confirmation_token = CASE WHEN $5 THEN $6 ELSE confirmation_token END,
                token_expiry = CASE WHEN $7 THEN $8 ELSE token_expiry END,
                access_credential = COALESCE($9, access_credential),
                reminder_sent = COALESCE($10, reminder_sent),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {APPLICATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.interview_date)
        .bind(patch.confirmation_token.is_some())
        .bind(patch.confirmation_token.flatten())
        .bind(patch.token_expiry.is_some())
        .bind(patch.token_expiry.flatten())
        .bind(patch.access_credential)
        .bind(patch.reminder_sent)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_application).transpose()
    }

    async fn claim_reminder(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE applications SET reminder_sent = TRUE, updated_at = NOW() \
             WHERE id = $1 AND reminder_sent = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_reminder(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE applications SET reminder_sent = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_reminders_due(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Application>> {
        let rows = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE status IN ($1, $2) \
               AND reminder_sent = FALSE \
               AND interview_date IS NOT NULL \
               AND interview_date >= $3 \
               AND interview_date <= $4 \
             ORDER BY interview_date ASC"
        ))
        .bind(ApplicationStatus::InterviewConfirmed.as_str())
        .bind(ApplicationStatus::Interview.as_str())
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_application).collect()
    }

    async fn find_expired_confirmations(&self, now: DateTime<Utc>) -> Result<Vec<Application>> {
        let rows = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE status = $1 AND token_expiry IS NOT NULL AND token_expiry <= $2"
        ))
        .bind(ApplicationStatus::ConfirmationPending.as_str())
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_application).collect()
    }

    async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Application>> {
        let rows = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE job_id = $1 ORDER BY created_at DESC"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_application).collect()
    }

    async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>> {
        let rows = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE candidate_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(candidate_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_application).collect()
    }
}

#[derive(Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn candidate_contact(&self, candidate_id: Uuid) -> Result<Option<CandidateContact>> {
        let row = sqlx::query("SELECT name, email FROM candidates WHERE id = $1")
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            Ok(CandidateContact {
                name: r.try_get("name").map_err(Error::Database)?,
                email: r.try_get("email").map_err(Error::Database)?,
            })
        })
        .transpose()
    }

    async fn job_posting(&self, job_id: Uuid) -> Result<Option<JobPosting>> {
        let row = sqlx::query(
            "SELECT p.title, c.name AS company_name \
             FROM job_postings p JOIN companies c ON c.id = p.company_id \
             WHERE p.id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| {
            Ok(JobPosting {
                title: r.try_get("title").map_err(Error::Database)?,
                company_name: r.try_get("company_name").map_err(Error::Database)?,
            })
        })
        .transpose()
    }

    async fn set_position_label(&self, candidate_id: Uuid, label: &str) -> Result<()> {
        sqlx::query("UPDATE candidates SET position_label = $1, updated_at = NOW() WHERE id = $2")
            .bind(label)
            .bind(candidate_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
