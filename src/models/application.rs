use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical status set for an application. Earlier data carried divergent
/// labels release to release; anything outside this set is rejected at parse
/// time and old labels go through [`ApplicationStatus::migrate_legacy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
    #[serde(rename = "Interview Confirmed")]
    InterviewConfirmed,
    #[serde(rename = "Reschedule Requested")]
    RescheduleRequested,
    #[serde(rename = "Confirmation Pending")]
    ConfirmationPending,
    Interview,
    Hired,
    Denied,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Applied,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::InterviewConfirmed,
        ApplicationStatus::RescheduleRequested,
        ApplicationStatus::ConfirmationPending,
        ApplicationStatus::Interview,
        ApplicationStatus::Hired,
        ApplicationStatus::Denied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::InterviewConfirmed => "Interview Confirmed",
            ApplicationStatus::RescheduleRequested => "Reschedule Requested",
            ApplicationStatus::ConfirmationPending => "Confirmation Pending",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Hired => "Hired",
            ApplicationStatus::Denied => "Denied",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Maps retired labels from earlier schema revisions onto the canonical
    /// set. Unknown strings stay unknown; callers decide whether that is an
    /// error or a record to quarantine.
    pub fn migrate_legacy(s: &str) -> Option<ApplicationStatus> {
        match s {
            "Interviewers" => Some(ApplicationStatus::InterviewScheduled),
            other => Self::parse(other),
        }
    }

    /// Hired and Denied are never re-entered or left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Denied)
    }

    /// The transition table. An action is legal only where this says so;
    /// everything else fails with `InvalidTransition` and leaves the record
    /// untouched.
    pub fn permits(&self, action: LifecycleAction) -> bool {
        use ApplicationStatus::*;
        use LifecycleAction::*;
        match action {
            ScheduleInterview => matches!(self, Applied | RescheduleRequested),
            AcceptInterview => matches!(self, InterviewScheduled),
            RequestReschedule => matches!(self, InterviewScheduled),
            RequestConfirmation => !self.is_terminal(),
            ConfirmViaToken => matches!(self, ConfirmationPending),
            Hire | Deny => !self.is_terminal(),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions a caller can drive against one application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    ScheduleInterview,
    AcceptInterview,
    RequestReschedule,
    RequestConfirmation,
    ConfirmViaToken,
    Hire,
    Deny,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::ScheduleInterview => "schedule interview",
            LifecycleAction::AcceptInterview => "accept interview",
            LifecycleAction::RequestReschedule => "request reschedule",
            LifecycleAction::RequestConfirmation => "request confirmation",
            LifecycleAction::ConfirmViaToken => "confirm via token",
            LifecycleAction::Hire => "hire",
            LifecycleAction::Deny => "deny",
        }
    }
}

/// One candidate's pursuit of one job posting. Status is mutated exclusively
/// through the lifecycle service via conditional updates keyed on the
/// previous status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
    pub status: ApplicationStatus,
    pub cover_letter: String,
    pub resume_url: String,
    pub interview_date: Option<DateTime<Utc>>,
    pub confirmation_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub access_credential: Option<String>,
    pub reminder_sent: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Caller identity, passed explicitly into every lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Candidate(Uuid),
    Company(Uuid),
    /// The reminder scheduler; bypasses ownership checks.
    System,
}
