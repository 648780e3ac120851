use serde::{Deserialize, Serialize};

/// Contact details the lifecycle needs to address an email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateContact {
    pub name: String,
    pub email: String,
}

/// The slice of a job posting the lifecycle cares about: the title and the
/// owning company's display name, used for email copy and the position label
/// written on hire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company_name: String,
}
