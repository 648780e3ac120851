use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::application_dto::{
    ApplicationResponse, ConfirmQuery, ScheduleInterviewRequest, StatusFilterQuery,
    SubmitApplicationRequest,
};
use crate::error::{Error, Result};
use crate::models::application::{Actor, ApplicationStatus};
use crate::store::NewApplication;
use crate::utils::validation::validate;
use crate::AppState;

pub async fn submit_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>)> {
    validate(&req)?;
    let candidate_id = match actor {
        Actor::Candidate(id) => id,
        _ => {
            return Err(Error::Forbidden(
                "Only candidates can submit applications".to_string(),
            ))
        }
    };
    let application = state
        .lifecycle_service
        .submit_application(
            actor,
            NewApplication {
                job_id: req.job_id,
                candidate_id,
                company_id: req.company_id,
                cover_letter: req.cover_letter,
                resume_url: req.resume_url,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(application.into())))
}

pub async fn get_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>> {
    let application = state.lifecycle_service.get_application(actor, id).await?;
    Ok(Json(application.into()))
}

pub async fn list_for_job(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicationResponse>>> {
    let applications = state.lifecycle_service.list_for_job(actor, job_id).await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

pub async fn list_for_candidate(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(candidate_id): Path<Uuid>,
    Query(query): Query<StatusFilterQuery>,
) -> Result<Json<Vec<ApplicationResponse>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            ApplicationStatus::parse(s)
                .ok_or_else(|| Error::BadRequest(format!("Unknown status filter: {}", s)))
        })
        .transpose()?;
    let applications = state
        .lifecycle_service
        .list_for_candidate(actor, candidate_id, status)
        .await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

pub async fn schedule_interview(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<ScheduleInterviewRequest>,
) -> Result<Json<ApplicationResponse>> {
    let application = state
        .lifecycle_service
        .schedule_interview(actor, id, req.interview_date)
        .await?;
    Ok(Json(application.into()))
}

pub async fn accept_interview(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>> {
    let application = state.lifecycle_service.accept_interview(actor, id).await?;
    Ok(Json(application.into()))
}

pub async fn request_reschedule(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>> {
    let application = state
        .lifecycle_service
        .request_reschedule(actor, id)
        .await?;
    Ok(Json(application.into()))
}

pub async fn request_confirmation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>> {
    let application = state
        .lifecycle_service
        .request_confirmation(actor, id)
        .await?;
    Ok(Json(application.into()))
}

/// Public endpoint; the token itself is the credential.
pub async fn confirm_via_token(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<ApplicationResponse>> {
    let application = state
        .lifecycle_service
        .confirm_via_token(&query.token)
        .await?;
    Ok(Json(application.into()))
}

pub async fn hire(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>> {
    let application = state.lifecycle_service.hire(actor, id).await?;
    Ok(Json(application.into()))
}

pub async fn deny(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationResponse>> {
    let application = state.lifecycle_service.deny(actor, id).await?;
    Ok(Json(application.into()))
}
