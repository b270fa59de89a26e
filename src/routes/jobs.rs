use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin_dto::MessageResponse,
        job_dto::{
            CreateJobPayload, JobDetail, JobDetailResponse, JobFilter, JobListQuery,
            JobListResponse, JobResponse, UpdateJobPayload,
        },
    },
    error::Result,
    middleware::auth::Principal,
    models::user::UserRole,
    utils::extract::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(JobListQuery),
    responses(
        (status = 200, description = "Jobs, newest first", body = JobListResponse),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<JobListQuery>,
) -> Result<impl IntoResponse> {
    let filter = JobFilter::try_from(query)?;
    let jobs = state.job_service.list(&filter).await?;
    Ok(Json(JobListResponse::from(jobs)))
}

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 200, description = "Job created", body = JobResponse),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a recruiter")
    )
)]
pub async fn create_job(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(payload): ApiJson<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    let recruiter = principal.require_role(UserRole::Recruiter)?;
    payload.check_required()?;
    payload.validate()?;
    let job = state.job_service.create(recruiter.id, payload).await?;
    Ok(Json(JobResponse {
        message: "Job created successfully".into(),
        job,
    }))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job with company details", body = JobDetailResponse),
        (status = 404, description = "Job not found")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    principal: Option<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let listing = state.job_service.get_listing(id).await?;
    let has_applied = match principal.as_ref().and_then(|p| p.require_role(UserRole::Candidate).ok()) {
        Some(candidate) => state.application_service.has_applied(id, candidate.id).await?,
        None => false,
    };
    Ok(Json(JobDetailResponse {
        job: JobDetail {
            listing,
            has_applied,
        },
    }))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated", body = JobResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn update_job(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    state.job_service.get_managed(&principal, id).await?;
    payload.check_required()?;
    payload.validate()?;
    let job = state.job_service.update(id, payload).await?;
    Ok(Json(JobResponse {
        message: "Job updated successfully".into(),
        job,
    }))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/close",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job closed to new applications", body = JobResponse),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn close_job(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.job_service.get_managed(&principal, id).await?;
    let job = state.job_service.close(id).await?;
    tracing::info!(job_id = %id, actor = principal.actor_kind(), "job closed");
    Ok(Json(JobResponse {
        message: "Job closed successfully".into(),
        job,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job and its applications deleted", body = MessageResponse),
        (status = 403, description = "Not the job owner"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn delete_job(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_managed(&principal, id).await?;
    state.job_service.delete(id).await?;

    if principal.user_id() != Some(job.recruiter_id) {
        state
            .audit_service
            .record(
                &principal,
                "job.delete",
                "job",
                Some(job.id),
                Some(json!({ "title": job.title, "recruiter_id": job.recruiter_id })),
            )
            .await;
    }
    Ok(Json(MessageResponse::new("Job deleted successfully")))
}
