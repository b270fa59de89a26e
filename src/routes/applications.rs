use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationHistoryResponse, ApplicationListQuery, ApplicationResponse, ApplyPayload,
        CandidateApplicationsResponse, RecruiterApplicationFilter, RecruiterApplicationsResponse,
        UpdateStatusPayload,
    },
    error::Result,
    middleware::auth::Principal,
    models::user::UserRole,
    utils::extract::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = ApplyPayload,
    responses(
        (status = 200, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "No resume, job closed, or already applied"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a candidate"),
        (status = 404, description = "Job not found")
    )
)]
pub async fn apply(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(payload): ApiJson<ApplyPayload>,
) -> Result<impl IntoResponse> {
    principal.require_role(UserRole::Candidate)?;
    payload.validate()?;
    let application = state.application_service.apply(&principal, payload).await?;
    Ok(Json(ApplicationResponse {
        message: "Application submitted successfully".into(),
        application,
    }))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    params(ApplicationListQuery),
    responses(
        (status = 200, description = "With mine=true: the candidate's applications and a status summary. Otherwise: applications on the recruiter's jobs."),
        (status = 400, description = "Invalid status filter"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Wrong role for the requested view")
    )
)]
pub async fn list_applications(
    State(state): State<AppState>,
    principal: Principal,
    ApiQuery(query): ApiQuery<ApplicationListQuery>,
) -> Result<Response> {
    if query.wants_own() {
        let candidate = principal.require_role(UserRole::Candidate)?;
        let (applications, summary) =
            state.application_service.list_for_candidate(candidate.id).await?;
        return Ok(Json(CandidateApplicationsResponse {
            applications,
            summary,
        })
        .into_response());
    }

    let recruiter = principal.require_role(UserRole::Recruiter)?;
    let filter = RecruiterApplicationFilter::try_from(&query)?;
    let applications = state
        .application_service
        .list_for_recruiter(recruiter.id, filter)
        .await?;
    Ok(Json(RecruiterApplicationsResponse {
        total: applications.len(),
        applications,
    })
    .into_response())
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status changed", body = ApplicationResponse),
        (status = 400, description = "Unknown status, invalid transition, or concurrent change"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not the recruiter who owns the job"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .update_status(&principal, id, &payload.status)
        .await?;
    Ok(Json(ApplicationResponse {
        message: "Application status updated".into(),
        application,
    }))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/history",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Status changes, oldest first", body = ApplicationHistoryResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a party to this application"),
        (status = 404, description = "Application not found")
    )
)]
pub async fn history(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let events = state.application_service.history(&principal, id).await?;
    Ok(Json(ApplicationHistoryResponse {
        application_id: id,
        events,
    }))
}
