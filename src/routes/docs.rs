use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::dto::{admin_dto, application_dto, auth_dto, job_dto};
use crate::models::{application, job, user};
use crate::routes::{admin, applications, auth, health, jobs, recruiter, uploads};
use crate::services::{report_service, upload_service, user_service};

#[derive(OpenApi)]
#[openapi(
    info(title = "Job Portal API"),
    paths(
        health::health,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_me,
        jobs::list_jobs,
        jobs::create_job,
        jobs::get_job,
        jobs::update_job,
        jobs::close_job,
        jobs::delete_job,
        applications::apply,
        applications::list_applications,
        applications::update_status,
        applications::history,
        recruiter::job_stats,
        recruiter::application_stream,
        uploads::upload,
        admin::operator_login,
        admin::overview,
        admin::list_users,
        admin::delete_user,
    ),
    components(schemas(
        user::UserRole,
        user::CandidateProfile,
        user::RecruiterProfile,
        user::Profile,
        job::JobStatus,
        job::Job,
        job::JobListing,
        application::ApplicationStatus,
        application::Application,
        application::ApplicationStatusEvent,
        application::CandidateApplicationRow,
        application::RecruiterApplicationRow,
        application::StatusSummary,
        auth_dto::RegisterPayload,
        auth_dto::LoginPayload,
        auth_dto::UpdateProfilePayload,
        auth_dto::UserResponse,
        auth_dto::RegisterResponse,
        auth_dto::LoginResponse,
        auth_dto::OperatorLoginPayload,
        auth_dto::OperatorLoginResponse,
        job_dto::CreateJobPayload,
        job_dto::UpdateJobPayload,
        job_dto::Pagination,
        job_dto::JobListResponse,
        job_dto::JobDetail,
        job_dto::JobDetailResponse,
        job_dto::JobResponse,
        application_dto::ApplyPayload,
        application_dto::UpdateStatusPayload,
        application_dto::ApplicationResponse,
        application_dto::CandidateApplicationsResponse,
        application_dto::RecruiterApplicationsResponse,
        application_dto::ApplicationHistoryResponse,
        admin_dto::AdminUserItem,
        admin_dto::AdminUsersResponse,
        admin_dto::MessageResponse,
        report_service::UsersByRole,
        report_service::JobsByStatus,
        report_service::RecentUser,
        report_service::AdminOverview,
        report_service::JobStats,
        report_service::RecruiterTotals,
        report_service::RecruiterDashboard,
        user_service::UserSummaryRow,
        upload_service::StoredAsset,
        uploads::UploadResponse,
    )),
    tags((name = "jobportal", description = "Job listings and application tracking"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_application_endpoints() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/applications"));
        assert!(doc.paths.paths.contains_key("/api/applications/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/jobs/{id}/close"));
    }

    #[test]
    fn upload_and_dashboard_bodies_are_documented() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let upload = &doc["paths"]["/api/uploads"]["post"]["requestBody"]["content"];
        assert!(upload["multipart/form-data"].is_object());
        let schemas = &doc["components"]["schemas"];
        assert!(schemas["AdminOverview"].is_object());
        assert!(schemas["RecruiterDashboard"].is_object());
    }
}
