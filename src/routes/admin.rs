use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin_dto::{AdminUsersQuery, AdminUsersResponse, MessageResponse},
        auth_dto::{OperatorLoginPayload, OperatorLoginResponse},
    },
    error::{Error, Result},
    middleware::auth::{issue_operator_token, Principal, OPERATOR_TOKEN_HEADER},
    utils::crypto::{constant_time_eq, verify_password},
    utils::extract::{ApiJson, ApiPath, ApiQuery},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = OperatorLoginPayload,
    responses(
        (status = 200, description = "Operator token issued", body = OperatorLoginResponse),
        (status = 401, description = "Invalid operator credentials"),
        (status = 404, description = "Operator login is not configured")
    )
)]
pub async fn operator_login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<OperatorLoginPayload>,
) -> Result<impl IntoResponse> {
    let operator = state
        .config
        .operator
        .as_ref()
        .ok_or_else(|| Error::NotFound("Operator login is disabled".into()))?;
    payload.validate()?;

    let email_ok = constant_time_eq(
        &payload.email.trim().to_lowercase(),
        &operator.email.to_lowercase(),
    );
    // The hash is checked even when the email is already wrong.
    let password_ok = verify_password(&payload.password, &operator.password_hash)?;
    if !(email_ok && password_ok) {
        tracing::warn!("operator login rejected");
        return Err(Error::Unauthenticated("Invalid operator credentials".into()));
    }

    let token = issue_operator_token(operator)?;
    let actor = Principal::Operator {
        email: operator.email.clone(),
    };
    state
        .audit_service
        .record(&actor, "operator.login", "operator", None, None)
        .await;
    tracing::info!("operator logged in");

    Ok(Json(OperatorLoginResponse {
        token,
        header: OPERATOR_TOKEN_HEADER.as_str().to_string(),
        expires_in_seconds: operator.token_ttl_minutes * 60,
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/overview",
    responses(
        (status = 200, description = "Platform-wide counts and recent activity", body = crate::services::report_service::AdminOverview),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn overview(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let overview = state.report_service.admin_overview().await?;
    Ok(Json(overview))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(AdminUsersQuery),
    responses(
        (status = 200, description = "Users with profiles and activity counts", body = AdminUsersResponse),
        (status = 400, description = "Invalid role filter"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminUsersQuery>,
) -> Result<impl IntoResponse> {
    let role = query.role_filter()?;
    let users = state
        .user_service
        .list(role, query.page(), query.limit())
        .await?;
    Ok(Json(AdminUsersResponse::from(users)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User and everything they own deleted", body = MessageResponse),
        (status = 400, description = "Admins cannot delete themselves"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    if principal.user_id() == Some(id) {
        return Err(Error::BadRequest("You cannot delete your own account".into()));
    }
    let user = state.user_service.delete(id).await?;
    tracing::info!(user_id = %id, actor = principal.actor_kind(), "user deleted");
    state
        .audit_service
        .record(
            &principal,
            "user.delete",
            "user",
            Some(user.id),
            Some(json!({ "email": user.email, "role": user.role })),
        )
        .await;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
