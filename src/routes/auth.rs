use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use crate::{
    dto::{
        admin_dto::MessageResponse,
        auth_dto::{
            LoginPayload, LoginResponse, RegisterPayload, RegisterResponse, UpdateProfilePayload,
            UserResponse,
        },
    },
    error::{Error, Result},
    middleware::auth::{expired_session_cookie, issue_session_token, session_cookie, AuthUser, Principal},
    utils::extract::ApiJson,
    AppState,
};

fn account_of(principal: &Principal) -> Result<&AuthUser> {
    match principal {
        Principal::User(user) => Ok(user),
        Principal::Operator { .. } => Err(Error::Unauthorized(
            "Operator sessions have no account profile".into(),
        )),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid payload or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let role = payload.checked_role()?;
    let user = state.user_service.register(&payload, role).await?;
    let profile = state.user_service.profile_for(user.id, user.role).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user: UserResponse::new(user, profile),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .authenticate(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| Error::Unauthenticated("Invalid email or password".into()))?;

    let token = issue_session_token(&state.config, user.id)?;
    let profile = state.user_service.profile_for(user.id, user.role).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");

    let jar = jar.add(session_cookie(&state.config, token.clone()));
    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".into(),
            token,
            user: UserResponse::new(user, profile),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session cookie cleared", body = MessageResponse))
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(expired_session_cookie()),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user with profile", body = UserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me(State(state): State<AppState>, principal: Principal) -> Result<impl IntoResponse> {
    let account = account_of(&principal)?;
    let user = state
        .user_service
        .find_by_id(account.id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".into()))?;
    let profile = state.user_service.profile_for(user.id, user.role).await?;
    Ok(Json(UserResponse::new(user, profile)))
}

#[utoipa::path(
    patch,
    path = "/api/auth/me",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(payload): ApiJson<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    let account = account_of(&principal)?;
    payload.validate()?;
    let profile = state
        .user_service
        .update_profile(account.id, account.role, &payload)
        .await?;
    let user = state
        .user_service
        .find_by_id(account.id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".into()))?;
    Ok(Json(UserResponse::new(user, profile)))
}
