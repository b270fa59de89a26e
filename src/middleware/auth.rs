use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use http::HeaderName;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Config, OperatorConfig};
use crate::error::{Error, Result};
use crate::models::user::UserRole;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const OPERATOR_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-operator-token");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Session,
    Operator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub kind: TokenKind,
}

fn sign(secret: &str, sub: String, kind: TokenKind, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub,
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
        kind,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

fn verify(secret: &str, token: &str, kind: TokenKind) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    if data.claims.kind != kind {
        return Err(Error::Unauthenticated("Wrong token type".into()));
    }
    Ok(data.claims)
}

pub fn issue_session_token(config: &Config, user_id: Uuid) -> Result<String> {
    sign(
        &config.jwt_secret,
        user_id.to_string(),
        TokenKind::Session,
        Duration::hours(config.session_ttl_hours),
    )
}

pub fn verify_session_token(config: &Config, token: &str) -> Result<Uuid> {
    let claims = verify(&config.jwt_secret, token, TokenKind::Session)?;
    Uuid::parse_str(&claims.sub).map_err(|_| Error::Unauthenticated("Malformed session".into()))
}

pub fn issue_operator_token(operator: &OperatorConfig) -> Result<String> {
    sign(
        &operator.token_secret,
        operator.email.clone(),
        TokenKind::Operator,
        Duration::minutes(operator.token_ttl_minutes),
    )
}

/// Accepts tokens signed with the current secret or, during rotation, the previous one.
pub fn verify_operator_token(operator: &OperatorConfig, token: &str) -> Result<Claims> {
    let claims = match verify(&operator.token_secret, token, TokenKind::Operator) {
        Ok(claims) => claims,
        Err(current_err) => match operator.previous_token_secret.as_deref() {
            Some(previous) => verify(previous, token, TokenKind::Operator)?,
            None => return Err(current_err),
        },
    };
    if claims.sub != operator.email {
        return Err(Error::Unauthenticated("Operator token subject mismatch".into()));
    }
    Ok(claims)
}

pub fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// An authenticated user resolved from a session and the `users` table.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

/// Whoever is making the request.
#[derive(Debug, Clone)]
pub enum Principal {
    User(AuthUser),
    /// Console operator configured out of band; not a row in `users`.
    Operator { email: String },
}

impl Principal {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Principal::User(user) => Some(user.id),
            Principal::Operator { .. } => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        match self {
            Principal::User(user) => user.role == UserRole::Admin,
            Principal::Operator { .. } => true,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Principal::Operator { .. })
    }

    pub fn actor_kind(&self) -> &'static str {
        match self {
            Principal::User(user) => user.role.as_str(),
            Principal::Operator { .. } => "OPERATOR",
        }
    }

    pub fn require_role(&self, role: UserRole) -> Result<&AuthUser> {
        match self {
            Principal::User(user) if user.role == role => Ok(user),
            _ => Err(Error::Unauthorized(format!(
                "Only {} accounts can perform this action",
                role.as_str().to_lowercase()
            ))),
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Unauthorized("Admin access required".into()))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
}

/// An explicit bearer token wins over a possibly stale session cookie.
fn session_token(parts: &Parts) -> Option<String> {
    bearer_token(parts).or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    })
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(raw) = parts.headers.get(&OPERATOR_TOKEN_HEADER) {
            let operator = state
                .config
                .operator
                .as_ref()
                .ok_or_else(|| Error::Unauthenticated("Operator access is disabled".into()))?;
            let token = raw
                .to_str()
                .map_err(|_| Error::Unauthenticated("Malformed operator token".into()))?;
            let claims = verify_operator_token(operator, token)?;
            return Ok(Principal::Operator { email: claims.sub });
        }

        let token = session_token(parts)
            .ok_or_else(|| Error::Unauthenticated("Authentication required".into()))?;

        let user_id = verify_session_token(&state.config, &token)?;
        let user = state
            .user_service
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::Unauthenticated("Account no longer exists".into()))?;

        Ok(Principal::User(AuthUser {
            id: user.id,
            email: user.email,
            role: user.role,
        }))
    }
}

/// Route layer for the admin console: resolves the caller, demands admin rights and
/// leaves the [`Principal`] in the request extensions.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();
    let principal = match Principal::from_request_parts(&mut parts, &state).await {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = principal.require_admin() {
        return e.into_response();
    }
    parts.extensions.insert(principal);
    next.run(Request::from_parts(parts, body)).await
}
