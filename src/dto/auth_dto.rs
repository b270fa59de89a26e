use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::user::{Profile, User, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    #[validate(email)]
    pub company_email: Option<String>,
    pub description: Option<String>,
}

impl RegisterPayload {
    /// Resolves the requested role and checks the fields that role requires.
    pub fn checked_role(&self) -> Result<UserRole> {
        let role = self
            .role
            .parse::<UserRole>()
            .ok()
            .filter(UserRole::is_self_service)
            .ok_or_else(|| {
                Error::BadRequest("Valid role (CANDIDATE or RECRUITER) is required".into())
            })?;

        if role == UserRole::Recruiter {
            let missing = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
            if missing(&self.company_name) || missing(&self.company_email) {
                return Err(Error::BadRequest(
                    "Company name and email required for recruiters".into(),
                ));
            }
        }
        Ok(role)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile fields a user may change about themselves. Fields irrelevant to the caller's
/// role are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfilePayload {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    #[validate(url)]
    pub portfolio_url: Option<String>,
    #[validate(length(min = 1))]
    pub company_name: Option<String>,
    #[validate(email)]
    pub company_email: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub profile: Option<Profile>,
}

impl UserResponse {
    pub fn new(user: User, profile: Option<Profile>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            profile,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OperatorLoginPayload {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperatorLoginResponse {
    pub token: String,
    pub header: String,
    pub expires_in_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(role: &str) -> RegisterPayload {
        RegisterPayload {
            email: "jane@example.com".into(),
            password: "secret1".into(),
            role: role.into(),
            first_name: None,
            last_name: None,
            phone: None,
            company_name: None,
            company_email: None,
            description: None,
        }
    }

    #[test]
    fn admin_cannot_be_self_registered() {
        assert!(matches!(payload("ADMIN").checked_role(), Err(Error::BadRequest(_))));
        assert!(matches!(payload("boss").checked_role(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn recruiters_need_company_details() {
        let mut p = payload("RECRUITER");
        assert!(p.checked_role().is_err());
        p.company_name = Some("Acme".into());
        p.company_email = Some("  ".into());
        assert!(p.checked_role().is_err());
        p.company_email = Some("jobs@acme.test".into());
        assert_eq!(p.checked_role().unwrap(), UserRole::Recruiter);
    }

    #[test]
    fn short_passwords_fail_validation() {
        let mut p = payload("CANDIDATE");
        p.password = "12345".into();
        assert!(p.validate().is_err());
        p.password = "123456".into();
        assert!(p.validate().is_ok());
    }
}
