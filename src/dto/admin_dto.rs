use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::dto::job_dto::{clamp_page, Pagination, DEFAULT_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::models::user::{Profile, UserRole};
use crate::services::user_service::{UserList, UserSummaryRow};

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct AdminUsersQuery {
    /// CANDIDATE, RECRUITER or ADMIN.
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl AdminUsersQuery {
    pub fn role_filter(&self) -> Result<Option<UserRole>> {
        match self.role.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<UserRole>().map(Some).map_err(Error::BadRequest),
        }
    }

    pub fn page(&self) -> i64 {
        clamp_page(self.page)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminUserItem {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub jobs_count: i64,
    pub applications_count: i64,
    pub profile: Option<Profile>,
}

impl From<(UserSummaryRow, Option<Profile>)> for AdminUserItem {
    fn from((row, profile): (UserSummaryRow, Option<Profile>)) -> Self {
        Self {
            id: row.id,
            email: row.email,
            role: row.role,
            created_at: row.created_at,
            jobs_count: row.jobs_count,
            applications_count: row.applications_count,
            profile,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminUsersResponse {
    pub users: Vec<AdminUserItem>,
    pub pagination: Pagination,
}

impl From<UserList> for AdminUsersResponse {
    fn from(list: UserList) -> Self {
        Self {
            pagination: Pagination::new(list.page, list.limit, list.total),
            users: list.items.into_iter().map(AdminUserItem::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
