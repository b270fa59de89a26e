use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationStatus, ApplicationStatusEvent, CandidateApplicationRow,
    RecruiterApplicationRow, StatusSummary,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApplyPayload {
    pub job_id: Option<Uuid>,
    #[validate(length(max = 5000, message = "Cover letter is too long"))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    /// One of PENDING, VIEWED, SHORTLISTED, REJECTED.
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct ApplicationListQuery {
    /// `true` lists the calling candidate's own applications.
    pub mine: Option<bool>,
    /// Blank means every job.
    #[param(value_type = Option<Uuid>)]
    pub job_id: Option<String>,
    pub status: Option<String>,
}

impl ApplicationListQuery {
    pub fn wants_own(&self) -> bool {
        self.mine.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecruiterApplicationFilter {
    pub job_id: Option<Uuid>,
    pub status: Option<ApplicationStatus>,
}

impl TryFrom<&ApplicationListQuery> for RecruiterApplicationFilter {
    type Error = Error;

    fn try_from(query: &ApplicationListQuery) -> Result<Self> {
        let job_id = match query.job_id.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| Error::BadRequest(format!("Invalid job_id: {}", raw)))?,
            ),
        };
        let status = match query.status.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(raw) => Some(
                raw.parse::<ApplicationStatus>()
                    .map_err(|e| Error::BadRequest(e.to_string()))?,
            ),
        };
        Ok(Self {
            job_id,
            status,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub message: String,
    pub application: Application,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CandidateApplicationsResponse {
    pub applications: Vec<CandidateApplicationRow>,
    pub summary: StatusSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecruiterApplicationsResponse {
    pub applications: Vec<RecruiterApplicationRow>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationHistoryResponse {
    pub application_id: Uuid,
    pub events: Vec<ApplicationStatusEvent>,
}
