use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::job::{Job, JobListing, JobStatus};
use crate::services::job_service::JobList;

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;

/// Clamps a requested page into `1..=MAX_PAGE`.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).clamp(1, MAX_PAGE)
}

/// Row offset of `page`; saturates instead of overflowing.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).max(0).saturating_mul(limit)
}

/// Skills arrive either as a JSON array or as one comma-separated string.
#[derive(Deserialize)]
#[serde(untagged)]
enum SkillsInput {
    List(Vec<String>),
    Csv(String),
}

fn normalize_skills<I: IntoIterator<Item = String>>(raw: I) -> Vec<String> {
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn deserialize_skills<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<SkillsInput>::deserialize(deserializer)?;
    Ok(input.map(|skills| match skills {
        SkillsInput::List(list) => normalize_skills(list),
        SkillsInput::Csv(csv) => normalize_skills(csv.split(',').map(str::to_string)),
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateJobPayload {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "deserialize_skills")]
    #[schema(value_type = Option<Vec<String>>)]
    pub skills: Option<Vec<String>>,
}

impl CreateJobPayload {
    /// Rejects whitespace-only required fields, which `length(min = 1)` lets through.
    pub fn check_required(&self) -> Result<()> {
        if [&self.title, &self.description, &self.location]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(Error::BadRequest(
                "Title, description, and location are required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "deserialize_skills")]
    #[schema(value_type = Option<Vec<String>>)]
    pub skills: Option<Vec<String>>,
    pub status: Option<JobStatus>,
}

impl UpdateJobPayload {
    pub fn check_required(&self) -> Result<()> {
        if [&self.title, &self.description, &self.location]
            .iter()
            .any(|v| v.as_deref().is_some_and(|s| s.trim().is_empty()))
        {
            return Err(Error::BadRequest(
                "Title, description, and location cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct JobListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    /// OPEN or CLOSED; defaults to OPEN.
    pub status: Option<String>,
}

/// Filters after defaulting and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFilter {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub status: JobStatus,
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl TryFrom<JobListQuery> for JobFilter {
    type Error = Error;

    fn try_from(query: JobListQuery) -> Result<Self> {
        let status = match non_blank(query.status) {
            Some(raw) => raw.parse::<JobStatus>().map_err(Error::BadRequest)?,
            None => JobStatus::Open,
        };
        Ok(Self {
            page: clamp_page(query.page),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            search: non_blank(query.search),
            location: non_blank(query.location),
            job_type: non_blank(query.job_type),
            status,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<JobListing>,
    pub pagination: Pagination,
}

impl From<JobList> for JobListResponse {
    fn from(value: JobList) -> Self {
        Self {
            jobs: value.items,
            pagination: Pagination::new(value.page, value.limit, value.total),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobDetail {
    #[serde(flatten)]
    pub listing: JobListing,
    pub has_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobDetailResponse {
    pub job: JobDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobResponse {
    pub message: String,
    pub job: Job,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skills_accept_csv_or_list() {
        let from_csv: CreateJobPayload = serde_json::from_value(json!({
            "title": "Rust dev", "description": "d", "location": "Remote",
            "skills": "rust, tokio,, sql "
        }))
        .unwrap();
        assert_eq!(from_csv.skills.unwrap(), vec!["rust", "tokio", "sql"]);

        let from_list: CreateJobPayload = serde_json::from_value(json!({
            "title": "Rust dev", "description": "d", "location": "Remote",
            "skills": ["axum", " "]
        }))
        .unwrap();
        assert_eq!(from_list.skills.unwrap(), vec!["axum"]);

        let absent: CreateJobPayload = serde_json::from_value(json!({
            "title": "Rust dev", "description": "d", "location": "Remote"
        }))
        .unwrap();
        assert!(absent.skills.is_none());
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let payload: CreateJobPayload = serde_json::from_value(json!({
            "title": "  ", "description": "d", "location": "Remote"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert!(matches!(payload.check_required(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn updates_may_omit_but_not_blank_required_fields() {
        assert!(UpdateJobPayload::default().check_required().is_ok());
        let blank = UpdateJobPayload {
            location: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(blank.check_required(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn list_query_defaults_to_open_first_page() {
        let filter = JobFilter::try_from(JobListQuery::default()).unwrap();
        assert_eq!(filter.status, JobStatus::Open);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn list_query_clamps_and_validates() {
        let filter = JobFilter::try_from(JobListQuery {
            page: Some(-3),
            limit: Some(10_000),
            status: Some("CLOSED".into()),
            search: Some("   ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_PAGE_SIZE);
        assert_eq!(filter.status, JobStatus::Closed);
        assert!(filter.search.is_none());

        let bad = JobFilter::try_from(JobListQuery {
            status: Some("ARCHIVED".into()),
            ..Default::default()
        });
        assert!(matches!(bad, Err(Error::BadRequest(_))));
    }

    #[test]
    fn huge_pages_are_clamped_and_offsets_never_overflow() {
        let filter = JobFilter::try_from(JobListQuery {
            page: Some(i64::MAX),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.page, MAX_PAGE);
        assert_eq!(
            page_offset(filter.page, filter.limit),
            (MAX_PAGE - 1) * DEFAULT_PAGE_SIZE
        );
        assert_eq!(page_offset(i64::MAX, MAX_PAGE_SIZE), i64::MAX);
        assert_eq!(page_offset(i64::MIN, MAX_PAGE_SIZE), 0);
        assert_eq!(page_offset(1, MAX_PAGE_SIZE), 0);
    }

    #[test]
    fn pagination_rounds_up() {
        assert_eq!(Pagination::new(1, 12, 25).pages, 3);
        assert_eq!(Pagination::new(1, 12, 0).pages, 0);
    }
}
