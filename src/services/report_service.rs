//! Dashboard counts. Everything here is computed from the current rows on each request,
//! so cost grows with table size; nothing is cached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{ApplicationStatus, StatusSummary};
use crate::models::job::{JobListing, JobStatus};
use crate::models::user::UserRole;
use crate::services::job_service::LISTING_SELECT;

const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UsersByRole {
    pub total: i64,
    pub candidates: i64,
    pub recruiters: i64,
    pub admins: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobsByStatus {
    pub total: i64,
    pub open: i64,
    pub closed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RecentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminOverview {
    pub users: UsersByRole,
    pub jobs: JobsByStatus,
    pub applications: StatusSummary,
    pub recent_users: Vec<RecentUser>,
    pub recent_jobs: Vec<JobListing>,
}

/// One of the recruiter's jobs with its application counts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JobStats {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub job_type: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub applications: StatusSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecruiterTotals {
    pub total_jobs: i64,
    pub open_jobs: i64,
    pub closed_jobs: i64,
    pub total_applications: i64,
    pub applications: StatusSummary,
}

impl RecruiterTotals {
    pub fn from_jobs(jobs: &[JobStats]) -> Self {
        let mut totals = Self::default();
        for job in jobs {
            totals.total_jobs += 1;
            match job.status {
                JobStatus::Open => totals.open_jobs += 1,
                JobStatus::Closed => totals.closed_jobs += 1,
            }
            let counts = job.applications;
            totals.applications.add(ApplicationStatus::Pending, counts.pending);
            totals.applications.add(ApplicationStatus::Viewed, counts.viewed);
            totals.applications.add(ApplicationStatus::Shortlisted, counts.shortlisted);
            totals.applications.add(ApplicationStatus::Rejected, counts.rejected);
        }
        totals.total_applications = totals.applications.total;
        totals
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecruiterDashboard {
    pub jobs: Vec<JobStats>,
    pub totals: RecruiterTotals,
}

#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn admin_overview(&self) -> Result<AdminOverview> {
        let role_counts = sqlx::query_as::<_, (UserRole, i64)>(
            "SELECT role, COUNT(*) FROM users GROUP BY role",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut users = UsersByRole::default();
        for (role, count) in role_counts {
            users.total += count;
            match role {
                UserRole::Candidate => users.candidates += count,
                UserRole::Recruiter => users.recruiters += count,
                UserRole::Admin => users.admins += count,
            }
        }

        let job_counts = sqlx::query_as::<_, (JobStatus, i64)>(
            "SELECT status, COUNT(*) FROM jobs GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut jobs = JobsByStatus::default();
        for (status, count) in job_counts {
            jobs.total += count;
            match status {
                JobStatus::Open => jobs.open += count,
                JobStatus::Closed => jobs.closed += count,
            }
        }

        let application_counts = sqlx::query_as::<_, (ApplicationStatus, i64)>(
            "SELECT status, COUNT(*) FROM applications GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let recent_users = sqlx::query_as::<_, RecentUser>(
            "SELECT id, email, role, created_at FROM users ORDER BY created_at DESC LIMIT $1",
        )
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let recent_jobs = sqlx::query_as::<_, JobListing>(&format!(
            "{} ORDER BY j.created_at DESC LIMIT $1",
            LISTING_SELECT
        ))
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(AdminOverview {
            users,
            jobs,
            applications: StatusSummary::from_counts(application_counts),
            recent_users,
            recent_jobs,
        })
    }

    /// The recruiter's jobs, newest first, each with counts per application status.
    pub async fn recruiter_dashboard(&self, recruiter_id: Uuid) -> Result<RecruiterDashboard> {
        let jobs = sqlx::query_as::<_, JobStats>(
            r#"
            SELECT j.id, j.title, j.location, j.job_type, j.status, j.created_at,
                   COUNT(a.id) AS total,
                   COUNT(a.id) FILTER (WHERE a.status = 'PENDING') AS pending,
                   COUNT(a.id) FILTER (WHERE a.status = 'VIEWED') AS viewed,
                   COUNT(a.id) FILTER (WHERE a.status = 'SHORTLISTED') AS shortlisted,
                   COUNT(a.id) FILTER (WHERE a.status = 'REJECTED') AS rejected
            FROM jobs j
            LEFT JOIN applications a ON a.job_id = j.id
            WHERE j.recruiter_id = $1
            GROUP BY j.id
            ORDER BY j.created_at DESC
            "#,
        )
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?;

        let totals = RecruiterTotals::from_jobs(&jobs);
        Ok(RecruiterDashboard { jobs, totals })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: JobStatus, counts: [(ApplicationStatus, i64); 2]) -> JobStats {
        JobStats {
            id: Uuid::new_v4(),
            title: "Engineer".into(),
            location: "Remote".into(),
            job_type: None,
            status,
            created_at: Utc::now(),
            applications: StatusSummary::from_counts(counts),
        }
    }

    #[test]
    fn totals_add_up_across_jobs() {
        let jobs = vec![
            job(
                JobStatus::Open,
                [(ApplicationStatus::Pending, 2), (ApplicationStatus::Viewed, 1)],
            ),
            job(
                JobStatus::Closed,
                [(ApplicationStatus::Rejected, 3), (ApplicationStatus::Shortlisted, 1)],
            ),
        ];
        let totals = RecruiterTotals::from_jobs(&jobs);

        assert_eq!(totals.total_jobs, 2);
        assert_eq!(totals.open_jobs, 1);
        assert_eq!(totals.closed_jobs, 1);
        assert_eq!(totals.total_applications, 7);
        assert_eq!(
            totals.total_applications,
            jobs.iter().map(|j| j.applications.total).sum::<i64>()
        );
        assert_eq!(totals.applications.rejected, 3);
    }

    #[test]
    fn no_jobs_means_zero_totals() {
        assert_eq!(RecruiterTotals::from_jobs(&[]), RecruiterTotals::default());
    }
}
