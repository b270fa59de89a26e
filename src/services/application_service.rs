use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::dto::application_dto::{ApplyPayload, RecruiterApplicationFilter};
use crate::error::{Error, Result};
use crate::middleware::auth::Principal;
use crate::models::application::{
    Application, ApplicationStatus, ApplicationStatusEvent, CandidateApplicationRow,
    RecruiterApplicationRow, StatusSummary,
};
use crate::models::job::JobStatus;
use crate::models::user::UserRole;
use crate::services::feed_service::{ApplicationEvent, ApplicationEventKind, ApplicationFeed};

const APPLICATION_COLUMNS: &str =
    "id, job_id, candidate_id, resume_url, cover_letter, status, applied_at";
const EVENT_COLUMNS: &str =
    "id, application_id, from_status, to_status, changed_by, changed_by_operator, changed_at";

/// The job an application is being made against, as far as applying cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct JobGate {
    pub id: Uuid,
    pub recruiter_id: Uuid,
    pub status: JobStatus,
}

/// An application together with the recruiter who owns its job.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ReviewTarget {
    #[sqlx(flatten)]
    application: Application,
    recruiter_id: Uuid,
}

/// Checks the remaining apply preconditions in the order callers see them and returns the
/// resume URL to snapshot onto the new application.
///
/// The candidate role is checked before any of these facts are loaded.
pub fn check_apply(
    resume_url: Option<&str>,
    job: Option<&JobGate>,
    already_applied: bool,
) -> Result<String> {
    let resume_url = resume_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            Error::BadRequest("Please upload your resume before applying".into())
        })?;
    let job = job.ok_or_else(|| Error::NotFound("Job not found".into()))?;
    if job.status != JobStatus::Open {
        return Err(Error::BadRequest(
            "This job is no longer accepting applications".into(),
        ));
    }
    if already_applied {
        return Err(Error::Conflict("You have already applied for this job".into()));
    }
    Ok(resume_url.to_string())
}

/// Decides a status change for `principal` on an application whose job belongs to
/// `job_owner`. Ownership is settled before the requested status is even parsed.
pub fn plan_status_change(
    principal: &Principal,
    job_owner: Uuid,
    current: ApplicationStatus,
    requested: &str,
) -> Result<ApplicationStatus> {
    if !principal.is_admin() && principal.user_id() != Some(job_owner) {
        return Err(Error::Unauthorized(
            "You can only update applications for your own jobs".into(),
        ));
    }
    let next = requested
        .trim()
        .parse::<ApplicationStatus>()
        .map_err(|e| Error::BadRequest(e.to_string()))?;
    current
        .transition_to(next)
        .map_err(|e| Error::BadRequest(e.to_string()))
}

/// The owning candidate, the job's recruiter and admins may read an application's history.
pub fn can_view_history(principal: &Principal, candidate_id: Uuid, job_owner: Uuid) -> bool {
    principal.is_admin()
        || principal
            .user_id()
            .is_some_and(|id| id == candidate_id || id == job_owner)
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    feed: ApplicationFeed,
}

impl ApplicationService {
    pub fn new(pool: PgPool, feed: ApplicationFeed) -> Self {
        Self { pool, feed }
    }

    pub async fn apply(&self, principal: &Principal, payload: ApplyPayload) -> Result<Application> {
        let candidate = principal.require_role(UserRole::Candidate)?;
        let job_id = payload
            .job_id
            .ok_or_else(|| Error::BadRequest("Job ID is required".into()))?;

        let resume_url: Option<String> = sqlx::query_scalar(
            "SELECT resume_url FROM candidate_profiles WHERE user_id = $1",
        )
        .bind(candidate.id)
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        let job = sqlx::query_as::<_, JobGate>("SELECT id, recruiter_id, status FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        let already_applied = match &job {
            Some(job) => self.has_applied(job.id, candidate.id).await?,
            None => false,
        };

        let resume_url = check_apply(resume_url.as_deref(), job.as_ref(), already_applied)?;
        let Some(job) = job else {
            return Err(Error::NotFound("Job not found".into()));
        };

        // A concurrent duplicate trips the unique constraint and surfaces as Conflict.
        let mut tx = self.pool.begin().await?;
        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (job_id, candidate_id, resume_url, cover_letter, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(job.id)
        .bind(candidate.id)
        .bind(&resume_url)
        .bind(payload.cover_letter.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .fetch_one(&mut *tx)
        .await?;
        record_event(&mut tx, &application, None, principal).await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            job_id = %job.id,
            candidate_id = %candidate.id,
            "application submitted"
        );
        self.feed.publish(ApplicationEvent {
            kind: ApplicationEventKind::Created,
            application_id: application.id,
            job_id: job.id,
            recruiter_id: job.recruiter_id,
            status: application.status,
            at: application.applied_at,
        });

        Ok(application)
    }

    pub async fn update_status(
        &self,
        principal: &Principal,
        application_id: Uuid,
        requested: &str,
    ) -> Result<Application> {
        if !principal.is_admin() {
            principal.require_role(UserRole::Recruiter)?;
        }
        let target = self.review_target(application_id).await?;
        let current = target.application.status;
        let next = plan_status_change(principal, target.recruiter_id, current, requested)?;

        // Only moves the row if nobody else changed it since it was read.
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET status = $3 WHERE id = $1 AND status = $2 RETURNING {}",
            APPLICATION_COLUMNS
        ))
        .bind(application_id)
        .bind(current)
        .bind(next)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            Error::Conflict("Application status changed in the meantime; reload and try again".into())
        })?;
        record_event(&mut tx, &updated, Some(current), principal).await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application_id,
            from = %current,
            to = %next,
            actor = principal.actor_kind(),
            "application status changed"
        );
        self.feed.publish(ApplicationEvent {
            kind: ApplicationEventKind::StatusChanged,
            application_id,
            job_id: updated.job_id,
            recruiter_id: target.recruiter_id,
            status: next,
            at: chrono::Utc::now(),
        });

        Ok(updated)
    }

    pub async fn has_applied(&self, job_id: Uuid, candidate_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM applications WHERE job_id = $1 AND candidate_id = $2)",
        )
        .bind(job_id)
        .bind(candidate_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// The candidate's applications, newest first, with a per-status summary.
    pub async fn list_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<(Vec<CandidateApplicationRow>, StatusSummary)> {
        let rows = sqlx::query_as::<_, CandidateApplicationRow>(
            r#"
            SELECT a.id, a.status, a.applied_at, a.cover_letter, a.job_id,
                   j.title AS job_title, j.location AS job_location, j.salary AS job_salary,
                   j.job_type, j.status AS job_status,
                   rp.company_name AS company
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            LEFT JOIN recruiter_profiles rp ON rp.user_id = j.recruiter_id
            WHERE a.candidate_id = $1
            ORDER BY a.applied_at DESC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;

        let summary = StatusSummary::from_counts(rows.iter().map(|row| (row.status, 1)));
        Ok((rows, summary))
    }

    /// Applications on the recruiter's own jobs. A `job_id` belonging to someone else
    /// simply matches nothing.
    pub async fn list_for_recruiter(
        &self,
        recruiter_id: Uuid,
        filter: RecruiterApplicationFilter,
    ) -> Result<Vec<RecruiterApplicationRow>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT a.id, a.status, a.applied_at, a.resume_url, a.cover_letter, a.job_id,
                   j.title AS job_title, j.location AS job_location,
                   a.candidate_id, u.email AS candidate_email,
                   cp.first_name, cp.last_name, cp.phone, cp.photo_url
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            JOIN users u ON u.id = a.candidate_id
            LEFT JOIN candidate_profiles cp ON cp.user_id = a.candidate_id
            WHERE j.recruiter_id =
            "#,
        );
        query.push_bind(recruiter_id);
        if let Some(job_id) = filter.job_id {
            query.push(" AND a.job_id = ").push_bind(job_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND a.status = ").push_bind(status);
        }
        query.push(" ORDER BY a.applied_at DESC");

        let rows = query
            .build_query_as::<RecruiterApplicationRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Status log for one application, oldest first.
    pub async fn history(
        &self,
        principal: &Principal,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationStatusEvent>> {
        let target = self.review_target(application_id).await?;
        if !can_view_history(principal, target.application.candidate_id, target.recruiter_id) {
            return Err(Error::Unauthorized(
                "You cannot view this application's history".into(),
            ));
        }

        let events = sqlx::query_as::<_, ApplicationStatusEvent>(&format!(
            "SELECT {} FROM application_status_events WHERE application_id = $1 ORDER BY changed_at, id",
            EVENT_COLUMNS
        ))
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn review_target(&self, application_id: Uuid) -> Result<ReviewTarget> {
        sqlx::query_as::<_, ReviewTarget>(
            r#"
            SELECT a.id, a.job_id, a.candidate_id, a.resume_url, a.cover_letter, a.status,
                   a.applied_at, j.recruiter_id
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.id = $1
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".into()))
    }
}

async fn record_event(
    tx: &mut Transaction<'_, Postgres>,
    application: &Application,
    from: Option<ApplicationStatus>,
    principal: &Principal,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO application_status_events
            (application_id, from_status, to_status, changed_by, changed_by_operator)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(application.id)
    .bind(from)
    .bind(application.status)
    .bind(principal.user_id())
    .bind(principal.is_operator())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::AuthUser;
    use ApplicationStatus::*;

    fn open_job() -> JobGate {
        JobGate {
            id: Uuid::new_v4(),
            recruiter_id: Uuid::new_v4(),
            status: JobStatus::Open,
        }
    }

    fn user(role: UserRole) -> Principal {
        Principal::User(AuthUser {
            id: Uuid::new_v4(),
            email: "user@example.com".into(),
            role,
        })
    }

    #[test]
    fn apply_succeeds_only_when_every_precondition_holds() {
        let job = open_job();
        let closed = JobGate { status: JobStatus::Closed, ..job };
        let resume = Some("/uploads/resumes/cv.pdf");

        for resume_url in [resume, None, Some("  ")] {
            for gate in [Some(&job), Some(&closed), None] {
                for already in [false, true] {
                    let expected = resume_url.is_some_and(|r| !r.trim().is_empty())
                        && gate.is_some_and(|j| j.status == JobStatus::Open)
                        && !already;
                    let outcome = check_apply(resume_url, gate, already);
                    assert_eq!(outcome.is_ok(), expected);
                }
            }
        }
    }

    #[test]
    fn apply_failures_come_in_order() {
        let job = open_job();
        let closed = JobGate { status: JobStatus::Closed, ..job };

        assert!(matches!(check_apply(None, None, true), Err(Error::BadRequest(_))));
        assert!(matches!(
            check_apply(Some("cv.pdf"), None, false),
            Err(Error::NotFound(_))
        ));
        match check_apply(Some("cv.pdf"), Some(&closed), true) {
            Err(Error::BadRequest(msg)) => assert!(msg.contains("no longer accepting")),
            other => panic!("unexpected {:?}", other),
        }
        match check_apply(Some("cv.pdf"), Some(&job), true) {
            Err(Error::Conflict(msg)) => assert!(msg.contains("already applied")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(check_apply(Some(" cv.pdf "), Some(&job), false).unwrap(), "cv.pdf");
    }

    #[test]
    fn non_owning_recruiter_is_refused_whatever_the_status() {
        let stranger = user(UserRole::Recruiter);
        let owner = Uuid::new_v4();
        for requested in ["VIEWED", "SHORTLISTED", "PENDING", "garbage", ""] {
            for current in ApplicationStatus::ALL {
                assert!(matches!(
                    plan_status_change(&stranger, owner, current, requested),
                    Err(Error::Unauthorized(_))
                ));
            }
        }
    }

    #[test]
    fn owner_moves_forward_only() {
        let owner_id = Uuid::new_v4();
        let owner = Principal::User(AuthUser {
            id: owner_id,
            email: "r@example.com".into(),
            role: UserRole::Recruiter,
        });

        assert_eq!(plan_status_change(&owner, owner_id, Pending, "VIEWED").unwrap(), Viewed);
        assert_eq!(
            plan_status_change(&owner, owner_id, Viewed, "SHORTLISTED").unwrap(),
            Shortlisted
        );
        assert!(matches!(
            plan_status_change(&owner, owner_id, Rejected, "SHORTLISTED"),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            plan_status_change(&owner, owner_id, Viewed, "VIEWED"),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            plan_status_change(&owner, owner_id, Pending, "HIRED"),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn admins_and_operators_review_any_job() {
        let owner = Uuid::new_v4();
        let operator = Principal::Operator { email: "ops@example.com".into() };
        assert_eq!(plan_status_change(&operator, owner, Pending, "REJECTED").unwrap(), Rejected);
        assert_eq!(
            plan_status_change(&user(UserRole::Admin), owner, Viewed, "REJECTED").unwrap(),
            Rejected
        );
    }

    #[test]
    fn history_is_visible_to_the_parties_involved() {
        let candidate_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();
        let candidate = Principal::User(AuthUser {
            id: candidate_id,
            email: "c@example.com".into(),
            role: UserRole::Candidate,
        });
        let owner = Principal::User(AuthUser {
            id: owner_id,
            email: "r@example.com".into(),
            role: UserRole::Recruiter,
        });

        assert!(can_view_history(&candidate, candidate_id, owner_id));
        assert!(can_view_history(&owner, candidate_id, owner_id));
        assert!(can_view_history(&user(UserRole::Admin), candidate_id, owner_id));
        assert!(!can_view_history(&user(UserRole::Candidate), candidate_id, owner_id));
        assert!(!can_view_history(&user(UserRole::Recruiter), candidate_id, owner_id));
    }
}
