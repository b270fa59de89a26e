use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::job_dto::{page_offset, CreateJobPayload, JobFilter, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::middleware::auth::Principal;
use crate::models::job::{Job, JobListing, JobStatus};

const JOB_COLUMNS: &str = "id, recruiter_id, title, description, location, salary, job_type, experience, skills, status, created_at, updated_at";

/// Job columns plus the recruiter's company and a live application count.
pub(crate) const LISTING_SELECT: &str = r#"
    SELECT j.id, j.recruiter_id, j.title, j.description, j.location, j.salary, j.job_type,
           j.experience, j.skills, j.status, j.created_at, j.updated_at,
           rp.company_name AS company,
           rp.company_email AS company_email,
           rp.description AS company_description,
           (SELECT COUNT(*) FROM applications a WHERE a.job_id = j.id) AS applications_count
    FROM jobs j
    LEFT JOIN recruiter_profiles rp ON rp.user_id = j.recruiter_id
"#;

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

pub struct JobList {
    pub items: Vec<JobListing>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Only the owning recruiter or an admin may change a job.
pub fn can_manage(principal: &Principal, job: &Job) -> bool {
    principal.is_admin() || principal.user_id() == Some(job.recruiter_id)
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
    builder.push(" WHERE j.status = ").push_bind(filter.status);
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (j.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(location) = &filter.location {
        builder
            .push(" AND j.location ILIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(job_type) = &filter.job_type {
        builder.push(" AND j.job_type = ").push_bind(job_type.clone());
    }
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, recruiter_id: Uuid, payload: CreateJobPayload) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (
                recruiter_id, title, description, location, salary, job_type, experience, skills, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'OPEN')
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(recruiter_id)
        .bind(payload.title.trim())
        .bind(payload.description.trim())
        .bind(payload.location.trim())
        .bind(payload.salary)
        .bind(payload.job_type)
        .bind(payload.experience)
        .bind(payload.skills.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(job_id = %job.id, recruiter_id = %recruiter_id, "job created");
        Ok(job)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateJobPayload) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                salary = COALESCE($5, salary),
                job_type = COALESCE($6, job_type),
                experience = COALESCE($7, experience),
                skills = COALESCE($8, skills),
                status = COALESCE($9, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(id)
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.location)
        .bind(payload.salary)
        .bind(payload.job_type)
        .bind(payload.experience)
        .bind(payload.skills)
        .bind(payload.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".into()))?;

        Ok(job)
    }

    /// Stops new applications; existing ones are left as they are.
    pub async fn close(&self, id: Uuid) -> Result<Job> {
        self.update(
            id,
            UpdateJobPayload {
                status: Some(JobStatus::Closed),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn list(&self, filter: &JobFilter) -> Result<JobList> {
        let offset = page_offset(filter.page, filter.limit);

        let mut items_query: QueryBuilder<Postgres> = QueryBuilder::new(LISTING_SELECT);
        push_filters(&mut items_query, filter);
        items_query
            .push(" ORDER BY j.created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let mut total_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM jobs j");
        push_filters(&mut total_query, filter);

        let items = items_query
            .build_query_as::<JobListing>()
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = total_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(JobList {
            items,
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Job> {
        sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))
    }

    pub async fn get_listing(&self, id: Uuid) -> Result<JobListing> {
        sqlx::query_as::<_, JobListing>(&format!("{} WHERE j.id = $1", LISTING_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Job not found".into()));
        }
        Ok(())
    }

    /// Loads the job and checks the caller may manage it.
    pub async fn get_managed(&self, principal: &Principal, id: Uuid) -> Result<Job> {
        let job = self.get_by_id(id).await?;
        if !can_manage(principal, &job) {
            return Err(Error::Unauthorized(
                "Only the recruiter who posted this job can change it".into(),
            ));
        }
        Ok(job)
    }
}
