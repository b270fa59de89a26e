use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::auth_dto::{RegisterPayload, UpdateProfilePayload};
use crate::dto::job_dto::{page_offset, MAX_PAGE, MAX_PAGE_SIZE};
use crate::error::{Error, Result};
use crate::models::user::{CandidateProfile, Profile, RecruiterProfile, User, UserRole};
use crate::utils::crypto::{hash_password, verify_password};

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at";
const CANDIDATE_PROFILE_COLUMNS: &str =
    "user_id, first_name, last_name, phone, photo_url, resume_url, bio, portfolio_url, updated_at";
const RECRUITER_PROFILE_COLUMNS: &str =
    "user_id, company_name, company_email, description, updated_at";

/// Which candidate asset column an upload lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateAsset {
    Photo,
    Resume,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct UserSummaryRow {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub jobs_count: i64,
    pub applications_count: i64,
}

pub struct UserList {
    pub items: Vec<(UserSummaryRow, Option<Profile>)>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the account and its role profile in one transaction.
    pub async fn register(&self, payload: &RegisterPayload, role: UserRole) -> Result<User> {
        let email = payload.email.trim().to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(Error::Conflict("User with this email already exists".into()));
        }
        let password_hash = hash_password(&payload.password)?;

        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        match role {
            UserRole::Candidate => {
                sqlx::query(
                    "INSERT INTO candidate_profiles (user_id, first_name, last_name, phone) VALUES ($1, $2, $3, $4)",
                )
                .bind(user.id)
                .bind(&payload.first_name)
                .bind(&payload.last_name)
                .bind(&payload.phone)
                .execute(&mut *tx)
                .await?;
            }
            UserRole::Recruiter => {
                sqlx::query(
                    "INSERT INTO recruiter_profiles (user_id, company_name, company_email, description) VALUES ($1, $2, $3, $4)",
                )
                .bind(user.id)
                .bind(payload.company_name.as_deref().unwrap_or_default().trim())
                .bind(payload.company_email.as_deref().unwrap_or_default().trim())
                .bind(&payload.description)
                .execute(&mut *tx)
                .await?;
            }
            UserRole::Admin => {}
        }
        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = %role, "user registered");
        Ok(user)
    }

    /// Returns the user only when the password matches.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_by_email(&email.trim().to_lowercase()).await? else {
            return Ok(None);
        };
        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn candidate_profile(&self, user_id: Uuid) -> Result<Option<CandidateProfile>> {
        let profile = sqlx::query_as::<_, CandidateProfile>(&format!(
            "SELECT {} FROM candidate_profiles WHERE user_id = $1",
            CANDIDATE_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn recruiter_profile(&self, user_id: Uuid) -> Result<Option<RecruiterProfile>> {
        let profile = sqlx::query_as::<_, RecruiterProfile>(&format!(
            "SELECT {} FROM recruiter_profiles WHERE user_id = $1",
            RECRUITER_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn profile_for(&self, user_id: Uuid, role: UserRole) -> Result<Option<Profile>> {
        let profile = match role {
            UserRole::Candidate => self.candidate_profile(user_id).await?.map(Profile::Candidate),
            UserRole::Recruiter => self.recruiter_profile(user_id).await?.map(Profile::Recruiter),
            UserRole::Admin => None,
        };
        Ok(profile)
    }

    /// Applies the fields relevant to `role`; absent fields keep their current value.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        role: UserRole,
        payload: &UpdateProfilePayload,
    ) -> Result<Option<Profile>> {
        match role {
            UserRole::Candidate => {
                let profile = sqlx::query_as::<_, CandidateProfile>(&format!(
                    r#"
                    UPDATE candidate_profiles
                    SET first_name = COALESCE($2, first_name),
                        last_name = COALESCE($3, last_name),
                        phone = COALESCE($4, phone),
                        bio = COALESCE($5, bio),
                        portfolio_url = COALESCE($6, portfolio_url),
                        updated_at = NOW()
                    WHERE user_id = $1
                    RETURNING {}
                    "#,
                    CANDIDATE_PROFILE_COLUMNS
                ))
                .bind(user_id)
                .bind(&payload.first_name)
                .bind(&payload.last_name)
                .bind(&payload.phone)
                .bind(&payload.bio)
                .bind(&payload.portfolio_url)
                .fetch_one(&self.pool)
                .await?;
                Ok(Some(Profile::Candidate(profile)))
            }
            UserRole::Recruiter => {
                let profile = sqlx::query_as::<_, RecruiterProfile>(&format!(
                    r#"
                    UPDATE recruiter_profiles
                    SET company_name = COALESCE($2, company_name),
                        company_email = COALESCE($3, company_email),
                        description = COALESCE($4, description),
                        updated_at = NOW()
                    WHERE user_id = $1
                    RETURNING {}
                    "#,
                    RECRUITER_PROFILE_COLUMNS
                ))
                .bind(user_id)
                .bind(&payload.company_name)
                .bind(&payload.company_email)
                .bind(&payload.description)
                .fetch_one(&self.pool)
                .await?;
                Ok(Some(Profile::Recruiter(profile)))
            }
            UserRole::Admin => Ok(None),
        }
    }

    pub async fn set_candidate_asset(
        &self,
        user_id: Uuid,
        asset: CandidateAsset,
        url: &str,
    ) -> Result<CandidateProfile> {
        let column = match asset {
            CandidateAsset::Photo => "photo_url",
            CandidateAsset::Resume => "resume_url",
        };
        let profile = sqlx::query_as::<_, CandidateProfile>(&format!(
            "UPDATE candidate_profiles SET {} = $2, updated_at = NOW() WHERE user_id = $1 RETURNING {}",
            column, CANDIDATE_PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate profile not found".into()))?;
        Ok(profile)
    }

    pub async fn list(&self, role: Option<UserRole>, page: i64, limit: i64) -> Result<UserList> {
        let page = page.clamp(1, MAX_PAGE);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = page_offset(page, limit);

        let mut items_query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT u.id, u.email, u.role, u.created_at,
                (SELECT COUNT(*) FROM jobs j WHERE j.recruiter_id = u.id) AS jobs_count,
                (SELECT COUNT(*) FROM applications a WHERE a.candidate_id = u.id) AS applications_count
            FROM users u
            "#,
        );
        let mut total_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users u");
        if let Some(role) = role {
            items_query.push(" WHERE u.role = ").push_bind(role);
            total_query.push(" WHERE u.role = ").push_bind(role);
        }
        items_query
            .push(" ORDER BY u.created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = items_query
            .build_query_as::<UserSummaryRow>()
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = total_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let profile = self.profile_for(row.id, row.role).await?;
            items.push((row, profile));
        }

        Ok(UserList {
            items,
            total,
            page,
            limit,
        })
    }

    /// Removes the account; jobs, applications and profiles go with it via cascades.
    pub async fn delete(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".into()))?;
        Ok(user)
    }
}
