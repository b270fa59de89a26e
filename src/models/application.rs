//! Job applications and their review workflow.
//!
//! ```text
//!            create
//!   (none) ---------> PENDING
//!                      |   \
//!              viewed  |    \  shortlist / reject
//!                      v     \
//!                    VIEWED ---> SHORTLISTED | REJECTED   (terminal)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Viewed,
    Shortlisted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Invalid status: {0}")]
    UnknownStatus(String),
    #[error("Application is already {0}")]
    Unchanged(ApplicationStatus),
    #[error("Application is {0} and can no longer change status")]
    Terminal(ApplicationStatus),
    #[error("Cannot move application from {from} back to {to}")]
    Backward {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Viewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Viewed => "VIEWED",
            ApplicationStatus::Shortlisted => "SHORTLISTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    /// Position in the review order. SHORTLISTED and REJECTED share the top rank.
    fn rank(&self) -> u8 {
        match self {
            ApplicationStatus::Pending => 0,
            ApplicationStatus::Viewed => 1,
            ApplicationStatus::Shortlisted | ApplicationStatus::Rejected => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }

    /// Checks that moving from `self` to `next` goes strictly forward.
    pub fn transition_to(self, next: ApplicationStatus) -> Result<ApplicationStatus, TransitionError> {
        if next == self {
            return Err(TransitionError::Unchanged(self));
        }
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        if next.rank() <= self.rank() {
            return Err(TransitionError::Backward { from: self, to: next });
        }
        Ok(next)
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self.transition_to(next).is_ok()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TransitionError::UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    /// Copy of the candidate's resume at the time of applying.
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// One entry of the append-only status log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApplicationStatusEvent {
    pub id: i64,
    pub application_id: Uuid,
    pub from_status: Option<ApplicationStatus>,
    pub to_status: ApplicationStatus,
    pub changed_by: Option<Uuid>,
    pub changed_by_operator: bool,
    pub changed_at: DateTime<Utc>,
}

/// Application as seen by the candidate who owns it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CandidateApplicationRow {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub cover_letter: Option<String>,
    pub job_id: Uuid,
    pub job_title: String,
    pub job_location: String,
    pub job_salary: Option<String>,
    pub job_type: Option<String>,
    pub job_status: crate::models::job::JobStatus,
    pub company: Option<String>,
}

/// Application as seen by the recruiter who owns the job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RecruiterApplicationRow {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub job_id: Uuid,
    pub job_title: String,
    pub job_location: String,
    pub candidate_id: Uuid,
    pub candidate_email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema,
)]
pub struct StatusSummary {
    pub total: i64,
    pub pending: i64,
    pub viewed: i64,
    pub shortlisted: i64,
    pub rejected: i64,
}

impl StatusSummary {
    pub fn add(&mut self, status: ApplicationStatus, count: i64) {
        self.total += count;
        match status {
            ApplicationStatus::Pending => self.pending += count,
            ApplicationStatus::Viewed => self.viewed += count,
            ApplicationStatus::Shortlisted => self.shortlisted += count,
            ApplicationStatus::Rejected => self.rejected += count,
        }
    }

    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (ApplicationStatus, i64)>,
    {
        let mut summary = Self::default();
        for (status, count) in counts {
            summary.add(status, count);
        }
        summary
    }
}
