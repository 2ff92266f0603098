use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::candidates::status::Thresholds;
use crate::models::UnknownVariant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
    Draft,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
            JobStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(JobStatus::Active),
            "closed" => Ok(JobStatus::Closed),
            "draft" => Ok(JobStatus::Draft),
            other => Err(UnknownVariant {
                kind: "job status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub skills: Vec<String>,
    pub experience_years: i32,
    pub description: String,
    pub created_by: Option<Uuid>,
    /// Advisory counter of ingested resumes; may drift from the real row count.
    pub cv_count: i32,
    pub shortlist_threshold: f64,
    pub reject_threshold: f64,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            shortlist: self.shortlist_threshold,
            reject: self.reject_threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub department: String,
    pub skills: Vec<String>,
    pub experience_years: i32,
    pub description: String,
    pub created_by: Uuid,
    pub thresholds: Thresholds,
    pub status: JobStatus,
    pub company_id: Uuid,
}

/// Editable job fields. Owner company and creator are fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub department: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub description: Option<String>,
    pub shortlist_threshold: Option<f64>,
    pub reject_threshold: Option<f64>,
    pub status: Option<JobStatus>,
}

impl JobChanges {
    pub fn apply_to(&self, job: &Job) -> Job {
        let mut updated = job.clone();
        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(department) = &self.department {
            updated.department = department.clone();
        }
        if let Some(skills) = &self.skills {
            updated.skills = skills.clone();
        }
        if let Some(years) = self.experience_years {
            updated.experience_years = years;
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(shortlist) = self.shortlist_threshold {
            updated.shortlist_threshold = shortlist;
        }
        if let Some(reject) = self.reject_threshold {
            updated.reject_threshold = reject;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        updated
    }
}
