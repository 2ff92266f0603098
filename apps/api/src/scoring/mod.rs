//! Scoring client: the single point of entry for calls to the remote resume
//! scoring service.
//!
//! One attempt per request, bounded by the configured timeout. Failures are
//! surfaced to the caller, who may resubmit.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod handlers;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not read staged upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scoring service returned score {0}, outside 0..=100")]
    ScoreOutOfRange(f64),
}

/// Everything the scoring service is sent for one resume.
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    pub cv_path: PathBuf,
    pub file_name: String,
    pub content_type: &'static str,
    pub job_id: Uuid,
    pub company_id: Uuid,
    pub job_title: String,
    pub jd_text: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    #[serde(default, alias = "candidate_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(alias = "relevanceScore")]
    pub score: f64,
    /// Advisory only; status is always derived locally.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub feedback: String,
}

#[async_trait]
pub trait ResumeScorer: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResult, ScoringError>;
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(alias = "detail", alias = "error")]
    message: String,
}

/// Posts the resume as multipart form data to the scoring endpoint.
#[derive(Clone)]
pub struct HttpResumeScorer {
    client: Client,
    url: String,
}

impl HttpResumeScorer {
    pub fn new(url: String, timeout: Duration) -> Result<Self, ScoringError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url,
        })
    }
}

#[async_trait]
impl ResumeScorer for HttpResumeScorer {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResult, ScoringError> {
        let bytes = tokio::fs::read(&request.cv_path).await?;
        let cv = Part::bytes(bytes)
            .file_name(request.file_name.clone())
            .mime_str(request.content_type)?;

        let form = Form::new()
            .part("cv", cv)
            .text("job_id", request.job_id.to_string())
            .text("company_id", request.company_id.to_string())
            .text("jd_text", request.jd_text.clone())
            .text("job_title", request.job_title.clone())
            .text("email", request.email.clone().unwrap_or_default());

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Scoring service returned {}", status);
            let message = serde_json::from_str::<ServiceError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(ScoringError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let result: ScoringResult = serde_json::from_str(&body)?;
        if !result.score.is_finite() || !(0.0..=100.0).contains(&result.score) {
            return Err(ScoringError::ScoreOutOfRange(result.score));
        }

        debug!(job_id = %request.job_id, score = result.score, "Resume scored");
        Ok(result)
    }
}
