//! Router-level test harness: in-memory store, stub collaborators and a
//! throwaway upload directory.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{credentials::hash_credential, SessionKeys};
use crate::candidates::status::Thresholds;
use crate::config::Config;
use crate::models::{
    candidate::{Candidate, CandidateStatus, NewCandidate},
    company::NewCompany,
    job::{Job, JobStatus, NewJob},
    user::{NewUser, Role, User},
};
use crate::resumes::extract::{DocumentKind, ExtractError, TextExtractor};
use crate::routes::build_router;
use crate::scoring::{ResumeScorer, ScoringError, ScoringRequest, ScoringResult};
use crate::state::AppState;
use crate::store::{memory::MemoryStore, CandidateStore, CompanyStore, JobStore, UserStore};

pub const PASSWORD: &str = "hunter2-but-longer";
const BOUNDARY: &str = "cvalign-test-boundary";
const UNUSABLE_HASH: &str = "not-a-phc-string";

/// Reads the staged file back as UTF-8, so tests upload plain text.
pub struct StubExtractor;

impl TextExtractor for StubExtractor {
    fn extract(&self, path: &Path, _kind: DocumentKind) -> Result<String, ExtractError> {
        Ok(String::from_utf8_lossy(&std::fs::read(path)?).into_owned())
    }
}

pub enum StubOutcome {
    Score(ScoringResult),
    Fail,
}

/// Answers with a canned outcome and remembers whether the upload was still
/// on disk when it was called.
pub struct StubScorer {
    outcome: StubOutcome,
    pub seen: Mutex<Vec<(PathBuf, bool)>>,
}

#[async_trait]
impl ResumeScorer for StubScorer {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResult, ScoringError> {
        self.seen
            .lock()
            .unwrap()
            .push((request.cv_path.clone(), request.cv_path.exists()));
        match &self.outcome {
            StubOutcome::Score(result) => Ok(result.clone()),
            StubOutcome::Fail => Err(ScoringError::Api {
                status: 503,
                message: "model offline".into(),
            }),
        }
    }
}

pub fn scored(score: f64, email: Option<&str>) -> StubOutcome {
    StubOutcome::Score(ScoringResult {
        name: Some("Remote Name".into()),
        email: email.map(str::to_string),
        phone: None,
        score,
        status: Some("rejected".into()),
        strengths: vec!["rust".into()],
        weaknesses: vec![],
        feedback: "solid".into(),
    })
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub scorer: Arc<StubScorer>,
    pub sessions: SessionKeys,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new(outcome: StubOutcome) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_url: String::new(),
            db_max_connections: 1,
            jwt_secret: "test-secret".into(),
            port: 0,
            rust_log: "debug".into(),
            scoring_url: "http://scoring.invalid/api/evaluate-cv".into(),
            scoring_timeout_secs: 1,
            upload_dir: upload_dir.path().to_path_buf(),
            max_upload_bytes: 64 * 1024,
            max_files_per_upload: 3,
            session_ttl_secs: 3600,
            bootstrap_admin: None,
        };
        let store = Arc::new(MemoryStore::new());
        let scorer = Arc::new(StubScorer {
            outcome,
            seen: Mutex::new(Vec::new()),
        });
        let sessions = SessionKeys::new(config.jwt_secret.as_bytes(), config.session_ttl_secs);
        let state = AppState {
            store: store.clone(),
            sessions: sessions.clone(),
            scorer: scorer.clone(),
            extractor: Arc::new(StubExtractor),
            config,
        };
        Self {
            router: build_router(state),
            store,
            scorer,
            sessions,
            upload_dir,
        }
    }

    pub async fn company(&self, name: &str) -> Uuid {
        self.store
            .create_company(NewCompany {
                name: name.into(),
                metadata: serde_json::json!({}),
            })
            .await
            .unwrap()
            .id
    }

    /// Stores an identity that cannot log in and returns it with a session
    /// token.
    pub async fn user(&self, email: &str, role: Role, company_id: Option<Uuid>) -> (User, String) {
        self.insert_user(email, role, company_id, UNUSABLE_HASH.into())
            .await
    }

    /// Like [`TestApp::user`] but with [`PASSWORD`] as a working credential.
    pub async fn user_with_password(
        &self,
        email: &str,
        role: Role,
        company_id: Option<Uuid>,
    ) -> (User, String) {
        self.insert_user(email, role, company_id, hash_credential(PASSWORD).unwrap())
            .await
    }

    async fn insert_user(
        &self,
        email: &str,
        role: Role,
        company_id: Option<Uuid>,
        credential_hash: String,
    ) -> (User, String) {
        let user = self
            .store
            .create_user(NewUser {
                name: email.split('@').next().unwrap_or(email).into(),
                email: email.into(),
                credential_hash,
                role,
                company_id,
            })
            .await
            .unwrap();
        let token = self.sessions.issue(&user).unwrap();
        (user, token)
    }

    pub async fn job(&self, company_id: Uuid, created_by: Uuid, thresholds: Thresholds) -> Job {
        self.store
            .create_job(NewJob {
                title: "Backend Engineer".into(),
                department: "Engineering".into(),
                skills: vec!["rust".into(), "sql".into()],
                experience_years: 3,
                description: "Build services".into(),
                created_by,
                thresholds,
                status: JobStatus::Active,
                company_id,
            })
            .await
            .unwrap()
    }

    pub async fn candidate(&self, job: &Job, name: &str, score: Option<f64>) -> Candidate {
        self.store
            .create_candidate(NewCandidate {
                name: name.into(),
                email: None,
                phone: None,
                job_id: job.id,
                resume_id: None,
                extracted_text: String::new(),
                relevance_score: score,
                strengths: vec![],
                weaknesses: vec![],
                feedback: String::new(),
                status: CandidateStatus::Pending,
                company_id: job.company_id,
            })
            .await
            .unwrap()
    }

    pub async fn cv_count(&self, job_id: Uuid) -> i32 {
        self.store.find_job(job_id).await.unwrap().unwrap().cv_count
    }

    pub fn upload_dir_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.upload_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub struct UploadFile<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub content: &'a [u8],
}

pub fn multipart_request(
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    files: &[UploadFile<'_>],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn pdf<'a>(file_name: &'a str, content: &'a str) -> UploadFile<'a> {
    UploadFile {
        field: "cvs",
        file_name,
        content_type: "application/pdf",
        content: content.as_bytes(),
    }
}
