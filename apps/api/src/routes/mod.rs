pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, auth, candidates, jobs, resumes, scoring};

/// Multipart framing and text fields on top of the file payloads.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_mul(state.config.max_files_per_upload)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/auth/login", post(auth::handlers::handle_login))
        .route("/api/auth/register", post(auth::handlers::handle_register))
        .route("/api/auth/me", get(auth::handlers::handle_me))
        // Tenants and identities
        .route(
            "/api/admin/companies",
            post(admin::handlers::handle_create_company).get(admin::handlers::handle_list_companies),
        )
        .route(
            "/api/admin/users",
            post(admin::handlers::handle_create_user).get(admin::handlers::handle_list_users),
        )
        .route(
            "/api/admin/users/:id",
            patch(admin::handlers::handle_update_user).delete(admin::handlers::handle_delete_user),
        )
        // Jobs
        .route(
            "/api/jobs",
            post(jobs::handlers::handle_create).get(jobs::handlers::handle_list),
        )
        .route(
            "/api/jobs/:id",
            get(jobs::handlers::handle_get)
                .put(jobs::handlers::handle_update)
                .delete(jobs::handlers::handle_delete),
        )
        // Resumes
        .route("/api/cvs/upload", post(resumes::handlers::handle_upload))
        .route(
            "/api/cvs/job/:job_id",
            get(resumes::handlers::handle_list_for_job),
        )
        .route(
            "/api/cvs/:id",
            get(resumes::handlers::handle_get).delete(resumes::handlers::handle_delete),
        )
        // Candidates
        .route("/api/candidates", get(candidates::handlers::handle_list))
        .route(
            "/api/candidates/:id",
            get(candidates::handlers::handle_get).delete(candidates::handlers::handle_delete),
        )
        .route(
            "/api/candidates/:id/status",
            patch(candidates::handlers::handle_update_status),
        )
        .route(
            "/api/candidates/:id/evaluate",
            patch(candidates::handlers::handle_evaluate),
        )
        // Direct scoring
        .route(
            "/api/ml/evaluate-cv",
            post(scoring::handlers::handle_evaluate_cv),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
