use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{self, Action, Caller};
use crate::admin::identities::{create_identity, CreateUserRequest};
use crate::auth::credentials::verify_credential;
use crate::errors::{required, AppError};
use crate::models::user::{normalize_email, Role, UserView};
use crate::state::AppState;
use crate::store::UserStore;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = normalize_email(&required(req.email, "email")?);
    let password = required(req.password, "password")?;

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !verify_credential(&password, &user.credential_hash)? {
        warn!(user_id = %user.id, "Login rejected");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.sessions.issue(&user)?;
    info!(user_id = %user.id, "Session issued");
    Ok(Json(SessionResponse {
        token,
        user: UserView::from(&user),
    }))
}

/// POST /api/auth/register
/// Admin-only. Returns a session for the new identity.
pub async fn handle_register(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    access::require(&caller, Action::ManageUsers)?;
    let user = create_identity(state.store.as_ref(), req).await?;
    let token = state.sessions.issue(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            user: UserView::from(&user),
        }),
    ))
}

/// GET /api/auth/me
/// Answered from the session claims alone.
pub async fn handle_me(caller: Caller) -> Result<Json<ProfileResponse>, AppError> {
    let identity = access::require(&caller, Action::ReadProfile)?;
    Ok(Json(ProfileResponse {
        id: identity.id(),
        name: identity.name().to_string(),
        email: identity.email().to_string(),
        role: identity.role(),
        company_id: identity.company_id(),
    }))
}
