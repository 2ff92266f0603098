use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::access::{self, scope_filter, Action, Caller};
use crate::admin::identities::{
    create_identity, delete_identity, update_identity, CreateUserRequest, UpdateUserRequest,
};
use crate::errors::{required_text, AppError};
use crate::models::company::{Company, NewCompany};
use crate::models::user::UserView;
use crate::state::AppState;
use crate::store::{CompanyStore, UserStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyRequest {
    pub name: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub company_id: Option<Uuid>,
}

/// POST /api/admin/companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    access::require(&caller, Action::ManageCompanies)?;
    let company = state
        .store
        .create_company(NewCompany {
            name: required_text(req.name, "name")?,
            metadata: req.metadata.unwrap_or_else(|| json!({})),
        })
        .await?;
    tracing::info!(company_id = %company.id, "Company created");
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/admin/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Company>>, AppError> {
    access::require(&caller, Action::ManageCompanies)?;
    Ok(Json(state.store.list_companies().await?))
}

/// POST /api/admin/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    access::require(&caller, Action::ManageUsers)?;
    let user = create_identity(state.store.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// GET /api/admin/users?companyId=
pub async fn handle_list_users(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let identity = access::require(&caller, Action::ManageUsers)?;
    let users = state
        .store
        .list_users(scope_filter(identity, query.company_id))
        .await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

/// PATCH /api/admin/users/:id
pub async fn handle_update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserView>, AppError> {
    access::require(&caller, Action::ManageUsers)?;
    let user = update_identity(state.store.as_ref(), id, req).await?;
    Ok(Json(UserView::from(&user)))
}

/// DELETE /api/admin/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    access::require(&caller, Action::ManageUsers)?;
    delete_identity(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
