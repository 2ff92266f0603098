//! Identity management rules shared by registration and the admin user routes.

use serde::{Deserialize, Deserializer};
use tracing::info;
use uuid::Uuid;

use crate::auth::credentials::hash_credential;
use crate::errors::{required, required_text, AppError};
use crate::models::user::{normalize_email, NewUser, Role, User, UserChanges};
use crate::store::{CompanyStore, Store, StoreError, UserStore};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    /// Absent leaves the company alone; `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub company_id: Option<Option<Uuid>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    raw.parse::<Role>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

fn parse_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(format!("'{raw}' is not a valid email")));
    }
    Ok(email)
}

async fn ensure_company_exists(store: &dyn Store, company_id: Uuid) -> Result<(), AppError> {
    match store.find_company(company_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Validation(format!(
            "companyId {company_id} does not name an existing company"
        ))),
    }
}

fn ensure_scoped(role: Role, company_id: Option<Uuid>) -> Result<(), AppError> {
    if role != Role::Admin && company_id.is_none() {
        return Err(AppError::Validation(format!(
            "companyId is required for role {role}"
        )));
    }
    Ok(())
}

/// Validates and stores a new identity. The plaintext password is hashed
/// here and dropped.
pub async fn create_identity(store: &dyn Store, req: CreateUserRequest) -> Result<User, AppError> {
    let name = required_text(req.name, "name")?;
    let email = parse_email(&required_text(req.email, "email")?)?;
    let password = required(req.password, "password")?;
    if password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }
    let role = match req.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::default(),
    };

    ensure_scoped(role, req.company_id)?;
    if let Some(company_id) = req.company_id {
        ensure_company_exists(store, company_id).await?;
    }

    let user = store
        .create_user(NewUser {
            name,
            email,
            credential_hash: hash_credential(&password)?,
            role,
            company_id: req.company_id,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "Identity created");
    Ok(user)
}

/// Applies an admin edit. The credential is never touched here.
pub async fn update_identity(
    store: &dyn Store,
    id: Uuid,
    req: UpdateUserRequest,
) -> Result<User, AppError> {
    let current = store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let changes = UserChanges {
        name: req
            .name
            .map(|name| required_text(Some(name), "name"))
            .transpose()?,
        email: req.email.as_deref().map(parse_email).transpose()?,
        role: req.role.as_deref().map(parse_role).transpose()?,
        company_id: req.company_id,
    };

    let merged = changes.apply_to(&current);
    ensure_scoped(merged.role, merged.company_id)?;
    if let Some(Some(company_id)) = changes.company_id {
        ensure_company_exists(store, company_id).await?;
    }
    store
        .update_user(id, &changes)
        .await
        .map_err(|e| last_admin_conflict(e, "demote"))?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn delete_identity(store: &dyn Store, id: Uuid) -> Result<(), AppError> {
    let deleted = store
        .delete_user(id)
        .await
        .map_err(|e| last_admin_conflict(e, "delete"))?;
    if !deleted {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(user_id = %id, "Identity deleted");
    Ok(())
}

fn last_admin_conflict(error: StoreError, verb: &str) -> AppError {
    match error {
        StoreError::LastAdmin => AppError::Conflict(format!("Cannot {verb} the last admin")),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Barrier;

    use super::*;
    use crate::models::company::NewCompany;
    use crate::store::memory::MemoryStore;

    fn request(email: &str, role: Option<&str>, company_id: Option<Uuid>) -> CreateUserRequest {
        CreateUserRequest {
            name: Some("Test User".into()),
            email: Some(email.into()),
            password: Some("s3cret-pass".into()),
            role: role.map(str::to_string),
            company_id,
        }
    }

    async fn company(store: &MemoryStore) -> Uuid {
        store
            .create_company(NewCompany {
                name: format!("Acme {}", Uuid::new_v4()),
                metadata: serde_json::json!({}),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_role_defaults_to_recruiter_and_email_is_lowercased() {
        let store = MemoryStore::new();
        let company_id = company(&store).await;
        let user = create_identity(&store, request("Jo@Example.COM", None, Some(company_id)))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Recruiter);
        assert_eq!(user.email, "jo@example.com");
        assert_ne!(user.credential_hash, "s3cret-pass");
    }

    #[tokio::test]
    async fn test_non_admin_needs_existing_company() {
        let store = MemoryStore::new();
        let missing = create_identity(&store, request("a@x.io", Some("recruiter"), None)).await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let unknown =
            create_identity(&store, request("a@x.io", Some("recruiter"), Some(Uuid::new_v4())))
                .await;
        assert!(matches!(unknown, Err(AppError::Validation(_))));
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_case_insensitive() {
        let store = MemoryStore::new();
        create_identity(&store, request("dup@x.io", Some("admin"), None))
            .await
            .unwrap();
        let again = create_identity(&store, request("DUP@x.io", Some("admin"), None)).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unknown_role_is_a_validation_error() {
        let store = MemoryStore::new();
        let result = create_identity(&store, request("v@x.io", Some("viewer"), None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_last_admin_cannot_be_demoted_or_deleted() {
        let store = MemoryStore::new();
        let company_id = company(&store).await;
        let admin = create_identity(&store, request("root@x.io", Some("admin"), None))
            .await
            .unwrap();

        let demote = update_identity(
            &store,
            admin.id,
            UpdateUserRequest {
                role: Some("recruiter".into()),
                company_id: Some(Some(company_id)),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(demote, Err(AppError::Conflict(_))));
        assert!(matches!(
            delete_identity(&store, admin.id).await,
            Err(AppError::Conflict(_))
        ));

        let second = create_identity(&store, request("root2@x.io", Some("admin"), None))
            .await
            .unwrap();
        delete_identity(&store, admin.id).await.unwrap();
        assert!(matches!(
            delete_identity(&store, second.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    async fn admin(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(NewUser {
                name: "Admin".into(),
                email: email.into(),
                credential_hash: "unused".into(),
                role: Role::Admin,
                company_id: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_racing_removals_leave_one_admin() {
        for _ in 0..500 {
            let store = Arc::new(MemoryStore::new());
            let company_id = company(&store).await;
            let first = admin(&store, "a@x.io").await;
            let second = admin(&store, "b@x.io").await;
            let barrier = Arc::new(Barrier::new(2));

            let delete = tokio::spawn({
                let (store, barrier) = (store.clone(), barrier.clone());
                async move {
                    barrier.wait().await;
                    delete_identity(store.as_ref(), first.id).await
                }
            });
            let demote = tokio::spawn({
                let (store, barrier) = (store.clone(), barrier.clone());
                async move {
                    barrier.wait().await;
                    update_identity(
                        store.as_ref(),
                        second.id,
                        UpdateUserRequest {
                            role: Some("hiring_manager".into()),
                            company_id: Some(Some(company_id)),
                            ..Default::default()
                        },
                    )
                    .await
                    .map(|_| ())
                }
            });

            let outcomes = [delete.await.unwrap(), demote.await.unwrap()];
            assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
            assert!(outcomes
                .iter()
                .any(|o| matches!(o, Err(AppError::Conflict(_)))));
            assert_eq!(store.count_admins().await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_update_keeps_company_invariant_and_credential() {
        let store = MemoryStore::new();
        let company_id = company(&store).await;
        let user = create_identity(&store, request("hm@x.io", Some("hiring_manager"), Some(company_id)))
            .await
            .unwrap();

        let cleared = update_identity(
            &store,
            user.id,
            UpdateUserRequest {
                company_id: Some(None),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(cleared, Err(AppError::Validation(_))));

        let renamed = update_identity(
            &store,
            user.id,
            UpdateUserRequest {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.credential_hash, user.credential_hash);
        assert_eq!(renamed.company_id, Some(company_id));
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateUserRequest = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(absent.company_id, None);
        let cleared: UpdateUserRequest = serde_json::from_str(r#"{"companyId":null}"#).unwrap();
        assert_eq!(cleared.company_id, Some(None));
    }
}
