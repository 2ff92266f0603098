pub mod credentials;
pub mod handlers;
pub mod session;
pub mod token;

pub use token::SessionKeys;

use anyhow::Result;
use tracing::{info, warn};

use crate::auth::credentials::hash_credential;
use crate::config::BootstrapAdmin;
use crate::models::user::{normalize_email, NewUser, Role};
use crate::store::{Store, UserStore};

/// Creates the first administrator when none exists. Returns whether an
/// identity was created.
pub async fn bootstrap_admin(store: &dyn Store, admin: &BootstrapAdmin) -> Result<bool> {
    if store.count_admins().await? > 0 {
        return Ok(false);
    }

    let email = normalize_email(&admin.email);
    if store.find_user_by_email(&email).await?.is_some() {
        warn!("Bootstrap admin email already belongs to a non-admin identity; skipping");
        return Ok(false);
    }

    let user = store
        .create_user(NewUser {
            name: admin.name.clone(),
            email,
            credential_hash: hash_credential(&admin.password)?,
            role: Role::Admin,
            company_id: None,
        })
        .await?;
    info!(user_id = %user.id, "Bootstrap admin created");
    Ok(true)
}
