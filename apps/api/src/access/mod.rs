pub mod identity;
pub mod policy;

pub use identity::{Caller, GlobalIdentity, Identity, ScopedIdentity};
pub use policy::{
    authorize, authorize_identity, scope_filter, visible_fields, Action, CompanyFilter, Decision,
    Denial, FieldVisibility,
};

use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{candidate::Candidate, job::Job, resume::Resume};

/// A company-owned resource.
pub trait Owned {
    const KIND: &'static str;

    fn id(&self) -> Uuid;
    fn company_id(&self) -> Uuid;
}

impl Owned for Job {
    const KIND: &'static str = "Job";

    fn id(&self) -> Uuid {
        self.id
    }

    fn company_id(&self) -> Uuid {
        self.company_id
    }
}

impl Owned for Resume {
    const KIND: &'static str = "CV";

    fn id(&self) -> Uuid {
        self.id
    }

    fn company_id(&self) -> Uuid {
        self.company_id
    }
}

impl Owned for Candidate {
    const KIND: &'static str = "Candidate";

    fn id(&self) -> Uuid {
        self.id
    }

    fn company_id(&self) -> Uuid {
        self.company_id
    }
}

/// Gate for actions that do not target a single resource. Returns the
/// identity the rest of the handler works with.
pub fn require(caller: &Caller, action: Action) -> Result<&Identity, AppError> {
    authorize(caller, action, None).into_result()?;
    caller.identity().ok_or(AppError::Unauthenticated)
}

/// Tenant check for a resource loaded by id. A missing resource and one owned
/// by another company produce the same `NotFound`.
pub fn reveal<T: Owned>(
    identity: &Identity,
    action: Action,
    found: Option<T>,
) -> Result<T, AppError> {
    let not_found = || AppError::NotFound(format!("{} not found", T::KIND));
    let resource = found.ok_or_else(not_found)?;
    match authorize_identity(identity, action, Some(resource.company_id())) {
        Decision::Allow => Ok(resource),
        Decision::Deny(Denial::CrossTenantAccess) => {
            warn!(
                user_id = %identity.id(),
                resource = T::KIND,
                resource_id = %resource.id(),
                "cross-tenant lookup hidden as not found"
            );
            Err(not_found())
        }
        Decision::Deny(denial) => Err(denial.into()),
    }
}
