//! Authenticated principals.
//!
//! An admin is tenant-unscoped and is represented by [`GlobalIdentity`]; every
//! other role is bound to exactly one company through [`ScopedIdentity`], so a
//! non-admin identity without a company cannot be constructed.

use uuid::Uuid;

use crate::models::user::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedIdentity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub company_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Global(GlobalIdentity),
    Scoped(ScopedIdentity),
}

impl Identity {
    pub fn id(&self) -> Uuid {
        match self {
            Identity::Global(g) => g.id,
            Identity::Scoped(s) => s.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Identity::Global(g) => &g.name,
            Identity::Scoped(s) => &s.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Identity::Global(g) => &g.email,
            Identity::Scoped(s) => &s.email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Identity::Global(_) => Role::Admin,
            Identity::Scoped(s) => s.role,
        }
    }

    pub fn company_id(&self) -> Option<Uuid> {
        match self {
            Identity::Global(_) => None,
            Identity::Scoped(s) => Some(s.company_id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Identity::Global(_))
    }
}

/// Whoever is on the other end of a request, as far as the session token says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No token, or a token that failed verification.
    Anonymous,
    /// A valid token for a non-admin role that carries no company claim.
    Unscoped { id: Uuid, role: Role },
    Known(Identity),
}

impl Caller {
    /// Builds a caller from verified claims. Admins become global identities
    /// regardless of any company they are attached to.
    pub fn from_claims(
        id: Uuid,
        name: String,
        email: String,
        role: Role,
        company_id: Option<Uuid>,
    ) -> Self {
        match (role, company_id) {
            (Role::Admin, _) => Caller::Known(Identity::Global(GlobalIdentity { id, name, email })),
            (role, Some(company_id)) => Caller::Known(Identity::Scoped(ScopedIdentity {
                id,
                name,
                email,
                role,
                company_id,
            })),
            (role, None) => Caller::Unscoped { id, role },
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Caller::Known(identity) => Some(identity),
            _ => None,
        }
    }
}
