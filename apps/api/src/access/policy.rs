//! Authorization engine. Decides whether a caller may act on a company-owned
//! resource and which companies a listing may cover. Also decides which
//! candidate fields a response may reveal.
//!
//! Pure decision functions: nothing here touches storage or fails.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::access::identity::{Caller, Identity};
use crate::models::user::Role;

// ────────────────────────────────────────────────────────────────────────────
// Actions and their role table
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageCompanies,
    ManageUsers,
    ReadProfile,
    CreateJob,
    ReadJob,
    UpdateJob,
    DeleteJob,
    UploadResume,
    ReadResume,
    DeleteResume,
    ReadCandidate,
    UpdateCandidateStatus,
    EvaluateCandidate,
    DeleteCandidate,
}

const ANY_ROLE: &[Role] = &[Role::Admin, Role::Recruiter, Role::HiringManager];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

impl Action {
    pub const ALL: [Action; 14] = [
        Action::ManageCompanies,
        Action::ManageUsers,
        Action::ReadProfile,
        Action::CreateJob,
        Action::ReadJob,
        Action::UpdateJob,
        Action::DeleteJob,
        Action::UploadResume,
        Action::ReadResume,
        Action::DeleteResume,
        Action::ReadCandidate,
        Action::UpdateCandidateStatus,
        Action::EvaluateCandidate,
        Action::DeleteCandidate,
    ];

    /// Roles permitted to attempt this action at all. Adding a role means
    /// touching this table and nothing else.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Action::ManageCompanies | Action::ManageUsers => ADMIN_ONLY,
            Action::DeleteJob | Action::DeleteResume | Action::DeleteCandidate => ADMIN_ONLY,
            Action::CreateJob | Action::UpdateJob => &[Role::Admin, Role::HiringManager],
            Action::UploadResume => &[Role::Admin, Role::Recruiter],
            Action::ReadProfile
            | Action::ReadJob
            | Action::ReadResume
            | Action::ReadCandidate
            | Action::UpdateCandidateStatus
            | Action::EvaluateCandidate => ANY_ROLE,
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Decisions
// ────────────────────────────────────────────────────────────────────────────

/// Why a request was refused. Only `Unauthenticated` is distinguishable by the
/// client; the rest all surface as the same "access denied".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("no authenticated session")]
    Unauthenticated,
    #[error("role is not permitted for this action")]
    InsufficientRole,
    #[error("identity has no company scope")]
    MissingCompanyScope,
    #[error("resource belongs to another company")]
    CrossTenantAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }

    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decides whether `caller` may perform `action`.
///
/// `owner` is the company that owns the target (or would own it, for
/// creation). `None` means the action targets no single company-owned
/// resource, e.g. listing or admin-only management.
///
/// Rules, first match wins:
/// 1. no session → `Unauthenticated`
/// 2. role not in the action's table → `InsufficientRole`
/// 3. admin → allow
/// 4. no company claim → `MissingCompanyScope`
/// 5. owner differs from the caller's company → `CrossTenantAccess`
/// 6. allow
pub fn authorize(caller: &Caller, action: Action, owner: Option<Uuid>) -> Decision {
    match caller {
        Caller::Anonymous => Decision::Deny(Denial::Unauthenticated),
        Caller::Unscoped { role, .. } => {
            debug_assert_ne!(*role, Role::Admin, "admins are always global identities");
            if action.permits(*role) {
                Decision::Deny(Denial::MissingCompanyScope)
            } else {
                Decision::Deny(Denial::InsufficientRole)
            }
        }
        Caller::Known(identity) => authorize_identity(identity, action, owner),
    }
}

/// Rules 2–6 of [`authorize`] for an already-authenticated identity.
pub fn authorize_identity(identity: &Identity, action: Action, owner: Option<Uuid>) -> Decision {
    if !action.permits(identity.role()) {
        return Decision::Deny(Denial::InsufficientRole);
    }
    match identity {
        Identity::Global(_) => Decision::Allow,
        Identity::Scoped(scoped) => match owner {
            Some(owner) if owner != scoped.company_id => Decision::Deny(Denial::CrossTenantAccess),
            _ => Decision::Allow,
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// List scoping
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyFilter {
    Any,
    Only(Uuid),
}

impl CompanyFilter {
    pub fn matches(self, company_id: Uuid) -> bool {
        match self {
            CompanyFilter::Any => true,
            CompanyFilter::Only(id) => id == company_id,
        }
    }

    pub fn company_id(self) -> Option<Uuid> {
        match self {
            CompanyFilter::Any => None,
            CompanyFilter::Only(id) => Some(id),
        }
    }
}

/// Company predicate for a listing. Admins are unscoped unless they ask for a
/// company; everyone else is pinned to their own company and any requested
/// company is ignored.
pub fn scope_filter(identity: &Identity, requested: Option<Uuid>) -> CompanyFilter {
    match identity {
        Identity::Global(_) => requested.map_or(CompanyFilter::Any, CompanyFilter::Only),
        Identity::Scoped(scoped) => CompanyFilter::Only(scoped.company_id),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field visibility
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldVisibility {
    pub include_score: bool,
}

impl FieldVisibility {
    /// Masks a value the caller may not see. The key stays in the payload.
    pub fn score<T>(self, value: Option<T>) -> Option<T> {
        if self.include_score {
            value
        } else {
            None
        }
    }
}

pub fn visible_fields(identity: &Identity) -> FieldVisibility {
    FieldVisibility {
        include_score: identity.role().can_view_score(),
    }
}
