use uuid::Uuid;

use crate::{
    progress::{ProgressError, ProgressResult},
    web::{AuthenticatedUser, UserRole},
};

/// What a request wants to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTarget {
    /// Data belonging to the given user (their enrollments, progress, exams).
    Owner(Uuid),
    /// Course authoring, assignment and platform statistics.
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

pub fn authorize(actor: &AuthenticatedUser, target: AccessTarget) -> Access {
    // admin can get all resources
    if actor.user_role() == UserRole::Admin {
        return Access::Allow;
    }

    match target {
        AccessTarget::Owner(owner) if owner == actor.user_id() => Access::Allow,
        _ => Access::Deny,
    }
}

pub fn check_access(actor: &AuthenticatedUser, target: AccessTarget) -> ProgressResult<()> {
    match authorize(actor, target) {
        Access::Allow => Ok(()),
        Access::Deny => Err(ProgressError::Forbidden),
    }
}
