use std::sync::Arc;

use clinic_core::{AppError, AppResult, Role};
use clinic_domain::{
    AccessDecision, AccessPolicy, DenialReason, EffectivePermissions, Permission, PermissionId,
    PermissionKey, RoleGrant,
};

use crate::{CreatePermissionInput, PermissionRepository, RoleGrantRepository};

mod access;
mod grants;
mod registry;

#[cfg(test)]
mod tests;

pub use access::{RequestPermissionMemo, decision_into_result};

/// Application service for the permission registry, role grants and access decisions.
#[derive(Clone)]
pub struct AuthorizationService {
    permission_repository: Arc<dyn PermissionRepository>,
    grant_repository: Arc<dyn RoleGrantRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from repository implementations.
    #[must_use]
    pub fn new(
        permission_repository: Arc<dyn PermissionRepository>,
        grant_repository: Arc<dyn RoleGrantRepository>,
    ) -> Self {
        Self {
            permission_repository,
            grant_repository,
        }
    }
}
