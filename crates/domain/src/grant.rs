use clinic_core::Role;
use serde::{Deserialize, Serialize};

use crate::{Permission, PermissionId};

/// Assertion that a role holds a permission, resolved with the permission it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    role: Role,
    permission: Permission,
}

impl RoleGrant {
    /// Creates a grant projection.
    #[must_use]
    pub fn new(role: Role, permission: Permission) -> Self {
        Self { role, permission }
    }

    /// Returns the role holding the grant.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the referenced permission id.
    #[must_use]
    pub fn permission_id(&self) -> PermissionId {
        self.permission.id()
    }

    /// Returns the referenced permission.
    #[must_use]
    pub fn permission(&self) -> &Permission {
        &self.permission
    }
}
