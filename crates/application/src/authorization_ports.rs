use async_trait::async_trait;

use clinic_core::{AppResult, Role};
use clinic_domain::{Permission, PermissionId, PermissionKey, RoleGrant};

/// Input payload for registering a permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePermissionInput {
    /// Raw key as submitted; trimmed and validated by the service.
    pub key: String,
    /// Optional display label.
    pub name: Option<String>,
}

/// Repository port for the permission catalog.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Lists all permissions ordered by key.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Finds a permission by id.
    async fn find_permission(&self, permission_id: PermissionId)
    -> AppResult<Option<Permission>>;

    /// Creates a permission, failing with a conflict when the key exists.
    async fn create_permission(
        &self,
        key: PermissionKey,
        name: Option<String>,
    ) -> AppResult<Permission>;

    /// Returns the permission for a key, creating it when absent.
    async fn ensure_permission(
        &self,
        key: PermissionKey,
        name: Option<String>,
    ) -> AppResult<Permission>;

    /// Deletes a permission and every grant referencing it as one atomic unit.
    ///
    /// Returns whether a permission row was removed.
    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<bool>;
}

/// Repository port for role grants.
#[async_trait]
pub trait RoleGrantRepository: Send + Sync {
    /// Lists grants held by a role ordered by permission key.
    async fn list_grants_for_role(&self, role: Role) -> AppResult<Vec<RoleGrant>>;

    /// Ensures the role holds the permission.
    ///
    /// Fails with not found when the permission does not exist. Granting a held
    /// permission succeeds without changes.
    async fn grant_permission(&self, role: Role, permission_id: PermissionId) -> AppResult<()>;

    /// Removes the grant when present. Returns whether a grant was removed.
    async fn revoke_permission(&self, role: Role, permission_id: PermissionId)
    -> AppResult<bool>;

    /// Lists the permission keys granted to a role.
    async fn list_permission_keys_for_role(&self, role: Role) -> AppResult<Vec<String>>;
}
