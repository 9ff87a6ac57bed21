use super::*;

impl AuthorizationService {
    /// Lists grants held by a role, resolved with their permissions.
    pub async fn list_grants_for_role(&self, role: Role) -> AppResult<Vec<RoleGrant>> {
        self.grant_repository.list_grants_for_role(role).await
    }

    /// Grants a permission to a role. Granting twice is a no-op.
    pub async fn grant(&self, role: Role, permission_id: PermissionId) -> AppResult<()> {
        self.grant_repository
            .grant_permission(role, permission_id)
            .await
    }

    /// Revokes a permission from a role. Revoking an unheld permission is a no-op.
    pub async fn revoke(&self, role: Role, permission_id: PermissionId) -> AppResult<bool> {
        self.grant_repository
            .revoke_permission(role, permission_id)
            .await
    }

    /// Returns the keys stored as grants for a role.
    pub async fn effective_permission_keys(&self, role: Role) -> AppResult<EffectivePermissions> {
        let keys = self
            .grant_repository
            .list_permission_keys_for_role(role)
            .await?;

        Ok(EffectivePermissions::new(keys))
    }

    /// Returns the keys a caller can exercise, for driving client affordances.
    ///
    /// Admin holds every registered key regardless of stored grants.
    pub async fn caller_permission_keys(&self, role: Role) -> AppResult<Vec<String>> {
        if role.is_admin() {
            return Ok(self
                .permission_repository
                .list_permissions()
                .await?
                .into_iter()
                .map(|permission| permission.key().as_str().to_owned())
                .collect());
        }

        Ok(self
            .effective_permission_keys(role)
            .await?
            .keys()
            .map(ToOwned::to_owned)
            .collect())
    }
}
