use clinic_domain::{DEFAULT_PERMISSION_CATALOG, normalize_display_name};

use super::*;

impl AuthorizationService {
    /// Lists registered permissions ordered by key.
    pub async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.permission_repository.list_permissions().await
    }

    /// Registers a new permission key.
    pub async fn create_permission(&self, input: CreatePermissionInput) -> AppResult<Permission> {
        let key = PermissionKey::new(input.key)?;

        self.permission_repository
            .create_permission(key, normalize_display_name(input.name))
            .await
    }

    /// Returns the permission registered under `key`, creating it when absent.
    pub async fn ensure_permission(
        &self,
        key: &str,
        name: Option<String>,
    ) -> AppResult<Permission> {
        let key = PermissionKey::new(key)?;

        self.permission_repository
            .ensure_permission(key, normalize_display_name(name))
            .await
    }

    /// Ensures every key of the default clinic catalog is registered.
    pub async fn ensure_default_catalog(&self) -> AppResult<Vec<Permission>> {
        let mut permissions = Vec::with_capacity(DEFAULT_PERMISSION_CATALOG.len());
        for (key, name) in DEFAULT_PERMISSION_CATALOG {
            permissions.push(self.ensure_permission(key, Some((*name).to_owned())).await?);
        }

        Ok(permissions)
    }

    /// Deletes a permission together with its grants.
    ///
    /// Deleting an unknown id succeeds and returns `None`; otherwise the
    /// removed permission is returned.
    pub async fn delete_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        let existing = self
            .permission_repository
            .find_permission(permission_id)
            .await?;

        let removed = self
            .permission_repository
            .delete_permission(permission_id)
            .await?;

        Ok(existing.filter(|_| removed))
    }
}
