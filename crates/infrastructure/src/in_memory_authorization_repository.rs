use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use clinic_application::{PermissionRepository, RoleGrantRepository};
use clinic_core::{AppError, AppResult, Role};
use clinic_domain::{Permission, PermissionId, PermissionKey, RoleGrant};
use tokio::sync::RwLock;


#[derive(Debug, Default)]
struct AuthorizationState {
    last_id: i64,
    permissions: BTreeMap<PermissionId, Permission>,
    grants: BTreeSet<(Role, PermissionId)>,
}

impl AuthorizationState {
    fn find_by_key(&self, key: &PermissionKey) -> Option<&Permission> {
        self.permissions
            .values()
            .find(|permission| permission.key() == key)
    }

    fn insert(&mut self, key: PermissionKey, name: Option<String>) -> Permission {
        self.last_id += 1;
        let permission_id = PermissionId::new(self.last_id);
        let permission = Permission::new(permission_id, key, name);
        self.permissions.insert(permission_id, permission.clone());
        permission
    }

    fn grants_for_role(&self, role: Role) -> impl Iterator<Item = &Permission> {
        self.grants
            .iter()
            .filter(move |(stored_role, _)| *stored_role == role)
            .filter_map(move |(_, permission_id)| self.permissions.get(permission_id))
    }
}

/// In-memory registry and grant store.
///
/// Both tables share one lock so deleting a permission and its grants is a
/// single atomic step.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationRepository {
    state: RwLock<AuthorizationState>,
}

impl InMemoryAuthorizationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionRepository for InMemoryAuthorizationRepository {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;

        let mut permissions: Vec<Permission> = state.permissions.values().cloned().collect();
        permissions.sort_by(|left, right| left.key().cmp(right.key()));

        Ok(permissions)
    }

    async fn find_permission(
        &self,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        Ok(self
            .state
            .read()
            .await
            .permissions
            .get(&permission_id)
            .cloned())
    }

    async fn create_permission(
        &self,
        key: PermissionKey,
        name: Option<String>,
    ) -> AppResult<Permission> {
        let mut state = self.state.write().await;

        if state.find_by_key(&key).is_some() {
            return Err(AppError::Conflict(format!(
                "permission '{key}' already exists"
            )));
        }

        Ok(state.insert(key, name))
    }

    async fn ensure_permission(
        &self,
        key: PermissionKey,
        name: Option<String>,
    ) -> AppResult<Permission> {
        let mut state = self.state.write().await;

        if let Some(existing) = state.find_by_key(&key) {
            return Ok(existing.clone());
        }

        Ok(state.insert(key, name))
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<bool> {
        let mut state = self.state.write().await;

        state
            .grants
            .retain(|(_, stored_id)| *stored_id != permission_id);

        Ok(state.permissions.remove(&permission_id).is_some())
    }
}

#[async_trait]
impl RoleGrantRepository for InMemoryAuthorizationRepository {
    async fn list_grants_for_role(&self, role: Role) -> AppResult<Vec<RoleGrant>> {
        let state = self.state.read().await;

        let mut grants: Vec<RoleGrant> = state
            .grants_for_role(role)
            .map(|permission| RoleGrant::new(role, permission.clone()))
            .collect();
        grants.sort_by(|left, right| left.permission().key().cmp(right.permission().key()));

        Ok(grants)
    }

    async fn grant_permission(&self, role: Role, permission_id: PermissionId) -> AppResult<()> {
        let mut state = self.state.write().await;

        if !state.permissions.contains_key(&permission_id) {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        }

        state.grants.insert((role, permission_id));
        Ok(())
    }

    async fn revoke_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .grants
            .remove(&(role, permission_id)))
    }

    async fn list_permission_keys_for_role(&self, role: Role) -> AppResult<Vec<String>> {
        let state = self.state.read().await;

        Ok(state
            .grants_for_role(role)
            .map(|permission| permission.key().as_str().to_owned())
            .collect())
    }
}
