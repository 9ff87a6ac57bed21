use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use clinic_core::{AppError, AppResult, Role};
use clinic_domain::{
    AccessDecision, AccessPolicy, DenialReason, Permission, PermissionId, PermissionKey, RoleGrant,
};
use tokio::sync::Mutex;

use crate::{CreatePermissionInput, PermissionRepository, RoleGrantRepository};

use super::{AuthorizationService, RequestPermissionMemo, decision_into_result};

#[derive(Default)]
struct FakeState {
    next_id: i64,
    permissions: BTreeMap<i64, Permission>,
    grants: BTreeSet<(Role, i64)>,
}

#[derive(Default)]
struct FakeAuthorizationStore {
    state: Mutex<FakeState>,
    key_lookups: AtomicUsize,
}

#[async_trait]
impl PermissionRepository for FakeAuthorizationStore {
    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        let state = self.state.lock().await;
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
            .lock()
            .await
            .permissions
            .get(&permission_id.as_i64())
            .cloned())
    }

    async fn create_permission(
        &self,
        key: PermissionKey,
        name: Option<String>,
    ) -> AppResult<Permission> {
        let mut state = self.state.lock().await;
        if state
            .permissions
            .values()
            .any(|permission| permission.key() == &key)
        {
            return Err(AppError::Conflict(format!(
                "permission '{key}' already exists"
            )));
        }

        state.next_id += 1;
        let next_id = state.next_id;
        let permission = Permission::new(PermissionId::new(next_id), key, name);
        state.permissions.insert(next_id, permission.clone());
        Ok(permission)
    }

    async fn ensure_permission(
        &self,
        key: PermissionKey,
        name: Option<String>,
    ) -> AppResult<Permission> {
        let existing = self
            .state
            .lock()
            .await
            .permissions
            .values()
            .find(|permission| permission.key() == &key)
            .cloned();

        match existing {
            Some(permission) => Ok(permission),
            None => self.create_permission(key, name).await,
        }
    }

    async fn delete_permission(&self, permission_id: PermissionId) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state
            .grants
            .retain(|(_, stored_id)| *stored_id != permission_id.as_i64());
        Ok(state.permissions.remove(&permission_id.as_i64()).is_some())
    }
}

#[async_trait]
impl RoleGrantRepository for FakeAuthorizationStore {
    async fn list_grants_for_role(&self, role: Role) -> AppResult<Vec<RoleGrant>> {
        let state = self.state.lock().await;
        let mut grants: Vec<RoleGrant> = state
            .grants
            .iter()
            .filter(|(stored_role, _)| *stored_role == role)
            .filter_map(|(_, permission_id)| state.permissions.get(permission_id))
            .map(|permission| RoleGrant::new(role, permission.clone()))
            .collect();
        grants.sort_by(|left, right| left.permission().key().cmp(right.permission().key()));
        Ok(grants)
    }

    async fn grant_permission(&self, role: Role, permission_id: PermissionId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.permissions.contains_key(&permission_id.as_i64()) {
            return Err(AppError::NotFound(format!(
                "permission '{permission_id}' was not found"
            )));
        }

        state.grants.insert((role, permission_id.as_i64()));
        Ok(())
    }

    async fn revoke_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .grants
            .remove(&(role, permission_id.as_i64())))
    }

    async fn list_permission_keys_for_role(&self, role: Role) -> AppResult<Vec<String>> {
        self.key_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .list_grants_for_role(role)
            .await?
            .into_iter()
            .map(|grant| grant.permission().key().as_str().to_owned())
            .collect())
    }
}

fn service() -> (AuthorizationService, Arc<FakeAuthorizationStore>) {
    let store = Arc::new(FakeAuthorizationStore::default());
    let service = AuthorizationService::new(store.clone(), store.clone());
    (service, store)
}

async fn create(service: &AuthorizationService, key: &str) -> Permission {
    match service
        .create_permission(CreatePermissionInput {
            key: key.to_owned(),
            name: None,
        })
        .await
    {
        Ok(permission) => permission,
        Err(error) => panic!("failed to create permission '{key}': {error}"),
    }
}

fn policy(roles: &[Role], permissions: &[&str]) -> AccessPolicy {
    AccessPolicy::authenticated()
        .with_roles(roles.iter().copied())
        .with_permissions(
            permissions
                .iter()
                .filter_map(|value| PermissionKey::new(*value).ok()),
        )
}

#[tokio::test]
async fn create_permission_rejects_blank_key() {
    let (service, _) = service();

    let result = service
        .create_permission(CreatePermissionInput {
            key: "   ".to_owned(),
            name: Some("Blank".to_owned()),
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn create_permission_rejects_duplicate_key() {
    let (service, _) = service();
    create(&service, "citas.view").await;

    let result = service
        .create_permission(CreatePermissionInput {
            key: " citas.view ".to_owned(),
            name: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn list_permissions_is_ordered_by_key() {
    let (service, _) = service();
    create(&service, "preclinic.view").await;
    create(&service, "citas.view").await;
    create(&service, "consulta.create").await;

    let keys: Vec<String> = service
        .list_permissions()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|permission| permission.key().as_str().to_owned())
        .collect();

    assert_eq!(keys, vec!["citas.view", "consulta.create", "preclinic.view"]);
}

#[tokio::test]
async fn ensure_permission_returns_existing_permission() {
    let (service, _) = service();
    let created = create(&service, "preclinic.upsert").await;

    let ensured = service
        .ensure_permission("preclinic.upsert", Some("Other label".to_owned()))
        .await;

    assert!(matches!(ensured, Ok(ref permission) if permission.id() == created.id()));
    assert_eq!(service.list_permissions().await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn ensure_default_catalog_is_idempotent() {
    let (service, _) = service();

    assert!(service.ensure_default_catalog().await.is_ok());
    assert!(service.ensure_default_catalog().await.is_ok());

    assert_eq!(service.list_permissions().await.unwrap_or_default().len(), 4);
}

#[tokio::test]
async fn grant_twice_leaves_single_grant() {
    let (service, _) = service();
    let permission = create(&service, "preclinic.upsert").await;

    assert!(service.grant(Role::Assistant, permission.id()).await.is_ok());
    assert!(service.grant(Role::Assistant, permission.id()).await.is_ok());

    let grants = service
        .list_grants_for_role(Role::Assistant)
        .await
        .unwrap_or_default();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].permission_id(), permission.id());
}

#[tokio::test]
async fn grant_unknown_permission_is_not_found() {
    let (service, _) = service();

    let result = service.grant(Role::Doctor, PermissionId::new(42)).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn revoke_unheld_permission_succeeds_without_changes() {
    let (service, _) = service();
    let held = create(&service, "consulta.view").await;
    let unheld = create(&service, "consulta.create").await;
    assert!(service.grant(Role::Doctor, held.id()).await.is_ok());

    let revoked = service.revoke(Role::Doctor, unheld.id()).await;

    assert!(matches!(revoked, Ok(false)));
    assert_eq!(
        service
            .list_grants_for_role(Role::Doctor)
            .await
            .unwrap_or_default()
            .len(),
        1
    );
}

#[tokio::test]
async fn grant_then_revoke_scenario() {
    let (service, _) = service();
    let permission = create(&service, "preclinic.upsert").await;

    assert!(service.grant(Role::Assistant, permission.id()).await.is_ok());
    let grants = service
        .list_grants_for_role(Role::Assistant)
        .await
        .unwrap_or_default();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].role(), Role::Assistant);
    assert_eq!(grants[0].permission().key().as_str(), "preclinic.upsert");

    assert!(matches!(
        service.revoke(Role::Assistant, permission.id()).await,
        Ok(true)
    ));
    assert!(
        service
            .list_grants_for_role(Role::Assistant)
            .await
            .unwrap_or_default()
            .is_empty()
    );
}

#[tokio::test]
async fn delete_permission_cascades_to_grants() {
    let (service, store) = service();
    let permission = create(&service, "consulta.view").await;
    assert!(service.grant(Role::Doctor, permission.id()).await.is_ok());
    assert!(service.grant(Role::Assistant, permission.id()).await.is_ok());

    assert!(matches!(
        service.delete_permission(permission.id()).await,
        Ok(Some(ref removed)) if removed.key().as_str() == "consulta.view"
    ));

    for role in Role::all() {
        assert!(
            service
                .list_grants_for_role(*role)
                .await
                .unwrap_or_default()
                .is_empty()
        );
    }
    let state = store.state.lock().await;
    assert!(
        !state
            .grants
            .iter()
            .any(|(_, stored_id)| *stored_id == permission.id().as_i64())
    );
}

#[tokio::test]
async fn delete_unknown_permission_succeeds() {
    let (service, _) = service();
    create(&service, "citas.view").await;

    let result = service.delete_permission(PermissionId::new(999)).await;

    assert!(matches!(result, Ok(None)));
    assert_eq!(service.list_permissions().await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn caller_permission_keys_for_admin_lists_registry() {
    let (service, _) = service();
    create(&service, "citas.view").await;
    create(&service, "pagos.create").await;

    let admin_keys = service
        .caller_permission_keys(Role::Admin)
        .await
        .unwrap_or_default();
    let doctor_keys = service
        .caller_permission_keys(Role::Doctor)
        .await
        .unwrap_or_default();

    assert_eq!(admin_keys, vec!["citas.view", "pagos.create"]);
    assert!(doctor_keys.is_empty());
}

#[tokio::test]
async fn authorize_skips_store_for_role_only_policy() {
    let (service, store) = service();
    let mut memo = RequestPermissionMemo::default();

    let decision = service
        .authorize(
            Some(Role::Assistant),
            &policy(&[Role::Admin, Role::Assistant], &[]),
            &mut memo,
        )
        .await;

    assert!(matches!(decision, Ok(AccessDecision::Allowed)));
    assert_eq!(store.key_lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn authorize_admin_bypass_skips_store() {
    let (service, store) = service();
    let mut memo = RequestPermissionMemo::default();

    let decision = service
        .authorize(
            Some(Role::Admin),
            &policy(&[], &["consulta.create", "consulta.view"]),
            &mut memo,
        )
        .await;

    assert!(matches!(decision, Ok(AccessDecision::Allowed)));
    assert_eq!(store.key_lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn authorize_reuses_memo_within_one_request() {
    let (service, store) = service();
    let permission = create(&service, "preclinic.upsert").await;
    assert!(service.grant(Role::Assistant, permission.id()).await.is_ok());
    let mut memo = RequestPermissionMemo::default();

    let router_level = service
        .authorize(
            Some(Role::Assistant),
            &policy(&[], &["preclinic.upsert"]),
            &mut memo,
        )
        .await;
    let route_level = service
        .authorize(
            Some(Role::Assistant),
            &policy(&[Role::Admin, Role::Assistant], &["preclinic.upsert"]),
            &mut memo,
        )
        .await;

    assert!(matches!(router_level, Ok(AccessDecision::Allowed)));
    assert!(matches!(route_level, Ok(AccessDecision::Allowed)));
    assert_eq!(store.key_lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn authorize_reflects_revocation_on_next_request() {
    let (service, _) = service();
    let permission = create(&service, "consulta.view").await;
    assert!(service.grant(Role::Doctor, permission.id()).await.is_ok());
    let required = policy(&[Role::Admin, Role::Doctor], &["consulta.view"]);

    let before = service
        .authorize(
            Some(Role::Doctor),
            &required,
            &mut RequestPermissionMemo::default(),
        )
        .await;
    assert!(service.revoke(Role::Doctor, permission.id()).await.is_ok());
    let after = service
        .authorize(
            Some(Role::Doctor),
            &required,
            &mut RequestPermissionMemo::default(),
        )
        .await;

    assert!(matches!(before, Ok(AccessDecision::Allowed)));
    assert!(matches!(
        after,
        Ok(AccessDecision::Denied(DenialReason::PermissionDenied))
    ));
}

#[tokio::test]
async fn denials_share_forbidden_message() {
    let (service, _) = service();
    let mut memo = RequestPermissionMemo::default();

    let unauthenticated = service
        .authorize(None, &AccessPolicy::authenticated(), &mut memo)
        .await;
    let role_denied = service
        .authorize(Some(Role::Doctor), &policy(&[Role::Admin], &[]), &mut memo)
        .await;
    let permission_denied = service
        .authorize(Some(Role::Doctor), &policy(&[], &["pagos.create"]), &mut memo)
        .await;

    assert!(matches!(
        unauthenticated.map(decision_into_result),
        Ok(Err(AppError::Unauthorized(_)))
    ));
    let (
        Ok(Err(AppError::Forbidden(role_message))),
        Ok(Err(AppError::Forbidden(permission_message))),
    ) = (
        role_denied.map(decision_into_result),
        permission_denied.map(decision_into_result),
    )
    else {
        panic!("expected both denials to be forbidden");
    };
    assert_eq!(role_message, permission_message);
    assert!(decision_into_result(AccessDecision::Allowed).is_ok());
}
