//! Access policies and the pure decision function that combines the role gate
//! with the permission gate.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use clinic_core::Role;

use crate::PermissionKey;

/// Static requirements a route declares at registration time.
///
/// An empty role set means no role restriction. An empty permission set means
/// no permission restriction. A policy with both empty only requires an
/// authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    required_roles: BTreeSet<Role>,
    required_permissions: BTreeSet<PermissionKey>,
}

impl AccessPolicy {
    /// Policy that only requires an authenticated caller.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Restricts the policy to the given roles.
    #[must_use]
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles.extend(roles);
        self
    }

    /// Requires every given permission key.
    #[must_use]
    pub fn with_permissions(mut self, keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        self.required_permissions.extend(keys);
        self
    }

    /// Returns the roles allowed through the role gate.
    #[must_use]
    pub fn required_roles(&self) -> &BTreeSet<Role> {
        &self.required_roles
    }

    /// Returns the permission keys required by the permission gate.
    #[must_use]
    pub fn required_permissions(&self) -> &BTreeSet<PermissionKey> {
        &self.required_permissions
    }

    /// Returns whether deciding for this caller will consult the effective
    /// permission set.
    ///
    /// False for absent callers, callers failing the role gate, role-only
    /// policies and the admin role, so those never cause a store read.
    #[must_use]
    pub fn needs_permission_lookup(&self, caller_role: Option<Role>) -> bool {
        let Some(role) = caller_role else {
            return false;
        };

        self.role_gate_passes(role) && !self.required_permissions.is_empty() && !role.is_admin()
    }

    fn role_gate_passes(&self, role: Role) -> bool {
        self.required_roles.is_empty() || self.required_roles.contains(&role)
    }
}

/// Permission keys currently granted to one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePermissions(BTreeSet<String>);

impl EffectivePermissions {
    /// Builds the set from granted keys.
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self(keys.into_iter().collect())
    }

    /// Returns whether the key is granted.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Returns whether every required key is granted.
    #[must_use]
    pub fn contains_all<'a>(&self, keys: impl IntoIterator<Item = &'a PermissionKey>) -> bool {
        keys.into_iter().all(|key| self.contains(key.as_str()))
    }

    /// Returns the granted keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns whether no key is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No verified caller.
    Unauthenticated,
    /// Caller role is outside the required role set.
    RoleDenied,
    /// Caller role lacks at least one required permission.
    PermissionDenied,
}

impl DenialReason {
    /// Returns a stable value for diagnostics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::RoleDenied => "role_denied",
            Self::PermissionDenied => "permission_denied",
        }
    }
}

impl Display for DenialReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Terminal outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Both gates passed or were vacuous.
    Allowed,
    /// One gate failed.
    Denied(DenialReason),
}

impl AccessDecision {
    /// Returns whether the request may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decides whether a caller satisfies a policy.
///
/// Order: caller presence, role gate, vacuous permission gate, admin bypass,
/// conjunctive permission check. `effective` is only read in the last step.
#[must_use]
pub fn evaluate_access(
    caller_role: Option<Role>,
    policy: &AccessPolicy,
    effective: &EffectivePermissions,
) -> AccessDecision {
    let Some(role) = caller_role else {
        return AccessDecision::Denied(DenialReason::Unauthenticated);
    };

    if !policy.role_gate_passes(role) {
        return AccessDecision::Denied(DenialReason::RoleDenied);
    }

    if policy.required_permissions.is_empty() {
        return AccessDecision::Allowed;
    }

    // Admin holds every permission regardless of stored grants.
    if role.is_admin() {
        return AccessDecision::Allowed;
    }

    if effective.contains_all(&policy.required_permissions) {
        AccessDecision::Allowed
    } else {
        AccessDecision::Denied(DenialReason::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use clinic_core::Role;
    use proptest::prelude::*;

    use super::{AccessDecision, AccessPolicy, DenialReason, EffectivePermissions, evaluate_access};
    use crate::PermissionKey;

    fn keys(values: &[&str]) -> Vec<PermissionKey> {
        values
            .iter()
            .filter_map(|value| PermissionKey::new(*value).ok())
            .collect()
    }

    fn effective(values: &[&str]) -> EffectivePermissions {
        EffectivePermissions::new(values.iter().map(|value| (*value).to_owned()))
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop_oneof![Just(Role::Admin), Just(Role::Doctor), Just(Role::Assistant)]
    }

    fn key_set_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z]{1,8}\\.[a-z]{1,8}", 0..6)
    }

    #[test]
    fn absent_caller_is_unauthenticated() {
        let decision = evaluate_access(None, &AccessPolicy::authenticated(), &effective(&[]));
        assert_eq!(
            decision,
            AccessDecision::Denied(DenialReason::Unauthenticated)
        );
    }

    #[test]
    fn empty_policy_allows_any_authenticated_role() {
        for role in Role::all() {
            let decision =
                evaluate_access(Some(*role), &AccessPolicy::authenticated(), &effective(&[]));
            assert!(decision.is_allowed());
        }
    }

    #[test]
    fn conjunctive_permission_check() {
        let policy =
            AccessPolicy::authenticated().with_permissions(keys(&["citas.view", "citas.edit"]));

        let partial = evaluate_access(Some(Role::Doctor), &policy, &effective(&["citas.view"]));
        assert_eq!(
            partial,
            AccessDecision::Denied(DenialReason::PermissionDenied)
        );

        let full = evaluate_access(
            Some(Role::Doctor),
            &policy,
            &effective(&["citas.view", "citas.edit"]),
        );
        assert_eq!(full, AccessDecision::Allowed);
    }

    #[test]
    fn admin_must_still_pass_role_gate() {
        let policy = AccessPolicy::authenticated()
            .with_roles([Role::Doctor])
            .with_permissions(keys(&["consulta.create"]));

        let decision = evaluate_access(Some(Role::Admin), &policy, &effective(&[]));
        assert_eq!(decision, AccessDecision::Denied(DenialReason::RoleDenied));
    }

    #[test]
    fn lookup_is_skipped_when_decision_does_not_need_it() {
        let role_only = AccessPolicy::authenticated().with_roles([Role::Admin, Role::Assistant]);
        assert!(!role_only.needs_permission_lookup(Some(Role::Assistant)));

        let gated = AccessPolicy::authenticated()
            .with_roles([Role::Admin, Role::Assistant])
            .with_permissions(keys(&["preclinic.upsert"]));
        assert!(!gated.needs_permission_lookup(None));
        assert!(!gated.needs_permission_lookup(Some(Role::Admin)));
        assert!(!gated.needs_permission_lookup(Some(Role::Doctor)));
        assert!(gated.needs_permission_lookup(Some(Role::Assistant)));
    }

    proptest! {
        #[test]
        fn admin_bypasses_any_permission_requirement(required in key_set_strategy()) {
            prop_assume!(!required.is_empty());
            let policy = AccessPolicy::authenticated().with_permissions(
                required.iter().filter_map(|value| PermissionKey::new(value.as_str()).ok()),
            );

            let decision = evaluate_access(Some(Role::Admin), &policy, &EffectivePermissions::default());
            prop_assert_eq!(decision, AccessDecision::Allowed);
        }

        #[test]
        fn role_gate_takes_precedence(granted in key_set_strategy(), required in key_set_strategy()) {
            let policy = AccessPolicy::authenticated()
                .with_roles([Role::Doctor])
                .with_permissions(required.iter().filter_map(|value| PermissionKey::new(value.as_str()).ok()));

            let decision = evaluate_access(
                Some(Role::Assistant),
                &policy,
                &EffectivePermissions::new(granted),
            );
            prop_assert_eq!(decision, AccessDecision::Denied(DenialReason::RoleDenied));
        }

        #[test]
        fn allowed_iff_required_is_subset(
            role in role_strategy(),
            granted in key_set_strategy(),
            required in key_set_strategy(),
        ) {
            let required_keys: Vec<PermissionKey> = required
                .iter()
                .filter_map(|value| PermissionKey::new(value.as_str()).ok())
                .collect();
            let effective = EffectivePermissions::new(granted);
            let policy = AccessPolicy::authenticated().with_permissions(required_keys.clone());

            let expected = role.is_admin() || effective.contains_all(&required_keys);
            let decision = evaluate_access(Some(role), &policy, &effective);
            prop_assert_eq!(decision.is_allowed(), expected);
        }
    }
}
