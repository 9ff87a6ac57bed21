use clinic_domain::evaluate_access;

use super::*;

/// Effective permissions resolved while serving one request.
///
/// Lives in the request extensions so overlapping gates on the same request
/// share one store read. Never shared across requests.
#[derive(Debug, Clone, Default)]
pub struct RequestPermissionMemo {
    resolved: Option<(Role, EffectivePermissions)>,
}

impl RequestPermissionMemo {
    /// Returns the memoized set for `role`, if one was loaded.
    #[must_use]
    pub fn get(&self, role: Role) -> Option<&EffectivePermissions> {
        self.resolved
            .as_ref()
            .filter(|(resolved_role, _)| *resolved_role == role)
            .map(|(_, permissions)| permissions)
    }

    fn store(&mut self, role: Role, permissions: EffectivePermissions) {
        self.resolved = Some((role, permissions));
    }
}

impl AuthorizationService {
    /// Decides whether a caller satisfies a route policy.
    ///
    /// The grant store is read only when the decision depends on it, and at
    /// most once per memo.
    pub async fn authorize(
        &self,
        caller_role: Option<Role>,
        policy: &AccessPolicy,
        memo: &mut RequestPermissionMemo,
    ) -> AppResult<AccessDecision> {
        let Some(role) = caller_role.filter(|role| policy.needs_permission_lookup(Some(*role)))
        else {
            return Ok(evaluate_access(
                caller_role,
                policy,
                &EffectivePermissions::default(),
            ));
        };

        if let Some(effective) = memo.get(role) {
            return Ok(evaluate_access(Some(role), policy, effective));
        }

        let effective = self.effective_permission_keys(role).await?;
        let decision = evaluate_access(Some(role), policy, &effective);
        memo.store(role, effective);

        Ok(decision)
    }
}

/// Maps a decision onto the error taxonomy.
///
/// Role and permission denials share one message so callers cannot tell
/// which gate refused them.
pub fn decision_into_result(decision: AccessDecision) -> AppResult<()> {
    match decision {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Denied(DenialReason::Unauthenticated) => Err(AppError::Unauthorized(
            "authentication required".to_owned(),
        )),
        AccessDecision::Denied(DenialReason::RoleDenied | DenialReason::PermissionDenied) => Err(
            AppError::Forbidden("insufficient privileges for this operation".to_owned()),
        ),
    }
}
