use clinic_domain::{Permission, RoleGrant};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for permission registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Incoming payload for granting or revoking a permission.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-grant-request.ts"
)]
pub struct PermissionGrantRequest {
    pub permission_id: i64,
}

/// API representation of a registered permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub id: i64,
    pub key: String,
    pub name: Option<String>,
}

impl From<Permission> for PermissionResponse {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.id().as_i64(),
            key: permission.key().as_str().to_owned(),
            name: permission.name().map(ToOwned::to_owned),
        }
    }
}

/// API representation of a role grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-grant-response.ts"
)]
pub struct RoleGrantResponse {
    pub role: String,
    pub permission_id: i64,
    pub permission: PermissionResponse,
}

impl From<RoleGrant> for RoleGrantResponse {
    fn from(grant: RoleGrant) -> Self {
        Self {
            role: grant.role().as_str().to_owned(),
            permission_id: grant.permission_id().as_i64(),
            permission: PermissionResponse::from(grant.permission().clone()),
        }
    }
}
