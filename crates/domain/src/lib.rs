//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod grant;
mod permission;

pub use access::{
    AccessDecision, AccessPolicy, DenialReason, EffectivePermissions, evaluate_access,
};
pub use clinic_core::Role;
pub use grant::RoleGrant;
pub use permission::{
    DEFAULT_PERMISSION_CATALOG, Permission, PermissionId, PermissionKey, normalize_display_name,
};
