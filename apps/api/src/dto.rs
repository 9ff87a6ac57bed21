mod auth;
mod common;
mod permissions;

pub use auth::{BootstrapRequest, PermissionKeysResponse, UserIdentityResponse};
pub use common::{HealthDependencyStatus, HealthResponse};
pub use permissions::{
    CreatePermissionRequest, PermissionGrantRequest, PermissionResponse, RoleGrantResponse,
};
