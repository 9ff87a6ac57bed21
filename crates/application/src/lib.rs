//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_ports;
mod authorization_service;

pub use authorization_ports::{CreatePermissionInput, PermissionRepository, RoleGrantRepository};
pub use authorization_service::{AuthorizationService, RequestPermissionMemo, decision_into_result};
