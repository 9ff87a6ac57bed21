//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_authorization_repository;
mod postgres_permission_repository;
mod postgres_role_grant_repository;

pub use in_memory_authorization_repository::InMemoryAuthorizationRepository;
pub use postgres_permission_repository::PostgresPermissionRepository;
pub use postgres_role_grant_repository::PostgresRoleGrantRepository;
