mod bootstrap;
mod session;

pub use bootstrap::bootstrap_handler;
pub use session::{logout_handler, me_handler, my_permissions_handler};

pub const SESSION_USER_KEY: &str = "user_identity";
/// Unix timestamp of the moment the identity was stored.
pub const SESSION_CREATED_AT_KEY: &str = "session_created_at";
/// Sessions older than this are dropped regardless of activity.
pub const SESSION_ABSOLUTE_LIFETIME_SECONDS: i64 = 12 * 60 * 60;
