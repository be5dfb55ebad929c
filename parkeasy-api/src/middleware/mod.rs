pub mod auth;
pub mod rate_limit;

pub use auth::{issue_token, require_admin, require_principal, Claims};
pub use rate_limit::rate_limit_middleware;
