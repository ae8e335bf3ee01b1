pub mod auth;
pub mod rate_limit;

pub use auth::{require_admin, require_auth, require_self_or_admin, TOKEN_HEADER};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
