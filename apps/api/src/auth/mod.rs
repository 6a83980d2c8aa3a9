//! Authentication: signed access tokens, password hashing and the route guard.

pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::require_auth;
pub use token::{Claims, TokenService};
