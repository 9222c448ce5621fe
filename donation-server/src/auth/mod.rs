//! Admin authentication
//!
//! JWT-backed sessions for the back office. There is a single role; any
//! authenticated admin may use every admin endpoint.

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentAdmin, JwtConfig, JwtError, JwtService};
pub use middleware::require_admin;
pub use password::{hash_password, verify_password};
