//! Verifies the bearer tokens issued by the identity provider.

mod middleware;
mod token;

pub use middleware::{AuthState, auth_guard};
pub use token::{AuthConfig, Claims};
