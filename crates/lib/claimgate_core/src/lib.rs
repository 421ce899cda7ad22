//! # claimgate_core
//!
//! Normalizes decoded identity payloads (JWT claims or upstream identity
//! assertions) into a canonical authorization subject: typed claims, a full
//! and a reduced claim projection, a role index, and the post-authentication
//! checkpoints that gate final authorization.
//!
//! ```
//! use claimgate_core::User;
//!
//! let user = User::new(r#"{"sub": "jsmith", "roles": "admin editor"}"#).unwrap();
//! assert!(user.has_role(&["admin"]));
//! assert_eq!(user.claim_value_by_field("roles"), "admin editor");
//! ```

pub mod checkpoint;
pub mod claims;
pub mod error;
pub mod roles;
pub mod shape;
pub mod user;

pub use checkpoint::Checkpoint;
pub use claims::{AccessListClaim, Claims, Normalized, UserData};
pub use error::{CheckpointError, ClaimsError, DirectiveError, UserError};
pub use roles::RoleIndex;
pub use shape::Entries;
pub use user::{Authenticator, User};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
