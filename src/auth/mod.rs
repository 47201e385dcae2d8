//! Authentication: password hashing, JWT issuance and verification, and the
//! [`AuthUser`] extractor that turns a bearer token into an [`Actor`].
//!
//! [`Actor`]: crate::authz::Actor

mod extract;
mod password;
mod token;

pub use extract::AuthUser;
pub use password::{digest_token, digest_matches, hash_password, verify_password};
pub use token::{Claims, JwtKeys, TokenKind};
