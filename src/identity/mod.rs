//! Identity provider adapter.
//!
//! DESIGN
//! ======
//! Callers depend on the seam traits in `types` (`IdentityProvider` for the
//! client flows, `TokenVerifier` for the bridge, `TokenSource` for backend
//! requests). `FirebaseIdentity` implements all three over the provider's REST
//! surface; tests substitute in-memory fakes.

pub mod firebase;
pub mod types;

pub use firebase::FirebaseIdentity;
pub use types::{Identity, IdentityError, IdentityProvider, StaticToken, TokenSource, TokenVerifier, VerifiedToken};
