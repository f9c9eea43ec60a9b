//! Client-side auth state: the store, its errors, form validation and locales.

pub mod auth;
pub mod error;
pub mod locale;
pub mod registration;

pub use auth::{AuthPhase, AuthSnapshot, AuthStore};
pub use error::AuthError;
pub use locale::Locale;
pub use registration::Registration;
