//! Client-side form validation, run before any network call.

use super::error::AuthError;
use crate::net::types::ProfileType;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Accepts `local@domain` with non-empty parts, one `@`, and no whitespace.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    )
}

/// Validate a login form.
///
/// # Errors
///
/// Returns the first failing check.
pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }
    if !is_valid_email(email) {
        return Err(AuthError::MalformedEmail);
    }
    Ok(())
}

/// Registration form contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub document_id: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub profile_type: ProfileType,
}

impl Registration {
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.name.trim().is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        if self.document_id.trim().is_empty() {
            return Err(AuthError::MissingField("documentId"));
        }
        if self.email.trim().is_empty() {
            return Err(AuthError::MissingField("email"));
        }
        if !is_valid_email(&self.email) {
            return Err(AuthError::MalformedEmail);
        }
        if self.password != self.password_confirmation {
            return Err(AuthError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        Ok(())
    }
}
