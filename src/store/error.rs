//! User-facing auth failures.
//!
//! ERROR HANDLING
//! ==============
//! Provider, backend and bridge errors are folded into `AuthError` at the store
//! boundary. Only `AuthError::message` text reaches the UI.

use super::locale::Locale;
use crate::identity::IdentityError;
use crate::net::api::ApiError;
use crate::net::bridge::BridgeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("malformed email")]
    MalformedEmail,
    #[error("weak password")]
    WeakPassword,
    #[error("password confirmation does not match")]
    PasswordMismatch,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("email already in use")]
    EmailInUse,
    #[error("account disabled")]
    AccountDisabled,
    /// Signed in with the provider but no backend profile exists.
    #[error("profile not found")]
    ProfileMissing,
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Short localized message for display.
    #[must_use]
    pub fn message(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::PtBr => match self {
                Self::InvalidCredentials => "E-mail ou senha inválidos.",
                Self::MalformedEmail => "O formato do e-mail é inválido.",
                Self::WeakPassword => "A senha é muito fraca. Use pelo menos 6 caracteres.",
                Self::PasswordMismatch => "As senhas não coincidem.",
                Self::MissingField(_) => "Preencha todos os campos obrigatórios.",
                Self::EmailInUse => "Este e-mail já está em uso.",
                Self::AccountDisabled => "Esta conta foi desativada.",
                Self::ProfileMissing => "Perfil de usuário não encontrado.",
                Self::Network(_) => "Não foi possível conectar. Verifique sua conexão e tente novamente.",
                Self::Unknown(_) => "Ocorreu um erro inesperado. Tente novamente.",
            },
            Locale::En => match self {
                Self::InvalidCredentials => "Invalid email or password.",
                Self::MalformedEmail => "The email address is malformed.",
                Self::WeakPassword => "The password is too weak. Use at least 6 characters.",
                Self::PasswordMismatch => "Passwords do not match.",
                Self::MissingField(_) => "Please fill in all required fields.",
                Self::EmailInUse => "This email is already in use.",
                Self::AccountDisabled => "This account has been disabled.",
                Self::ProfileMissing => "Profile not found.",
                Self::Network(_) => "Could not connect. Check your connection and try again.",
                Self::Unknown(_) => "An unexpected error occurred. Please try again.",
            },
        }
    }
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => Self::InvalidCredentials,
            IdentityError::InvalidEmail => Self::MalformedEmail,
            IdentityError::WeakPassword => Self::WeakPassword,
            IdentityError::EmailExists => Self::EmailInUse,
            IdentityError::UserDisabled => Self::AccountDisabled,
            IdentityError::Request(msg) => Self::Network(msg),
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound => Self::ProfileMissing,
            ApiError::Request(msg) => Self::Network(msg),
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<BridgeError> for AuthError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Request(msg) => Self::Network(msg),
            other => Self::Unknown(other.to_string()),
        }
    }
}
