//! Process-wide auth state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `AuthStore` is owned at the application root. It is the only writer of
//! the published `AuthSnapshot`; route guards and pages read snapshots or
//! subscribe to them.
//!
//! DESIGN
//! ======
//! A listener task follows the identity provider's `watch` channel. Every
//! notification resolves to exactly one terminal state: `Authenticated` when
//! the backend profile loads, `Unauthenticated` otherwise (forcing a provider
//! sign-out on resolution failure). The first resolution clears `loading`,
//! which never becomes true again. While a login is in flight the listener
//! only clears `loading`; the login publishes the user once every step has
//! succeeded. Dropping the store aborts the listener, so no state is written
//! after teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::error::AuthError;
use super::locale::Locale;
use super::registration::{Registration, validate_login};
use crate::identity::{Identity, IdentityProvider};
use crate::net::api::{ApiError, ProfileDirectory};
use crate::net::bridge::SessionExchange;
use crate::net::types::{NewUser, User};

// =============================================================================
// SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Resolving,
    Authenticated,
    Unauthenticated,
}

/// Read-only view of the auth state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub user: Option<User>,
    /// True until the first identity notification has been resolved.
    pub loading: bool,
    /// True while a login, register or logout call is in flight.
    pub action_loading: bool,
    /// Localized message from the last failed action.
    pub error: Option<String>,
}

impl AuthSnapshot {
    #[must_use]
    pub fn initial() -> Self {
        Self { user: None, loading: true, action_loading: false, error: None }
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        if self.loading {
            AuthPhase::Resolving
        } else if self.user.is_some() {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Unauthenticated
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct AuthStore {
    inner: Arc<Inner>,
    listener: JoinHandle<()>,
}

struct Inner {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileDirectory>,
    bridge: Arc<dyn SessionExchange>,
    locale: Locale,
    state: watch::Sender<AuthSnapshot>,
    logins_in_flight: AtomicUsize,
}

/// Marks a login as in flight until dropped, including on cancellation.
struct LoginInFlight<'a>(&'a AtomicUsize);

impl<'a> LoginInFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoginInFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AuthStore {
    /// Create the store and start following identity notifications.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileDirectory>,
        bridge: Arc<dyn SessionExchange>,
        locale: Locale,
    ) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::initial());
        let notifications = identity.subscribe();
        let inner = Arc::new(Inner {
            identity,
            profiles,
            bridge,
            locale,
            state,
            logins_in_flight: AtomicUsize::new(0),
        });
        let listener = tokio::spawn(listen(inner.clone(), notifications));
        Self { inner, listener }
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.inner.locale
    }

    /// Wait for the initial resolution to finish.
    pub async fn wait_resolved(&self) -> AuthSnapshot {
        let mut rx = self.subscribe();
        let resolved = rx.wait_for(|s| !s.loading).await.map(|s| s.clone());
        resolved.unwrap_or_else(|_| self.snapshot())
    }

    /// Sign in, open a bridge session, and publish the resolved profile.
    ///
    /// # Errors
    ///
    /// On any failure the published user is `None` and `error` holds the
    /// localized message. A missing profile also tears the provider session down.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let _in_flight = LoginInFlight::enter(&self.inner.logins_in_flight);
        self.inner.begin_action();
        let result = self.inner.login(email.trim(), password).await;
        let message = result.as_ref().err().map(|e| e.message(self.inner.locale).to_owned());
        let user = result.as_ref().ok().cloned();
        self.inner.state.send_modify(|s| {
            s.action_loading = false;
            s.loading = false;
            s.user = user;
            s.error = message;
        });
        result
    }

    /// Create the provider account and its backend profile.
    ///
    /// The new account is not signed in; callers send the user to login.
    ///
    /// # Errors
    ///
    /// Validation failures are reported before any network call. If the
    /// profile cannot be created, the provider account is deleted again.
    pub async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        self.inner.begin_action();
        let result = self.inner.register(form).await;
        let message = result.as_ref().err().map(|e| e.message(self.inner.locale).to_owned());
        self.inner.state.send_modify(|s| {
            s.action_loading = false;
            s.error = message;
        });
        result
    }

    /// Clear the bridge session and sign out. The user is always cleared
    /// locally, even when a remote step fails.
    pub async fn logout(&self) {
        self.inner.begin_action();
        self.inner.teardown(true).await;
        self.inner.state.send_modify(|s| {
            s.action_loading = false;
            s.user = None;
            s.error = None;
        });
        info!("logged out");
    }

    /// Log out if a user is signed in. Returns whether a logout ran.
    pub async fn close(&self) -> bool {
        if self.inner.state.borrow().user.is_none() {
            return false;
        }
        self.logout().await;
        true
    }
}

impl Drop for AuthStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn listen(inner: Arc<Inner>, mut notifications: watch::Receiver<Option<Identity>>) {
    loop {
        let identity = notifications.borrow_and_update().clone();
        inner.resolve(identity).await;
        if notifications.changed().await.is_err() {
            break;
        }
    }
}

impl Inner {
    fn begin_action(&self) {
        self.state.send_modify(|s| {
            s.action_loading = true;
            s.error = None;
        });
    }

    fn login_in_flight(&self) -> bool {
        self.logins_in_flight.load(Ordering::SeqCst) > 0
    }

    /// Resolve one identity notification into a terminal state.
    ///
    /// An in-flight login owns the published user until it finishes, so the
    /// listener only clears `loading` in that window.
    async fn resolve(&self, identity: Option<Identity>) {
        let user = match identity {
            None => None,
            Some(_) if self.login_in_flight() => None,
            Some(identity) => match self.profiles.fetch_profile(&identity.uid, &identity.email).await {
                Ok(user) if self.is_current(&identity) => Some(user),
                Ok(_) => None,
                Err(_) if self.login_in_flight() => None,
                Err(e) => {
                    warn!(uid = %identity.uid, error = %e, "profile resolution failed; signing out");
                    if let Err(e) = self.identity.sign_out().await {
                        warn!(error = %e, "forced sign-out failed");
                    }
                    None
                }
            },
        };
        self.state.send_if_modified(|s| {
            let was_loading = std::mem::replace(&mut s.loading, false);
            if self.login_in_flight() {
                return was_loading;
            }
            s.user = user;
            true
        });
    }

    /// A resolution is stale once the provider has moved to another identity.
    fn is_current(&self, identity: &Identity) -> bool {
        self.identity
            .current()
            .is_some_and(|current| current.uid == identity.uid)
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        validate_login(email, password)?;

        let identity = self.identity.sign_in(email, password).await?;

        if let Err(e) = self.bridge.establish(&identity.id_token).await {
            warn!(uid = %identity.uid, error = %e, "session bridge login failed");
            self.teardown(false).await;
            return Err(e.into());
        }

        match self.profiles.fetch_profile(&identity.uid, &identity.email).await {
            Ok(user) => {
                info!(uid = %user.id, profile_type = user.profile_type.as_str(), "logged in");
                Ok(user)
            }
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "profile lookup failed after sign-in");
                self.teardown(true).await;
                Err(e.into())
            }
        }
    }

    async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        form.validate()?;

        let email = form.email.trim();
        let identity = self.identity.sign_up(email, &form.password).await?;
        let profile = NewUser::new(
            identity.uid.clone(),
            form.name.trim().to_owned(),
            email.to_owned(),
            form.profile_type,
            form.document_id.trim().to_owned(),
        );

        match self.profiles.create_profile(&profile).await {
            Ok(user) => {
                info!(uid = %identity.uid, profile_type = form.profile_type.as_str(), "registered");
                Ok(user)
            }
            Err(e) => {
                warn!(uid = %identity.uid, error = %e, "profile creation failed; deleting identity account");
                if let Err(del) = self.identity.delete_account(&identity).await {
                    error!(uid = %identity.uid, error = %del, "identity account left without a profile");
                }
                Err(match e {
                    ApiError::Request(msg) => AuthError::Network(msg),
                    other => AuthError::Unknown(other.to_string()),
                })
            }
        }
    }

    async fn teardown(&self, clear_bridge: bool) {
        if clear_bridge {
            if let Err(e) = self.bridge.clear().await {
                warn!(error = %e, "session bridge logout failed");
            }
        }
        if let Err(e) = self.identity.sign_out().await {
            warn!(error = %e, "identity sign-out failed");
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
