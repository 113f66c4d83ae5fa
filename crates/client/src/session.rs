//! Session identity.
//!
//! The identity provider issues a customer ID and bearer token at login. The
//! cart core only ever asks one question of it: is there a customer right
//! now? [`SessionMode`] is that answer, resolved once per operation.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shopfront_core::CustomerId;

/// Which cart semantics an operation runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// No customer; the local cart is the only copy.
    Anonymous,
    /// Signed in; the remote cart is authoritative.
    Authenticated(CustomerId),
}

impl SessionMode {
    /// The customer ID, if signed in.
    #[must_use]
    pub const fn customer_id(&self) -> Option<&CustomerId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(id) => Some(id),
        }
    }
}

/// Read-only view of the current identity.
pub trait SessionProvider: Send + Sync {
    /// Resolve the current mode. Implementations must not block.
    fn mode(&self) -> SessionMode;
}

/// An authenticated session.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    /// Customer the backend issued the token for.
    pub customer_id: CustomerId,
    /// Bearer token sent with API requests.
    pub token: SecretString,
}

impl Session {
    /// Create a session from a login response.
    #[must_use]
    pub fn new(customer_id: CustomerId, token: SecretString) -> Self {
        Self { customer_id, token }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("customer_id", &self.customer_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// On-disk form of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub customer_id: CustomerId,
    pub token: String,
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self::new(stored.customer_id, SecretString::from(stored.token))
    }
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            customer_id: session.customer_id.clone(),
            token: session.token.expose_secret().to_owned(),
        }
    }
}

/// Shared, swappable session slot.
///
/// Cheaply cloneable; the API client reads the token from it per request and
/// the cart synchronizer reads the mode from it per operation.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// An anonymous handle.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A handle that starts signed in.
    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(session))),
        }
    }

    /// Replace the current session.
    pub fn sign_in(&self, session: Session) {
        tracing::debug!(customer_id = %session.customer_id, "session started");
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Drop the current session, returning it.
    pub fn sign_out(&self) -> Option<Session> {
        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = &previous {
            tracing::debug!(customer_id = %session.customer_id, "session ended");
        }
        previous
    }

    /// A copy of the current session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The bearer token of the current session.
    #[must_use]
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.current().map(|s| s.token)
    }
}

impl SessionProvider for SessionHandle {
    fn mode(&self) -> SessionMode {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(SessionMode::Anonymous, |s| {
                SessionMode::Authenticated(s.customer_id.clone())
            })
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionHandle").field(&self.mode()).finish()
    }
}
