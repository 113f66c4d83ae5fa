//! Per-invocation wiring: config, saved state, API client and cart.

use shopfront_client::api::ApiClient;
use shopfront_client::cart::CartSynchronizer;
use shopfront_client::config::ClientConfig;
use shopfront_client::session::{Session, SessionHandle, StoredSession};
use shopfront_client::store::{StateSnapshot, StateStore};

/// Cart wired to the live backend.
pub type Cart = CartSynchronizer<ApiClient, ApiClient, SessionHandle>;

/// Everything a command needs.
pub struct App {
    pub api: ApiClient,
    pub cart: Cart,
    store: StateStore,
}

impl App {
    /// Restore the saved session and cart and connect to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file is unreadable or the HTTP client
    /// cannot be built.
    pub fn load(config: ClientConfig) -> shopfront_client::Result<Self> {
        let store = StateStore::new(&config.state_file);
        let snapshot = store.load()?;

        let session = snapshot
            .session
            .map_or_else(SessionHandle::anonymous, |stored| {
                SessionHandle::signed_in(Session::from(stored))
            });
        let api = ApiClient::new(&config, session.clone())?;
        let cart = CartSynchronizer::new(api.clone(), api.clone(), session);
        cart.restore(snapshot.lines);

        tracing::debug!(
            path = %store.path().display(),
            mode = ?cart.session_mode(),
            "State restored"
        );
        Ok(Self { api, cart, store })
    }

    /// Write the current session and cart back to the state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn save(&self) -> shopfront_client::Result<()> {
        let snapshot = StateSnapshot {
            session: self.api.session().current().as_ref().map(StoredSession::from),
            lines: self.cart.lines(),
        };
        self.store.save(&snapshot)?;
        Ok(())
    }
}
