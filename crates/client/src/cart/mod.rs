//! Cart synchronization.
//!
//! [`CartSynchronizer`] owns the local cart and decides, per operation,
//! whether a change stays local (anonymous) or is mirrored to the remote cart
//! service (signed in). In the signed-in case every mutation is sent as a
//! delta and followed by a full refresh, so the local cart always ends up as
//! the remote service last reported it.
//!
//! # Concurrency
//!
//! Mutations and refreshes take turns through a FIFO queue. Without it two
//! overlapping `set_quantity` calls would both compute their delta from the
//! same stale quantity and one update would be lost. `clear` skips the queue
//! and bumps an epoch instead; a refresh that started before the clear sees
//! the new epoch and drops its response.

mod service;
mod state;

pub use service::{ProductCatalog, RemoteCartService};
pub use state::{CartLine, CartState};
use state::remote_quantity;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::join_all;
use shopfront_core::{CustomerId, Price, ProductId};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, CartDelta, Product, RemoteCartItem};
use crate::session::{SessionMode, SessionProvider};

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The delta call to the remote cart failed; the local cart is unchanged.
    #[error("cart update failed: {0}")]
    Remote(#[source] ApiError),

    /// Refreshing from the remote cart failed; the local cart is unchanged.
    #[error("cart refresh failed: {0}")]
    Reconcile(#[source] ApiError),

    /// Requested quantity cannot be expressed as a single delta.
    #[error("quantity {0} is out of range")]
    QuantityOutOfRange(i64),
}

/// What a cart operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Applied to the local cart only.
    Local,
    /// Nothing to do; no state changed and no request was sent.
    Unchanged,
    /// The local cart was replaced with the remote cart.
    Reconciled(ReconcileReport),
    /// The remote cart was fetched but the local cart was cleared meanwhile,
    /// so the response was dropped.
    Discarded,
}

/// Summary of a refresh from the remote cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Lines now in the cart.
    pub lines: usize,
    /// Lines whose catalog lookup failed and that show the cart service's
    /// own name and price instead.
    pub degraded: usize,
    /// Remote lines left out because their quantity was zero or less.
    pub dropped: usize,
}

/// Sets the loading flag for its lifetime.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Local cart kept in step with the remote cart service.
pub struct CartSynchronizer<R, C, S> {
    remote: R,
    catalog: C,
    session: S,
    state: RwLock<CartState>,
    loading: AtomicBool,
    epoch: AtomicU64,
    queue: Mutex<()>,
}

impl<R, C, S> CartSynchronizer<R, C, S>
where
    R: RemoteCartService,
    C: ProductCatalog,
    S: SessionProvider,
{
    /// Create a synchronizer with an empty cart.
    #[must_use]
    pub fn new(remote: R, catalog: C, session: S) -> Self {
        Self {
            remote,
            catalog,
            session,
            state: RwLock::new(CartState::default()),
            loading: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            queue: Mutex::new(()),
        }
    }

    /// Seed the local cart, e.g. from a saved snapshot.
    pub fn restore(&self, lines: impl IntoIterator<Item = CartLine>) {
        *self.write_state() = CartState::from_lines(lines);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The mode the next operation would run under.
    #[must_use]
    pub fn session_mode(&self) -> SessionMode {
        self.session.mode()
    }

    /// A copy of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.read_state().lines().to_vec()
    }

    /// Quantity held locally for `product_id`, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.read_state().quantity_of(product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_state().is_empty()
    }

    /// Whether a refresh from the remote cart is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Sum of unit price times quantity, computed from the current lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.read_state().total()
    }

    /// Total units in the cart.
    #[must_use]
    pub fn line_count(&self) -> u64 {
        self.read_state().line_count()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Replace the local cart with the remote cart.
    ///
    /// Anonymous sessions have no remote cart, so this does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Reconcile`] if the remote cart cannot be read. The
    /// local cart is left as it was.
    #[instrument(skip_all)]
    pub async fn fetch_and_reconcile(&self) -> Result<SyncOutcome, CartError> {
        let _turn = self.queue.lock().await;
        match self.session.mode() {
            SessionMode::Anonymous => {
                debug!("no customer, skipping cart refresh");
                Ok(SyncOutcome::Unchanged)
            }
            SessionMode::Authenticated(customer) => self.reconcile(&customer).await,
        }
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// Signed in only: [`CartError::Remote`] if the add is rejected,
    /// [`CartError::Reconcile`] if the follow-up refresh fails.
    #[instrument(skip_all, fields(product_id = %product.id))]
    pub async fn add_one(&self, product: &Product) -> Result<SyncOutcome, CartError> {
        let _turn = self.queue.lock().await;
        match self.session.mode() {
            SessionMode::Anonymous => {
                self.write_state().increment(product);
                Ok(SyncOutcome::Local)
            }
            SessionMode::Authenticated(customer) => {
                self.send_delta(&customer, &product.id, 1).await?;
                self.reconcile(&customer).await
            }
        }
    }

    /// Remove a product's line entirely.
    ///
    /// Signed in, the remote service only removes by amount, so the amount is
    /// the quantity currently held locally. A product not in the local cart
    /// is left alone.
    ///
    /// # Errors
    ///
    /// Signed in only: [`CartError::Remote`] if the removal is rejected,
    /// [`CartError::Reconcile`] if the follow-up refresh fails.
    #[instrument(skip_all, fields(product_id = %product_id))]
    pub async fn remove_all(&self, product_id: &ProductId) -> Result<SyncOutcome, CartError> {
        let _turn = self.queue.lock().await;
        match self.session.mode() {
            SessionMode::Anonymous => {
                let removed = self.write_state().remove(product_id).is_some();
                Ok(if removed {
                    SyncOutcome::Local
                } else {
                    SyncOutcome::Unchanged
                })
            }
            SessionMode::Authenticated(customer) => {
                let held = self.read_state().quantity_of(product_id);
                if held == 0 {
                    debug!("product not in cart, nothing to remove");
                    return Ok(SyncOutcome::Unchanged);
                }
                self.send_delta(&customer, product_id, -i64::from(held))
                    .await?;
                self.reconcile(&customer).await
            }
        }
    }

    /// Set a product's quantity; zero or less removes the line.
    ///
    /// Anonymous, only an existing line can be changed. Signed in, the
    /// difference from the locally held quantity is sent as a single delta;
    /// an unchanged quantity sends nothing and skips the refresh.
    ///
    /// # Errors
    ///
    /// Signed in only: [`CartError::QuantityOutOfRange`] if the difference
    /// does not fit a delta, [`CartError::Remote`] if the delta is rejected,
    /// [`CartError::Reconcile`] if the follow-up refresh fails.
    #[instrument(skip_all, fields(product_id = %product_id, quantity = quantity))]
    pub async fn set_quantity(
        &self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<SyncOutcome, CartError> {
        let _turn = self.queue.lock().await;
        match self.session.mode() {
            SessionMode::Anonymous => {
                let changed = self.write_state().set_quantity(product_id, quantity);
                Ok(if changed {
                    SyncOutcome::Local
                } else {
                    SyncOutcome::Unchanged
                })
            }
            SessionMode::Authenticated(customer) => {
                let held = i64::from(self.read_state().quantity_of(product_id));
                let diff = quantity.max(0) - held;
                if diff == 0 {
                    return Ok(SyncOutcome::Unchanged);
                }
                self.send_delta(&customer, product_id, diff)
                    .await
                    .map_err(|err| match err {
                        CartError::QuantityOutOfRange(_) => CartError::QuantityOutOfRange(quantity),
                        other => other,
                    })?;
                self.reconcile(&customer).await
            }
        }
    }

    /// Empty the local cart.
    ///
    /// Local only in both modes: the remote cart keeps its contents until the
    /// order flow consumes it. Any refresh already in flight is dropped when
    /// it completes.
    pub fn clear(&self) {
        let mut state = self.write_state();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        state.clear();
        debug!("local cart cleared");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Send `diff` as an add (positive) or remove (negative) delta.
    async fn send_delta(
        &self,
        customer: &CustomerId,
        product_id: &ProductId,
        diff: i64,
    ) -> Result<(), CartError> {
        let quantity =
            u32::try_from(diff.unsigned_abs()).map_err(|_| CartError::QuantityOutOfRange(diff))?;
        let delta = CartDelta {
            product_id: product_id.clone(),
            quantity,
        };

        let result = if diff > 0 {
            self.remote.add_items(customer, &delta).await
        } else {
            self.remote.remove_items(customer, &delta).await
        };

        result.map_err(|err| {
            warn!(
                customer_id = %customer,
                quantity = diff,
                error = %err,
                "cart delta rejected, keeping local cart"
            );
            CartError::Remote(err)
        })
    }

    /// Fetch the remote cart, enrich it from the catalog and swap it in.
    async fn reconcile(&self, customer: &CustomerId) -> Result<SyncOutcome, CartError> {
        let epoch = self.epoch.load(Ordering::Acquire);
        let _loading = LoadingGuard::engage(&self.loading);

        let remote = self.remote.fetch_cart(customer).await.map_err(|err| {
            warn!(customer_id = %customer, error = %err, "cart refresh failed, keeping local cart");
            CartError::Reconcile(err)
        })?;

        let enriched = join_all(remote.items.iter().map(|item| self.enrich(item))).await;
        let degraded = enriched
            .iter()
            .filter(|line| matches!(line, Some((_, true))))
            .count();
        let dropped = enriched.iter().filter(|line| line.is_none()).count();
        let next = CartState::from_lines(enriched.into_iter().flatten().map(|(line, _)| line));
        let report = ReconcileReport {
            lines: next.lines().len(),
            degraded,
            dropped,
        };

        let mut state = self.write_state();
        if self.epoch.load(Ordering::Acquire) != epoch {
            debug!("cart cleared during refresh, dropping response");
            return Ok(SyncOutcome::Discarded);
        }
        *state = next;
        drop(state);

        debug!(
            lines = report.lines,
            degraded = report.degraded,
            dropped = report.dropped,
            "cart reconciled"
        );
        Ok(SyncOutcome::Reconciled(report))
    }

    /// Turn a remote line into a cart line, flagging whether it is degraded.
    async fn enrich(&self, item: &RemoteCartItem) -> Option<(CartLine, bool)> {
        let Some(quantity) = remote_quantity(item.quantity) else {
            warn!(
                product_id = %item.product_id,
                quantity = item.quantity,
                "dropping empty remote line"
            );
            return None;
        };
        if i64::from(quantity) != item.quantity {
            warn!(
                product_id = %item.product_id,
                quantity = item.quantity,
                "remote quantity out of range, capping"
            );
        }

        match self.catalog.product(&item.product_id).await {
            Ok(product) => CartLine::new(product, quantity).map(|line| (line, false)),
            Err(err) => {
                warn!(
                    product_id = %item.product_id,
                    error = %err,
                    "catalog lookup failed, using cart snapshot"
                );
                CartLine::degraded(item).map(|line| (line, true))
            }
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CartState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
