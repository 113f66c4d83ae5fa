//! In-memory stand-ins for the remote services, shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use shopfront_core::{CategoryId, CustomerId, Price, ProductId};
use tokio::sync::Notify;

use crate::api::{ApiError, CartDelta, Product, RemoteCart, RemoteCartItem};
use crate::cart::{CartSynchronizer, ProductCatalog, RemoteCartService};
use crate::session::{Session, SessionHandle};

/// A remote call observed by [`FakeRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch,
    Add(ProductId, u32),
    Remove(ProductId, u32),
}

/// Remote cart service backed by a map, applying deltas like the real one.
#[derive(Default)]
pub struct FakeRemote {
    carts: Mutex<HashMap<CustomerId, Vec<RemoteCartItem>>>,
    listings: HashMap<ProductId, (String, Price)>,
    calls: Mutex<Vec<Call>>,
    fail_mutations: AtomicBool,
    fail_fetch: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl FakeRemote {
    pub fn new(products: &[Product]) -> Self {
        Self {
            listings: products
                .iter()
                .map(|p| (p.id.clone(), (p.name.clone(), p.price)))
                .collect(),
            ..Self::default()
        }
    }

    /// Make every fetch wait for a notification before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn seed(&self, customer: &CustomerId, product_id: &str, quantity: i64) {
        let id = ProductId::new(product_id);
        let (name, price) = self.listing(&id);
        self.carts
            .lock()
            .unwrap()
            .entry(customer.clone())
            .or_default()
            .push(RemoteCartItem {
                product_id: id,
                product_name: name,
                quantity,
                price_at_added_time: price,
            });
    }

    pub fn quantity(&self, customer: &CustomerId, product_id: &str) -> i64 {
        self.carts
            .lock()
            .unwrap()
            .get(customer)
            .and_then(|items| items.iter().find(|i| i.product_id.as_str() == product_id))
            .map_or(0, |i| i.quantity)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Fetch))
            .collect()
    }

    pub fn fetches(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::Fetch)).count()
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    fn listing(&self, id: &ProductId) -> (String, Price) {
        self.listings
            .get(id)
            .cloned()
            .unwrap_or_else(|| (String::new(), Price::ZERO))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn apply(&self, customer: &CustomerId, product_id: &ProductId, change: i64) {
        let mut carts = self.carts.lock().unwrap();
        let items = carts.entry(customer.clone()).or_default();
        match items.iter_mut().find(|i| &i.product_id == product_id) {
            Some(item) => item.quantity += change,
            None if change > 0 => {
                let (name, price) = self.listing(product_id);
                items.push(RemoteCartItem {
                    product_id: product_id.clone(),
                    product_name: name,
                    quantity: change,
                    price_at_added_time: price,
                });
            }
            None => {}
        }
        items.retain(|i| i.quantity > 0);
    }

    fn unavailable() -> ApiError {
        ApiError::Status {
            status: 503,
            body: "cart service unavailable".to_string(),
        }
    }
}

impl RemoteCartService for FakeRemote {
    async fn fetch_cart(&self, customer: &CustomerId) -> Result<RemoteCart, ApiError> {
        self.record(Call::Fetch);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let items = self
            .carts
            .lock()
            .unwrap()
            .get(customer)
            .cloned()
            .unwrap_or_default();
        Ok(RemoteCart { items })
    }

    async fn add_items(&self, customer: &CustomerId, delta: &CartDelta) -> Result<(), ApiError> {
        tokio::task::yield_now().await;
        self.record(Call::Add(delta.product_id.clone(), delta.quantity));
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.apply(customer, &delta.product_id, i64::from(delta.quantity));
        Ok(())
    }

    async fn remove_items(&self, customer: &CustomerId, delta: &CartDelta) -> Result<(), ApiError> {
        tokio::task::yield_now().await;
        self.record(Call::Remove(delta.product_id.clone(), delta.quantity));
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.apply(customer, &delta.product_id, -i64::from(delta.quantity));
        Ok(())
    }
}

/// Catalog backed by a map; selected products can be made to fail.
#[derive(Default)]
pub struct FakeCatalog {
    products: HashMap<ProductId, Product>,
    failing: Mutex<HashSet<ProductId>>,
    lookups: AtomicUsize,
}

impl FakeCatalog {
    pub fn new(products: &[Product]) -> Self {
        Self {
            products: products.iter().map(|p| (p.id.clone(), p.clone())).collect(),
            ..Self::default()
        }
    }

    pub fn fail_for(&self, product_id: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(ProductId::new(product_id));
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ProductCatalog for FakeCatalog {
    async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(id) {
            return Err(ApiError::Status {
                status: 500,
                body: "catalog error".to_string(),
            });
        }
        self.products
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }
}

/// A fully populated catalog product.
pub fn product(id: &str, name: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: format!("{name}, from the catalog"),
        price: Price::from_cents(cents),
        category_id: CategoryId::new("kitchen"),
        inventory: 25,
        image_url: Some(format!("https://img.example.com/{id}.jpg")),
        active: true,
    }
}

pub fn customer() -> CustomerId {
    CustomerId::new("cust-1")
}

pub type TestCart = CartSynchronizer<Arc<FakeRemote>, Arc<FakeCatalog>, SessionHandle>;

/// A synchronizer wired to fakes, plus handles to inspect them.
pub struct Fixture {
    pub remote: Arc<FakeRemote>,
    pub catalog: Arc<FakeCatalog>,
    pub session: SessionHandle,
    pub cart: TestCart,
}

impl Fixture {
    pub fn new(products: &[Product]) -> Self {
        Self::with_remote(FakeRemote::new(products), products)
    }

    pub fn with_remote(remote: FakeRemote, products: &[Product]) -> Self {
        let remote = Arc::new(remote);
        let catalog = Arc::new(FakeCatalog::new(products));
        let session = SessionHandle::anonymous();
        let cart = CartSynchronizer::new(remote.clone(), catalog.clone(), session.clone());
        Self {
            remote,
            catalog,
            session,
            cart,
        }
    }

    pub fn sign_in(&self) {
        self.session
            .sign_in(Session::new(customer(), SecretString::from("test-token")));
    }
}
