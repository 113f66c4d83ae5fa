//! Local cart state.

use serde::{Deserialize, Serialize};
use shopfront_core::{Price, ProductId};

use crate::api::{Product, RemoteCartItem};

/// One product in the cart with a display snapshot of its catalog record.
///
/// `quantity` is never zero: constructors refuse it and [`CartState`]
/// removes a line instead of storing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    product: Product,
    quantity: u32,
}

impl CartLine {
    /// A line holding `quantity` units of `product`, or `None` for zero.
    #[must_use]
    pub fn new(product: Product, quantity: u32) -> Option<Self> {
        if quantity == 0 {
            None
        } else {
            Some(Self { product, quantity })
        }
    }

    /// A line built from the remote cart's own denormalized fields, used
    /// when the catalog lookup for the product fails.
    ///
    /// Quantity follows [`remote_quantity`].
    #[must_use]
    pub fn degraded(item: &RemoteCartItem) -> Option<Self> {
        let quantity = remote_quantity(item.quantity)?;
        let product = Product::degraded(
            item.product_id.clone(),
            item.product_name.clone(),
            item.price_at_added_time,
        );
        Self::new(product, quantity)
    }

    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// Quantity a remote line holds locally: `None` for zero or less, capped at
/// `u32::MAX` above that.
#[must_use]
pub fn remote_quantity(quantity: i64) -> Option<u32> {
    if quantity <= 0 {
        return None;
    }
    Some(u32::try_from(quantity).unwrap_or(u32::MAX))
}

/// Ordered cart lines, unique by product ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    lines: Vec<CartLine>,
}

impl CartState {
    /// Build a state from lines, merging duplicate products by summing
    /// their quantities. First occurrence keeps its position and snapshot.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut state = Self::default();
        for line in lines {
            match state.position(line.product_id()) {
                Some(idx) => {
                    if let Some(existing) = state.lines.get_mut(idx) {
                        existing.quantity = existing.quantity.saturating_add(line.quantity);
                    }
                }
                None => state.lines.push(line),
            }
        }
        state
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == id)
    }

    /// Quantity held for `id`, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, id: &ProductId) -> u32 {
        self.get(id).map_or(0, CartLine::quantity)
    }

    /// Add one unit of `product`, inserting a new line at the end if needed.
    pub fn increment(&mut self, product: &Product) {
        match self.lines.iter_mut().find(|line| line.product.id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            }),
        }
    }

    /// Overwrite the quantity of an existing line; zero or less removes it.
    ///
    /// Returns `false` if nothing changed. An absent product with a positive
    /// quantity is left absent since there is no snapshot to display.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        if quantity <= 0 {
            self.lines.remove(idx);
            return true;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.lines.get_mut(idx).is_some_and(|line| {
            let changed = line.quantity != quantity;
            line.quantity = quantity;
            changed
        })
    }

    /// Remove the line for `id`, returning it.
    pub fn remove(&mut self, id: &ProductId) -> Option<CartLine> {
        let idx = self.position(id)?;
        Some(self.lines.remove(idx))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total units across all lines (not the number of distinct lines).
    #[must_use]
    pub fn line_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|line| line.product_id() == id)
    }
}
