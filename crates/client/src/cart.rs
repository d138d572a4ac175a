//! Shopping cart store.
//!
//! The cart is the authoritative in-memory line list plus a write-through
//! persisted copy. Mutations are synchronous: the read-modify-persist
//! sequence runs inside one critical section with no suspension point, so
//! interleaved UI handlers always observe a consistent cart.
//!
//! Several independent surfaces read the cart (product listing, cart page,
//! checkout, nav badge); the badge subscribes to a watch channel instead of
//! polling.

use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, warn};

use peddler_core::ProductId;

use crate::models::{CartLine, ProductSnapshot};
use crate::storage::{KeyValueStorage, keys};

/// The shopping cart state container.
///
/// Cheaply cloneable; clones share the same cart. Construct one at
/// application start and hand it to every surface that needs it.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn KeyValueStorage>,
    lines: Mutex<Vec<CartLine>>,
    count_tx: watch::Sender<u32>,
}

impl CartStore {
    /// Create a cart store, hydrating from the persisted copy if present.
    ///
    /// A missing, malformed or schema-invalid persisted cart yields an empty
    /// cart - hydration fails open, never panics.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        let (lines, sanitized) = hydrate(storage.as_ref());
        let count = sum_quantities(&lines);
        let (count_tx, _) = watch::channel(count);

        let store = Self {
            inner: Arc::new(CartStoreInner {
                storage,
                lines: Mutex::new(lines),
                count_tx,
            }),
        };

        // A lossy hydration leaves the persisted copy ahead of memory; write
        // the sanitized cart back so the two agree before the first mutation.
        if sanitized {
            let lines = store.lock();
            store.persist(&lines);
        }

        store
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product to the cart.
    ///
    /// A quantity below one is clipped to one. If a line with the same
    /// `(product_id, selected_color)` already exists its quantity is
    /// incremented; otherwise a new line is appended with the product's
    /// denormalized snapshot. The persisted copy is updated before this
    /// returns.
    pub fn add_line(&self, product: ProductSnapshot, quantity: u32) {
        if product.product_id.is_empty() {
            warn!("Ignoring add_line for product with empty id");
            return;
        }

        let quantity = quantity.max(1);
        let mut lines = self.lock();

        match lines
            .iter_mut()
            .find(|line| line.matches(&product.product_id, product.selected_color.as_deref()))
        {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                debug!(product_id = %line.product_id, quantity = line.quantity, "Merged cart line");
            }
            None => {
                debug!(product_id = %product.product_id, quantity, "Appended cart line");
                lines.push(CartLine::from_snapshot(product, quantity));
            }
        }

        self.persist(&lines);
    }

    /// Remove the line identified by `(product_id, selected_color)`.
    ///
    /// Removing an absent line is a no-op, not an error.
    pub fn remove_line(&self, product_id: &ProductId, selected_color: Option<&str>) {
        let mut lines = self.lock();
        let before = lines.len();
        lines.retain(|line| !line.matches(product_id, selected_color));

        if lines.len() != before {
            self.persist(&lines);
        }
    }

    /// Replace the quantity of the line identified by
    /// `(product_id, selected_color)`.
    ///
    /// A quantity of zero or less removes the line. Absent lines are left
    /// alone.
    pub fn set_quantity(&self, product_id: &ProductId, selected_color: Option<&str>, quantity: i64) {
        if quantity <= 0 {
            self.remove_line(product_id, selected_color);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let mut lines = self.lock();

        if let Some(line) = lines
            .iter_mut()
            .find(|line| line.matches(product_id, selected_color))
        {
            line.quantity = quantity;
            self.persist(&lines);
        }
    }

    /// Empty the cart and persist the empty state.
    ///
    /// Used after a successful checkout and for an explicit cart reset.
    pub fn clear(&self) {
        let mut lines = self.lock();
        lines.clear();
        self.persist(&lines);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Total quantity across all lines - the number badge surfaces show.
    #[must_use]
    pub fn count(&self) -> u32 {
        sum_quantities(&self.lock())
    }

    /// Sum of `price * quantity` over the snapshot prices.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lock().iter().map(CartLine::line_total).sum()
    }

    /// Ordered snapshot of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Subscribe to cart count changes.
    ///
    /// The receiver starts at the current count and observes every mutation.
    /// Dropping it is how a surface unsubscribes; no update is ever applied
    /// to a dropped subscriber.
    #[must_use]
    pub fn subscribe_count(&self) -> watch::Receiver<u32> {
        self.inner.count_tx.subscribe()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, Vec<CartLine>> {
        self.inner
            .lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Write the in-memory cart through to storage and notify count
    /// subscribers. Called with the line lock held so the persisted copy
    /// always matches what the mutation produced.
    ///
    /// Memory is the source of truth: a storage failure is logged and the
    /// mutation still stands.
    fn persist(&self, lines: &[CartLine]) {
        let count = sum_quantities(lines);

        match serde_json::to_string(lines) {
            Ok(encoded) => {
                if let Err(e) = self.inner.storage.set(keys::CART, &encoded) {
                    tracing::error!(error = %e, "Failed to persist cart");
                }
                if let Err(e) = self.inner.storage.set(keys::CART_COUNT, &count.to_string()) {
                    tracing::error!(error = %e, "Failed to persist cart count");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode cart"),
        }

        self.inner.count_tx.send_replace(count);
    }
}

/// Load the persisted cart, failing open to empty on any malformed payload.
///
/// The second element is true when the loaded lines differ from what was
/// persisted and the persisted copy needs rewriting.
fn hydrate(storage: &dyn KeyValueStorage) -> (Vec<CartLine>, bool) {
    let raw = match storage.get(keys::CART) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (Vec::new(), false),
        Err(e) => {
            warn!(error = %e, "Could not read persisted cart, starting empty");
            return (Vec::new(), false);
        }
    };

    match serde_json::from_str::<Vec<CartLine>>(&raw) {
        Ok(mut lines) => {
            // A quantity of zero should never have been persisted; drop such
            // lines rather than resurrecting them.
            let before = lines.len();
            lines.retain(|line| line.quantity >= 1);
            let sanitized = lines.len() != before;
            if sanitized {
                warn!(
                    dropped = before - lines.len(),
                    "Dropped persisted cart lines with zero quantity"
                );
            }
            (lines, sanitized)
        }
        Err(e) => {
            warn!(error = %e, "Persisted cart is malformed, starting empty");
            (Vec::new(), true)
        }
    }
}

fn sum_quantities(lines: &[CartLine]) -> u32 {
    lines
        .iter()
        .fold(0_u32, |total, line| total.saturating_add(line.quantity))
}
