//! Persistent key-value storage collaborator.
//!
//! Plays the role `localStorage` plays in a browser: string keys, string
//! values, shared by every surface in the same storage scope. The stores
//! treat it strictly as a write-through cache of in-memory state - memory
//! mutates first, then the persisted copy is written, and storage is only
//! read back when a store hydrates.
//!
//! Operations are synchronous on purpose: cart mutations must complete their
//! read-modify-persist sequence without a suspension point.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Persisted storage keys.
///
/// These names are part of the on-disk format; other readers of the same
/// storage scope depend on them.
pub mod keys {
    /// JSON-encoded array of cart lines.
    pub const CART: &str = "cart";

    /// Decimal string mirroring the cart's total quantity, kept so badge
    /// surfaces can render without re-parsing the full cart.
    pub const CART_COUNT: &str = "cartCount";

    /// Opaque bearer token for the current session.
    pub const AUTH_TOKEN: &str = "authToken";

    /// Role the session was opened under: `"user"` or `"admin"`.
    pub const AUTH_TYPE: &str = "authType";
}

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed (file-backed storage only).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing payload could not be encoded.
    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// String-keyed, string-valued persistent storage.
///
/// Implementations must be usable behind an `Arc` from multiple UI surfaces;
/// each individual operation is atomic, but read-modify-write sequences are
/// the caller's responsibility (the stores hold their own lock across them).
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// The value must be durable when this returns - the stores rely on
    /// synchronous durability, not eventual flushing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key` if present. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
