//! Persistence layer for the cart

use crate::cart::CART_KEY;
use crate::storage::{KeyValueStore, StorageError};
use shared::CartLine;

/// Owns the persisted `carrito` entry.
#[derive(Debug, Clone)]
pub struct CartStorage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CartStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read the persisted cart.
    ///
    /// A missing entry is an empty cart. An unparseable entry is treated
    /// the same way: the corrupt value is deleted and an empty cart
    /// returned, never an error.
    pub fn load(&self) -> Result<Vec<CartLine>, StorageError> {
        let Some(raw) = self.store.get(CART_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(lines) => Ok(lines),
            Err(err) => {
                tracing::warn!(%err, "discarding corrupt persisted cart");
                self.store.remove(CART_KEY)?;
                Ok(Vec::new())
            }
        }
    }

    /// Write the full cart.
    pub fn save(&self, lines: &[CartLine]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(lines)?;
        self.store.put(CART_KEY, &raw)
    }

    /// Delete the persisted entry.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(CART_KEY)
    }

    /// True when a persisted entry exists.
    pub fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.store.get(CART_KEY)?.is_some())
    }
}
