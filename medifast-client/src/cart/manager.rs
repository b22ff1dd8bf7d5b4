//! Cart manager
//!
//! Sole mutation path into the persisted cart. Every operation validates
//! against the availability cache or the line's own add-time snapshot,
//! mutates the in-memory lines, and persists the full cart before
//! returning.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::availability::AvailabilityStore;
use crate::cart::storage::CartStorage;
use crate::storage::{KeyValueStore, StorageError};
use shared::{CartLine, Medication, Site, StockLevel};

/// Cart mutation errors. Validation failures never change cart state.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("No availability for medication {medication_id} at site {site_id}")]
    NotAvailable { medication_id: i64, site_id: i64 },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Insufficient stock: {requested} requested, {available} available")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("Cart already holds items for site {cart_site_id}, cannot add from site {requested_site_id}")]
    SiteConflict {
        cart_site_id: i64,
        requested_site_id: i64,
    },

    #[error("No cart line at index {0}")]
    OutOfBounds(usize),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Ordered cart lines plus their persistence.
#[derive(Debug)]
pub struct CartManager<S: KeyValueStore> {
    lines: Vec<CartLine>,
    storage: CartStorage<S>,
}

impl<S: KeyValueStore> CartManager<S> {
    /// Load the persisted cart from a key-value store.
    ///
    /// # Errors
    ///
    /// Only on storage IO failure; a corrupt entry self-heals to an
    /// empty cart inside [`CartStorage::load`].
    pub fn load(store: S) -> Result<Self, CartError> {
        let storage = CartStorage::new(store);
        let lines = storage.load()?;
        Ok(Self { lines, storage })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The single site this cart is pinned to, if non-empty.
    pub fn site_id(&self) -> Option<i64> {
        self.lines.first().map(|line| line.site_id)
    }

    /// Sum of requested quantities.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Add a medication from one site, merging with an existing line for
    /// the same (medication, site) pair.
    ///
    /// Returns the severity tier of the site's current stock so callers
    /// can show a non-blocking low-stock warning.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotAvailable`]: no stock row for the pair
    /// - [`CartError::InvalidQuantity`]: zero quantity
    /// - [`CartError::InsufficientStock`]: requested (or merged) quantity
    ///   exceeds current stock; an existing line is left untouched
    /// - [`CartError::SiteConflict`]: cart is pinned to another site;
    ///   clearing and replacing is the caller's decision
    pub fn add_item(
        &mut self,
        availability: &AvailabilityStore,
        medication: &Medication,
        site: &Site,
        quantity: u32,
    ) -> Result<StockLevel, CartError> {
        let row = availability
            .find(medication.id, site.id)
            .ok_or(CartError::NotAvailable {
                medication_id: medication.id,
                site_id: site.id,
            })?;

        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        if quantity > row.stock {
            return Err(CartError::InsufficientStock {
                requested: quantity,
                available: row.stock,
            });
        }

        if let Some(cart_site_id) = self.site_id() {
            if cart_site_id != site.id {
                return Err(CartError::SiteConflict {
                    cart_site_id,
                    requested_site_id: site.id,
                });
            }
        }

        let existing = self
            .lines
            .iter_mut()
            .find(|line| line.medication_id == medication.id && line.site_id == site.id);

        match existing {
            Some(line) => {
                let merged = line.quantity + quantity;
                if merged > row.stock {
                    return Err(CartError::InsufficientStock {
                        requested: merged,
                        available: row.stock,
                    });
                }
                line.quantity = merged;
            }
            None => {
                self.lines.push(CartLine {
                    medication_id: medication.id,
                    medication_name: medication.name.clone(),
                    site_id: site.id,
                    site_name: site.name.clone(),
                    stock: row.stock,
                    status: row.status.to_string(),
                    pickup_date: String::new(),
                    pickup_time: String::new(),
                    quantity,
                    max_quantity: row.stock,
                });
            }
        }

        self.persist()?;
        Ok(row.level())
    }

    /// Change a line's quantity, bounded by its add-time stock snapshot.
    ///
    /// # Errors
    ///
    /// [`CartError::OutOfBounds`] for a bad index;
    /// [`CartError::InvalidQuantity`] outside `1..=max_quantity`.
    pub fn update_quantity(&mut self, index: usize, quantity: u32) -> Result<(), CartError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(CartError::OutOfBounds(index))?;

        if quantity == 0 || quantity > line.max_quantity {
            return Err(CartError::InvalidQuantity(quantity));
        }

        line.quantity = quantity;
        self.persist()
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// [`CartError::OutOfBounds`] for a bad index.
    pub fn remove_item(&mut self, index: usize) -> Result<CartLine, CartError> {
        if index >= self.lines.len() {
            return Err(CartError::OutOfBounds(index));
        }

        let removed = self.lines.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// Stamp one pickup slot onto every line; the whole cart shares a
    /// single date and time.
    pub fn set_schedule(&mut self, date: NaiveDate, time: NaiveTime) -> Result<(), CartError> {
        let date = date.format("%Y-%m-%d").to_string();
        let time = time.format("%H:%M:%S").to_string();

        for line in &mut self.lines {
            line.pickup_date = date.clone();
            line.pickup_time = time.clone();
        }
        self.persist()
    }

    /// Empty the cart and delete its persisted entry.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        self.storage.clear()?;
        Ok(())
    }

    fn persist(&self) -> Result<(), CartError> {
        self.storage.save(&self.lines)?;
        Ok(())
    }
}
