//! Shared types for the Medifast client
//!
//! Common types used across the client crates: medication catalog and
//! stock types, cart and pickup wire structures, and the realtime event
//! vocabulary pushed by the backend.

pub mod cart;
pub mod catalog;
pub mod events;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Catalog re-exports (for convenient access)
pub use catalog::{Availability, LOW_STOCK_THRESHOLD, Medication, Site, StockLevel, StockStatus};

// Cart re-exports
pub use cart::{CartLine, PickupRecord, PickupRequest};

// Event re-exports
pub use events::{LowStockAlert, ServerEvent, UnknownEvent};
