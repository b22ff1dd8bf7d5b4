//! Medifast Client - reservation core for the medication-pickup app
//!
//! Provides the device-local pickup cart, the availability cache it is
//! validated against, the realtime channel that keeps the cache fresh,
//! and the batch scheduler that converts the cart into backend pickup
//! records.

pub mod availability;
pub mod batch;
pub mod cart;
pub mod config;
pub mod error;
pub mod http;
pub mod realtime;
pub mod storage;
pub mod sync;

pub use availability::AvailabilityStore;
pub use batch::{BatchError, BatchScheduler, SubmitState};
pub use cart::{CART_KEY, CartError, CartManager, CartStorage};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use http::{Backend, HttpClient};
pub use realtime::{EventChannel, MemoryChannel, RawEvent, RealtimeError, RealtimeManager, TcpChannel};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use sync::{RefreshDriver, SyncSignal};

// Re-export shared types for convenience
pub use shared::{
    Availability, CartLine, LowStockAlert, Medication, PickupRecord, PickupRequest, ServerEvent,
    Site, StockLevel, StockStatus,
};
