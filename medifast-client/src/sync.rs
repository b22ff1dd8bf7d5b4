//! Cache-invalidation signals and the refresh driver
//!
//! Structural server events trigger a full availability reload rather
//! than an incremental patch: pushed payloads carry no version numbers,
//! so wholesale replacement is the only safe merge. Staleness between a
//! push and an in-flight reload is resolved last-write-wins by wall
//! clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, mpsc};

use crate::availability::AvailabilityStore;
use crate::http::Backend;
use shared::{LowStockAlert, ServerEvent};

/// A server push translated for local consumers.
#[derive(Debug, Clone)]
pub enum SyncSignal {
    /// The availability cache is stale; reload it.
    Refresh { received_at: DateTime<Utc> },
    /// Passive low-stock notice for the UI. Never mutates the cart.
    LowStock(LowStockAlert),
    /// The user's favorites list changed on another surface.
    FavoritesChanged,
    /// The user record changed.
    UserChanged,
}

impl SyncSignal {
    /// Translate a pushed event; `None` for events this core only logs.
    pub fn from_event(event: ServerEvent) -> Option<Self> {
        if event.is_structural() {
            return Some(SyncSignal::Refresh {
                received_at: Utc::now(),
            });
        }

        match event {
            ServerEvent::LowStock(alert) => Some(SyncSignal::LowStock(alert)),
            ServerEvent::FavoriteAdded(_) | ServerEvent::FavoriteRemoved(_) => {
                Some(SyncSignal::FavoritesChanged)
            }
            ServerEvent::UserUpdated(_) => Some(SyncSignal::UserChanged),
            ServerEvent::Error(payload) => {
                tracing::warn!(?payload, "realtime error event");
                None
            }
            _ => None,
        }
    }
}

/// Applies [`SyncSignal`]s to the availability cache and forwards
/// low-stock alerts to the UI layer.
pub struct RefreshDriver<B: Backend> {
    store: Arc<Mutex<AvailabilityStore>>,
    backend: B,
    alerts: Option<mpsc::UnboundedSender<LowStockAlert>>,
}

impl<B: Backend> RefreshDriver<B> {
    pub fn new(store: Arc<Mutex<AvailabilityStore>>, backend: B) -> Self {
        Self {
            store,
            backend,
            alerts: None,
        }
    }

    /// Forward low-stock alerts to this channel.
    pub fn with_alerts(mut self, alerts: mpsc::UnboundedSender<LowStockAlert>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Consume signals until the realtime channel goes away. Lagged
    /// subscriptions skip ahead; the next refresh restores consistency.
    pub async fn run(&self, mut signals: broadcast::Receiver<SyncSignal>) {
        loop {
            match signals.recv().await {
                Ok(signal) => self.handle(signal).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "refresh driver lagged behind signal stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Apply one signal.
    pub async fn handle(&self, signal: SyncSignal) {
        match signal {
            SyncSignal::Refresh { received_at } => {
                let mut store = self.store.lock().await;
                if store.is_fresher_than(received_at) {
                    // a reload finished after this push was received
                    tracing::trace!("skipping refresh for stale push event");
                    return;
                }
                if let Err(err) = store.load_all(&self.backend).await {
                    // cache stays stale; surfaced here, retried on the
                    // next signal or user-initiated reload
                    tracing::warn!(%err, "availability refresh failed");
                }
            }
            SyncSignal::LowStock(alert) => {
                if let Some(alerts) = &self.alerts {
                    let _ = alerts.send(alert);
                }
            }
            SyncSignal::FavoritesChanged | SyncSignal::UserChanged => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use async_trait::async_trait;
    use chrono::Duration;
    use serde_json::json;
    use shared::{Availability, Medication, PickupRecord, PickupRequest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBackend {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl Backend for CountingBackend {
        async fn medications(&self) -> ApiResult<Vec<Medication>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn availability(&self) -> ApiResult<Vec<Availability>> {
            Ok(Vec::new())
        }

        async fn availability_by_medication(&self, _id: i64) -> ApiResult<Vec<Availability>> {
            Ok(Vec::new())
        }

        async fn create_pickup_batch(
            &self,
            _requests: &[PickupRequest],
        ) -> ApiResult<Vec<PickupRecord>> {
            Err(ApiError::Internal("not used".to_string()))
        }
    }

    #[test]
    fn structural_events_translate_to_refresh() {
        let event = ServerEvent::parse("stock_ajustado", json!({})).unwrap();
        assert!(matches!(
            SyncSignal::from_event(event),
            Some(SyncSignal::Refresh { .. })
        ));

        let event = ServerEvent::parse("favorito_agregado", json!({})).unwrap();
        assert!(matches!(
            SyncSignal::from_event(event),
            Some(SyncSignal::FavoritesChanged)
        ));

        let event = ServerEvent::parse("error", json!({"detail": "x"})).unwrap();
        assert!(SyncSignal::from_event(event).is_none());
    }

    #[tokio::test]
    async fn refresh_reloads_stale_cache() {
        let store = Arc::new(Mutex::new(AvailabilityStore::new()));
        let driver = RefreshDriver::new(store.clone(), CountingBackend::default());

        driver
            .handle(SyncSignal::Refresh {
                received_at: Utc::now(),
            })
            .await;

        assert_eq!(driver.backend.loads.load(Ordering::SeqCst), 1);
        assert!(store.lock().await.loaded_at().is_some());
    }

    #[tokio::test]
    async fn refresh_skips_push_older_than_cache() {
        let store = Arc::new(Mutex::new(AvailabilityStore::from_parts(
            Vec::new(),
            Vec::new(),
        )));
        let driver = RefreshDriver::new(store.clone(), CountingBackend::default());

        // push observed before the cache was (re)loaded: last write wins
        driver
            .handle(SyncSignal::Refresh {
                received_at: Utc::now() - Duration::minutes(5),
            })
            .await;

        assert_eq!(driver.backend.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn low_stock_alert_is_forwarded() {
        let store = Arc::new(Mutex::new(AvailabilityStore::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = RefreshDriver::new(store, CountingBackend::default()).with_alerts(tx);

        let alert: LowStockAlert = serde_json::from_value(json!({
            "disponibilidad_id": 4,
            "medicamento": "Amoxicilina",
            "sede": "Sede Centro",
            "stock_actual": 2,
            "criticidad": "alta"
        }))
        .unwrap();

        driver.handle(SyncSignal::LowStock(alert.clone())).await;

        assert_eq!(rx.recv().await.unwrap(), alert);
    }
}
