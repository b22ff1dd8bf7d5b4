//! Availability store
//!
//! In-memory cache of the medication catalog and every (medication, site)
//! stock row. Refreshed wholesale: a reload replaces the cache only after
//! both backend calls succeed, so a failed fetch never leaves a partial
//! overwrite behind.

use chrono::{DateTime, Utc};

use crate::error::ApiResult;
use crate::http::Backend;
use shared::{Availability, Medication, StockLevel};

/// Latest known stock for every (medication, site) pair.
#[derive(Debug, Default)]
pub struct AvailabilityStore {
    medications: Vec<Medication>,
    rows: Vec<Availability>,
    loaded_at: Option<DateTime<Utc>>,
}

impl AvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pre-populated store without a backend round trip.
    pub fn from_parts(medications: Vec<Medication>, rows: Vec<Availability>) -> Self {
        Self {
            medications,
            rows,
            loaded_at: Some(Utc::now()),
        }
    }

    /// Fetch the full catalog and availability list, replacing the cache.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure; the cache and its timestamp are
    /// left unchanged.
    pub async fn load_all<B: Backend + ?Sized>(&mut self, backend: &B) -> ApiResult<()> {
        let medications = backend.medications().await?;
        let rows = backend.availability().await?;

        self.medications = medications;
        self.rows = rows;
        self.loaded_at = Some(Utc::now());

        tracing::debug!(
            medications = self.medications.len(),
            rows = self.rows.len(),
            "availability cache reloaded"
        );
        Ok(())
    }

    /// Cached medication catalog.
    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn medication(&self, id: i64) -> Option<&Medication> {
        self.medications.iter().find(|m| m.id == id)
    }

    /// All cached stock rows.
    pub fn rows(&self) -> &[Availability] {
        &self.rows
    }

    /// Stock rows for one medication. Restartable: each call yields a
    /// fresh iterator over the current cache.
    pub fn by_medication(&self, medication_id: i64) -> impl Iterator<Item = &Availability> {
        self.rows
            .iter()
            .filter(move |row| row.medication_id == medication_id)
    }

    /// The row reservation validation runs against.
    pub fn find(&self, medication_id: i64, site_id: i64) -> Option<&Availability> {
        self.rows
            .iter()
            .find(|row| row.medication_id == medication_id && row.site_id == site_id)
    }

    /// Total stock across sites. List-level badges only; reservation
    /// validation always uses the site-specific row.
    pub fn aggregate_stock(&self, medication_id: i64) -> u32 {
        self.by_medication(medication_id).map(|row| row.stock).sum()
    }

    /// Severity tier of the aggregate count.
    pub fn level(&self, medication_id: i64) -> StockLevel {
        StockLevel::classify(self.aggregate_stock(medication_id))
    }

    /// When the cache was last replaced.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// True when the cache was loaded after `instant`. Used by the
    /// refresh driver for last-write-wins staleness checks.
    pub fn is_fresher_than(&self, instant: DateTime<Utc>) -> bool {
        self.loaded_at.is_some_and(|at| at > instant)
    }
}
