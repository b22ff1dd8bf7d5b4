//! Batch scheduler
//!
//! Terminal state transition from "cart" to "submitted": maps every cart
//! line to one pickup request and issues a single batch-create call,
//! which the backend applies atomically. No automatic retries; a failed
//! submission leaves the cart intact for correction.

use thiserror::Error;

use crate::cart::{CartError, CartManager};
use crate::http::Backend;
use crate::storage::KeyValueStore;
use shared::{PickupRecord, PickupRequest};

/// Scheduler state machine.
///
/// `Empty → Staged → Submitting → {Submitted | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Empty,
    Staged,
    Submitting,
    Submitted,
    Failed,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Cart is empty")]
    EmptyCart,

    /// Lines missing a pickup date or time, by medication name.
    #[error("Missing pickup schedule for: {}", .0.join(", "))]
    IncompleteSchedule(Vec<String>),

    /// Server-side batch failure; the message is server-supplied when
    /// the response carried one.
    #[error("Submission failed: {0}")]
    Submission(String),

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Converts a validated cart into server-side pickup records.
#[derive(Debug, Default)]
pub struct BatchScheduler {
    state: SubmitState,
}

impl BatchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    /// Synchronous precondition check: cart non-empty and every line
    /// fully scheduled. Passing moves the scheduler to `Staged`.
    ///
    /// # Errors
    ///
    /// [`BatchError::EmptyCart`], or [`BatchError::IncompleteSchedule`]
    /// naming the offending lines.
    pub fn stage<S: KeyValueStore>(&mut self, cart: &CartManager<S>) -> Result<(), BatchError> {
        if cart.is_empty() {
            self.state = SubmitState::Empty;
            return Err(BatchError::EmptyCart);
        }

        // a non-empty cart is staged; an incomplete schedule keeps it here
        self.state = SubmitState::Staged;

        let unscheduled: Vec<String> = cart
            .lines()
            .iter()
            .filter(|line| !line.is_scheduled())
            .map(|line| line.medication_name.clone())
            .collect();

        if !unscheduled.is_empty() {
            return Err(BatchError::IncompleteSchedule(unscheduled));
        }

        Ok(())
    }

    /// Submit the cart as one atomic batch on behalf of `user_id`.
    ///
    /// Success clears the cart (and its persisted entry) and ends in
    /// `Submitted`. Failure ends in `Failed` with the cart untouched so
    /// the user can edit or retry.
    pub async fn submit<S, B>(
        &mut self,
        cart: &mut CartManager<S>,
        backend: &B,
        user_id: i64,
    ) -> Result<Vec<PickupRecord>, BatchError>
    where
        S: KeyValueStore,
        B: Backend + ?Sized,
    {
        self.stage(cart)?;

        let requests: Vec<PickupRequest> = cart
            .lines()
            .iter()
            .map(|line| PickupRequest {
                medication_id: line.medication_id,
                user_id,
                site_id: line.site_id,
                pickup_date: line.pickup_date.clone(),
                pickup_time: line.pickup_time.clone(),
                quantity: line.quantity,
            })
            .collect();

        self.state = SubmitState::Submitting;

        match backend.create_pickup_batch(&requests).await {
            Ok(records) => {
                cart.clear()?;
                self.state = SubmitState::Submitted;
                tracing::info!(records = records.len(), "pickup batch submitted");
                Ok(records)
            }
            Err(err) => {
                self.state = SubmitState::Failed;
                let message = err
                    .server_message()
                    .map(String::from)
                    .unwrap_or_else(|| err.to_string());
                tracing::warn!(%message, "pickup batch rejected");
                Err(BatchError::Submission(message))
            }
        }
    }
}
