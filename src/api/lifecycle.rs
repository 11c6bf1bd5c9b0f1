//! Booking lifecycle stepper.
//!
//! Every new booking starts `pending`. Creating it schedules a detached task
//! that sleeps for the configured delay and then writes `completed`
//! unconditionally. Nothing persists the schedule: if the process stops first,
//! the booking stays `pending`.
//!
//! Failures in the task are logged and never reach the client that created
//! the booking, which has already received its response.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{task::AbortHandle, time::sleep};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::store::{BookingStatus, SharedStore};

pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_secs(10);

type PendingTasks = Arc<Mutex<HashMap<Uuid, AbortHandle>>>;

pub struct BookingLifecycle {
    store: SharedStore,
    delay: Duration,
    pending: PendingTasks,
}

impl BookingLifecycle {
    #[must_use]
    pub fn new(store: SharedStore, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Spawn the `pending -> completed` transition for `booking_id`. A
    /// booking has at most one timer: scheduling it again restarts the delay.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_completion(&self, booking_id: Uuid) {
        if self.cancel(booking_id) {
            debug!(booking_id = %booking_id, "replacing earlier completion timer");
        }

        let store = self.store.clone();
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);

        // The lock is held across the spawn so the task cannot deregister
        // itself before its handle is recorded.
        let mut tasks = lock(&self.pending);
        let handle = tokio::spawn(
            async move {
                sleep(delay).await;
                match store
                    .set_booking_status(booking_id, BookingStatus::Completed)
                    .await
                {
                    Ok(true) => info!("booking completed"),
                    Ok(false) => warn!("booking vanished before completion"),
                    Err(err) => warn!("Failed to complete booking: {err:#}"),
                }
                lock(&pending).remove(&booking_id);
            }
            .instrument(info_span!("booking.complete", booking_id = %booking_id)),
        );
        tasks.insert(booking_id, handle.abort_handle());
        debug!(
            booking_id = %booking_id,
            delay_secs = delay.as_secs(),
            "booking completion scheduled"
        );
    }

    /// Abort a scheduled transition. Returns `false` if none was pending.
    pub(crate) fn cancel(&self, booking_id: Uuid) -> bool {
        let Some(handle) = lock(&self.pending).remove(&booking_id) else {
            return false;
        };
        handle.abort();
        true
    }

    #[cfg(test)]
    fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Abort every scheduled transition; affected bookings stay `pending`.
    pub fn shutdown(&self) {
        let drained: Vec<AbortHandle> = lock(&self.pending)
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        if !drained.is_empty() {
            info!(count = drained.len(), "abandoning pending booking completions");
        }
        for handle in drained {
            handle.abort();
        }
    }
}

fn lock(
    pending: &Mutex<HashMap<Uuid, AbortHandle>>,
) -> MutexGuard<'_, HashMap<Uuid, AbortHandle>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
