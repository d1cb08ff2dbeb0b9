//! Watch sessions: an initial resolution followed by periodic re-reads of the
//! file-backed fields.

use std::sync::Arc;
use std::time::Duration;

use fieldwise_core::{Configurable, Result, Update};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::controller::{Controller, Outcome};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Stops a watch session.
///
/// Once [`release`](Self::release) returns, the record is no longer mutated
/// and no further updates are sent. Dropping the handle cancels the session
/// without waiting for the poller to wind down.
#[derive(Debug)]
pub struct WatchHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Cancel the session and wait for the poller to exit. A send blocked on
    /// a full subscriber channel is abandoned.
    pub async fn release(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "watch task ended abnormally");
            }
        }
    }

    pub fn is_released(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Controller {
    /// Resolve `record` and keep its file-backed fields up to date.
    ///
    /// The initial pass writes the record before this returns. Its updates
    /// are delivered to `subscribers` (and any added with
    /// [`Controller::subscribe`]) by the session task ahead of the first poll,
    /// so a subscriber that is not read yet cannot stall the caller. Each poll
    /// holds the record's lock while fields are written and releases it
    /// before notifying. Must be called from within a tokio runtime.
    pub async fn watch<T>(
        mut self,
        record: Arc<Mutex<T>>,
        subscribers: Vec<mpsc::Sender<Update>>,
    ) -> Result<WatchHandle>
    where
        T: Configurable + Send + 'static,
    {
        self.subscribers.extend(subscribers);
        let initial = self.pick(&mut *record.lock())?;

        let cancel = CancellationToken::new();
        if self.options().debug >= 1 {
            info!(
                session = %self,
                files = self.watched_files().len(),
                interval = ?self.options().poll_interval,
                "watch session started"
            );
        }

        let task = tokio::spawn(poll(self, record, initial, cancel.clone()));
        Ok(WatchHandle {
            cancel,
            task: Some(task),
        })
    }
}

async fn poll<T>(
    mut controller: Controller,
    record: Arc<Mutex<T>>,
    initial: Outcome,
    cancel: CancellationToken,
) where
    T: Configurable + Send + 'static,
{
    if !controller.notify(&initial.updates, &cancel).await {
        return;
    }

    let mut ticker = tokio::time::interval(controller.options().poll_interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = poll_once(&controller, &record);
        if outcome.changed() && !controller.notify(&outcome.updates, &cancel).await {
            break;
        }
    }

    if controller.options().debug >= 1 {
        info!("watch session released");
    }
}

fn poll_once<T: Configurable>(controller: &Controller, record: &Mutex<T>) -> Outcome {
    let mut guard = record.lock();
    controller.read_files(&mut *guard)
}
