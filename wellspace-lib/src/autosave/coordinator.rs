//! Debounced background persistence

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::AutoSaveConfig;
use super::AutoSaveStatus;
use super::SaveOutcome;
use crate::error::Error;
use crate::notice::Notice;
use crate::notice::Notifier;

const SAVED_MESSAGE: &str = "Changes saved automatically";
const FAILED_MESSAGE: &str = "Auto-save failed. Please save manually.";

/// Where auto-saved snapshots go.
#[async_trait]
pub trait AutoSaveTarget<T>: Send + Sync {
    /// Persists one snapshot.
    async fn persist(&self, data: T) -> Result<(), Error>;
}

struct CoordinatorState<T> {
    // Latest snapshot waiting for the debounce timer.
    pending: Option<T>,
    timer: Option<JoinHandle<()>>,
    // Identifies the current timer; a timer that lost a race with `save`
    // sees a newer generation and leaves the state alone.
    timer_gen: u64,
    cooldown: Option<JoinHandle<()>>,
    // Snapshot waiting for the persist slot, tagged with its sequence number.
    queued: Option<(u64, T)>,
    next_seq: u64,
    last_saved: Option<DateTime<Utc>>,
}

impl<T> CoordinatorState<T> {
    fn cancel_timer(&mut self) {
        self.pending = None;
        self.timer_gen += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Inner<T> {
    config: AutoSaveConfig,
    target: Arc<dyn AutoSaveTarget<T>>,
    notifier: Option<Arc<dyn Notifier>>,
    alive: CancellationToken,
    status: watch::Sender<AutoSaveStatus>,
    state: Mutex<CoordinatorState<T>>,
    persist_lock: tokio::sync::Mutex<()>,
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, CoordinatorState<T>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn is_alive(&self) -> bool {
        !self.alive.is_cancelled()
    }

    fn set_status(&self, status: AutoSaveStatus) {
        self.status.send_replace(status);
    }

    fn notify(&self, notice: Notice) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(notice);
        }
    }

    fn cancel_timer(&self) {
        self.lock().cancel_timer();
    }
}

/// Debounces snapshots and persists the latest one in the background.
///
/// - `save` replaces the scheduled snapshot and restarts the timer.
/// - `manual_save` cancels the timer and persists at once.
/// - Persistence is serialized: at most one call to the target is in flight,
///   and a snapshot that is replaced while waiting is dropped.
/// - Failures move to [`AutoSaveStatus::Error`] and are never retried.
/// - After [`teardown`](Self::teardown), or drop, nothing is persisted and
///   the status no longer changes.
///
/// # Example
///
/// ```ignore
/// let autosave = AutoSaveCoordinator::new(AutoSaveConfig::default(), target);
/// autosave.save(draft.clone());
/// let mut status = autosave.subscribe();
/// status.changed().await?;
/// ```
pub struct AutoSaveCoordinator<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> AutoSaveCoordinator<T> {
    /// Creates a coordinator persisting to `target`.
    pub fn new(config: AutoSaveConfig, target: Arc<dyn AutoSaveTarget<T>>) -> Self {
        Self::build(config, target, None)
    }

    /// Creates a coordinator that also reports results to `notifier`.
    pub fn with_notifier(
        config: AutoSaveConfig,
        target: Arc<dyn AutoSaveTarget<T>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::build(config, target, Some(notifier))
    }

    fn build(
        config: AutoSaveConfig,
        target: Arc<dyn AutoSaveTarget<T>>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let (status, _) = watch::channel(AutoSaveStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                config,
                target,
                notifier,
                alive: CancellationToken::new(),
                status,
                state: Mutex::new(CoordinatorState {
                    pending: None,
                    timer: None,
                    timer_gen: 0,
                    cooldown: None,
                    queued: None,
                    next_seq: 0,
                    last_saved: None,
                }),
                persist_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Current status.
    pub fn status(&self) -> AutoSaveStatus {
        *self.inner.status.borrow()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<AutoSaveStatus> {
        self.inner.status.subscribe()
    }

    /// When the last successful save completed.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_saved
    }

    /// `true` while a debounce timer is running.
    pub fn has_pending(&self) -> bool {
        self.inner.lock().timer.is_some()
    }

    /// `true` while a persistence call is in flight.
    pub fn is_saving(&self) -> bool {
        self.status() == AutoSaveStatus::Saving
    }

    /// `true` until [`teardown`](Self::teardown).
    pub fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    /// Schedules `data` to be persisted after the configured quiet period.
    ///
    /// Replaces any snapshot already scheduled. Does nothing when disabled,
    /// torn down, or outside a tokio runtime.
    pub fn save(&self, data: T) {
        if !self.inner.config.enabled || !self.inner.is_alive() {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            log::warn!("Auto-save skipped: no async runtime");
            return;
        };

        let mut state = self.inner.lock();
        state.cancel_timer();
        state.pending = Some(data);
        let generation = state.timer_gen;

        let inner = Arc::clone(&self.inner);
        state.timer = Some(handle.spawn(async move {
            tokio::time::sleep(inner.config.delay).await;
            let data = {
                let mut state = inner.lock();
                if state.timer_gen != generation {
                    return;
                }
                state.timer = None;
                state.pending.take()
            };
            if let Some(data) = data {
                log::debug!("Auto-save timer fired");
                let _ = perform(&inner, data).await;
            }
        }));
    }

    /// Cancels any scheduled save and persists `data` now.
    ///
    /// Waits for an in-flight save to finish first. Returns the error if
    /// the target fails; the status still moves to `Error`.
    pub async fn manual_save(&self, data: T) -> Result<SaveOutcome, Error> {
        self.inner.cancel_timer();
        perform(&self.inner, data).await
    }

    /// Runs `fut` while holding the persist slot.
    ///
    /// Cancels the scheduled save and drops any snapshot waiting for the
    /// slot, so an explicit save never races an auto-save of the same record.
    pub async fn exclusive<F, R>(&self, fut: F) -> R
    where
        F: Future<Output = R>,
    {
        {
            let mut state = self.inner.lock();
            state.cancel_timer();
            state.queued = None;
        }
        let _slot = self.inner.persist_lock.lock().await;
        fut.await
    }

    /// Stops all activity. Idempotent.
    ///
    /// A save already in flight is not interrupted, but its result is
    /// ignored.
    pub fn teardown(&self) {
        if !self.inner.is_alive() {
            return;
        }
        self.inner.alive.cancel();
        let mut state = self.inner.lock();
        state.cancel_timer();
        state.queued = None;
        if let Some(cooldown) = state.cooldown.take() {
            cooldown.abort();
        }
        log::debug!("Auto-save torn down");
    }
}

impl<T> Drop for AutoSaveCoordinator<T> {
    fn drop(&mut self) {
        self.inner.alive.cancel();
        let mut state = self.inner.lock();
        state.cancel_timer();
        if let Some(cooldown) = state.cooldown.take() {
            cooldown.abort();
        }
    }
}

async fn perform<T: Send + 'static>(inner: &Arc<Inner<T>>, data: T) -> Result<SaveOutcome, Error> {
    if !inner.is_alive() {
        return Ok(SaveOutcome::Cancelled);
    }

    let seq = {
        let mut state = inner.lock();
        state.next_seq += 1;
        let seq = state.next_seq;
        state.queued = Some((seq, data));
        seq
    };

    let _slot = inner.persist_lock.lock().await;
    if !inner.is_alive() {
        return Ok(SaveOutcome::Cancelled);
    }

    let data = {
        let mut state = inner.lock();
        match state.queued.take() {
            Some((queued_seq, data)) if queued_seq == seq => {
                if let Some(cooldown) = state.cooldown.take() {
                    cooldown.abort();
                }
                data
            }
            newer => {
                state.queued = newer;
                log::debug!("Auto-save payload superseded");
                return Ok(SaveOutcome::Superseded);
            }
        }
    };

    inner.set_status(AutoSaveStatus::Saving);
    let result = inner.target.persist(data).await;

    if !inner.is_alive() {
        return Ok(SaveOutcome::Cancelled);
    }

    match result {
        Ok(()) => {
            let at = Utc::now();
            inner.lock().last_saved = Some(at);
            inner.set_status(AutoSaveStatus::Saved);
            inner.notify(Notice::success(SAVED_MESSAGE));
            log::debug!("Auto-save persisted");
            schedule_cooldown(inner, AutoSaveStatus::Saved, inner.config.saved_cooldown);
            Ok(SaveOutcome::Saved { at })
        }
        Err(err) => {
            log::warn!("Auto-save failed: {err}");
            inner.set_status(AutoSaveStatus::Error);
            inner.notify(Notice::error(FAILED_MESSAGE));
            schedule_cooldown(inner, AutoSaveStatus::Error, inner.config.error_cooldown);
            Err(err)
        }
    }
}

fn schedule_cooldown<T: Send + 'static>(inner: &Arc<Inner<T>>, from: AutoSaveStatus, after: Duration) {
    let task_inner = Arc::clone(inner);
    let task = tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if task_inner.is_alive() {
            task_inner.status.send_if_modified(|status| {
                if *status == from {
                    *status = AutoSaveStatus::Idle;
                    true
                } else {
                    false
                }
            });
        }
    });
    if let Some(old) = inner.lock().cooldown.replace(task) {
        old.abort();
    }
}
