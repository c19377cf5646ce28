//! The scheduling loop. Sole owner of every state transition.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use portier_domain::door::{DoorCommand, DoorState, StateOverwrite};
use portier_domain::error::{PortierError, SchedulerError};
use portier_domain::time::Timestamp;

use super::Shared;
use crate::ports::{DoorActuator, HolidayProvider};
use crate::resolver::OpeningHoursResolver;

/// Shortest pause between two evaluations. Interval ends are inclusive, so
/// the desired state only flips once the end has passed.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// A request handed from a caller to the loop.
pub(super) enum Request<H> {
    /// Re-evaluate immediately (soft reset).
    Recompute,
    Overwrite(StateOverwrite),
    Replace(Arc<OpeningHoursResolver<H>>),
    HardReset,
    Open(oneshot::Sender<Result<(), PortierError>>),
}

/// A request plus the rendezvous the loop completes once it owns the request.
pub(super) struct Envelope<H> {
    pub request: Request<H>,
    pub accepted: oneshot::Sender<()>,
}

enum Wake<H> {
    Shutdown,
    Closed,
    Request(Envelope<H>),
    Timer,
}

pub(super) struct Worker<D, H> {
    shared: Arc<Shared<D, H>>,
    requests: mpsc::Receiver<Envelope<H>>,
    shutdown: watch::Receiver<bool>,
    exited: watch::Sender<bool>,
    /// State the retry budget is currently spent on. `None` forces a fresh budget.
    target: Option<DoorState>,
    retries: u32,
    max_tries: u32,
    last_applied: Option<DoorState>,
}

impl<D, H> Worker<D, H>
where
    D: DoorActuator,
    H: HolidayProvider,
{
    pub(super) fn new(
        shared: Arc<Shared<D, H>>,
        requests: mpsc::Receiver<Envelope<H>>,
        shutdown: watch::Receiver<bool>,
        exited: watch::Sender<bool>,
    ) -> Self {
        Self {
            shared,
            requests,
            shutdown,
            exited,
            target: None,
            retries: 0,
            max_tries: 0,
            last_applied: None,
        }
    }

    pub(super) async fn run(mut self) {
        tracing::info!("door scheduler started");
        let mut deadline = Instant::now();

        loop {
            if *self.shutdown.borrow_and_update() {
                break;
            }

            let wake = tokio::select! {
                biased;
                changed = self.shutdown.changed() => match changed {
                    Ok(()) => Wake::Shutdown,
                    Err(_) => Wake::Closed,
                },
                envelope = self.requests.recv() => match envelope {
                    Some(envelope) => Wake::Request(envelope),
                    None => Wake::Closed,
                },
                () = tokio::time::sleep_until(deadline) => Wake::Timer,
            };

            match wake {
                // re-checked at the top of the loop
                Wake::Shutdown => continue,
                Wake::Closed => {
                    tracing::debug!("door scheduler handle dropped");
                    break;
                }
                Wake::Request(envelope) => {
                    if !self.handle(envelope).await {
                        continue;
                    }
                    // stop was requested while a reset was running
                    if *self.shutdown.borrow() {
                        continue;
                    }
                }
                Wake::Timer => {}
            }

            deadline = self.tick().await;
        }

        self.exited.send_replace(true);
        tracing::info!("door scheduler stopped");
    }

    /// Apply a request. Returns whether the desired state must be re-applied.
    ///
    /// In-memory effects are installed before the hand-off completes and
    /// rolled back when the caller gave up in the meantime, so a request
    /// either takes effect entirely or not at all.
    async fn handle(&mut self, envelope: Envelope<H>) -> bool {
        let Envelope { request, accepted } = envelope;
        match request {
            Request::Recompute => {
                if accepted.send(()).is_err() {
                    return false;
                }
                tracing::debug!("recomputing desired door state");
            }
            Request::Overwrite(overwrite) => {
                let previous = self.shared.replace_overwrite(Some(overwrite.clone()));
                if accepted.send(()).is_err() {
                    self.shared.replace_overwrite(previous);
                    return false;
                }
                tracing::info!(
                    state = %overwrite.state,
                    until = %overwrite.until,
                    issued_by = %overwrite.issued_by,
                    "door state overwritten"
                );
            }
            Request::Replace(resolver) => {
                let previous = self.shared.replace_resolver(resolver);
                if accepted.send(()).is_err() {
                    self.shared.replace_resolver(previous);
                    return false;
                }
                tracing::info!("opening hours replaced");
            }
            Request::HardReset => {
                self.shared.reset_in_progress.store(true, Ordering::SeqCst);
                let previous = self.shared.replace_overwrite(None);
                if accepted.send(()).is_err() {
                    self.shared.replace_overwrite(previous);
                    self.shared.reset_in_progress.store(false, Ordering::SeqCst);
                    return false;
                }
                if let Some(previous) = previous {
                    tracing::info!(issued_by = %previous.issued_by, "door reset cleared overwrite");
                }
                self.reset_door().await;
            }
            Request::Open(reply) => {
                if accepted.send(()).is_err() {
                    return false;
                }
                let result = self
                    .send(DoorCommand::Open, self.shared.config.command_timeout)
                    .await;
                if let Err(err) = &result {
                    tracing::warn!(error = %err, "failed to open door");
                }
                // the caller may have stopped waiting for the outcome
                let _ = reply.send(result);
                return false;
            }
        }

        self.target = None;
        true
    }

    /// Drive the door into its desired state and return when to wake up next.
    async fn tick(&mut self) -> Instant {
        let now = self.shared.now();
        self.expire_overwrite(now);

        let status = self.shared.status_at(now);
        let state = status.state;

        if self.target != Some(state) {
            self.target = Some(state);
            self.retries = 0;
            self.max_tries = self.shared.config.max_tries(state);
            tracing::debug!(
                %state,
                valid_until = ?status.valid_until,
                max_tries = self.max_tries,
                "desired door state changed"
            );
        }

        if self.retries < self.max_tries {
            self.retries += 1;
            match self
                .send(state.command(), self.shared.config.command_timeout)
                .await
            {
                Ok(()) => {
                    if self.last_applied != Some(state) {
                        tracing::info!(%state, valid_until = ?status.valid_until, "door state applied");
                    }
                    self.last_applied = Some(state);
                }
                Err(err) => {
                    tracing::warn!(
                        %state,
                        attempt = self.retries,
                        max_tries = self.max_tries,
                        error = %err,
                        "failed to set desired door state"
                    );
                    if self.retries == self.max_tries {
                        tracing::error!(
                            %state,
                            "retry budget exhausted, giving up until the desired state changes"
                        );
                    }
                }
            }
        }

        // no known end of the state: look again after the fallback horizon
        let wait = match status.valid_until {
            Some(until) => (until - self.shared.now())
                .to_std()
                .unwrap_or(Duration::ZERO),
            None => self.shared.config.fallback_horizon,
        };
        let wait = wait.min(self.shared.config.resend_interval).max(MIN_WAIT);
        let start = Instant::now();
        start.checked_add(wait).unwrap_or(start)
    }

    fn expire_overwrite(&self, now: Timestamp) {
        let expired = self
            .shared
            .overwrite()
            .is_some_and(|overwrite| !overwrite.is_active_at(now));
        if expired {
            if let Some(overwrite) = self.shared.replace_overwrite(None) {
                tracing::info!(
                    state = %overwrite.state,
                    issued_by = %overwrite.issued_by,
                    "door state overwrite expired"
                );
            }
        }
    }

    /// Power-cycle the lock: unlock, lock, unlock with settle pauses.
    async fn reset_door(&mut self) {
        tracing::info!("resetting door");
        let steps = [DoorCommand::Unlock, DoorCommand::Lock, DoorCommand::Unlock];
        for (index, command) in steps.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.shared.config.reset_settle_delay).await;
            }
            if let Err(err) = self
                .send(command, self.shared.config.reset_command_timeout)
                .await
            {
                tracing::error!(%command, error = %err, "door reset step failed");
            }
        }
        self.shared.reset_in_progress.store(false, Ordering::SeqCst);
        self.last_applied = None;
    }

    async fn send(&self, command: DoorCommand, limit: Duration) -> Result<(), PortierError> {
        match tokio::time::timeout(limit, self.shared.door.send(command)).await {
            Ok(result) => result,
            Err(_) => Err(SchedulerError::CommandTimedOut { command }.into()),
        }
    }
}
