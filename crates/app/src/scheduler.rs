//! Door scheduler. Keeps the entry door in the state the opening hours (or
//! a manual overwrite) ask for.
//!
//! A single background task owns every transition. Callers talk to it over a
//! bounded channel and only get an answer once the task has taken their
//! request; readers ([`DoorScheduler::current`]) see a consistent snapshot
//! without waiting on the loop.

mod config;
mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use portier_domain::door::{DoorState, DoorStatus, StateOverwrite};
use portier_domain::error::{PortierError, SchedulerError};
use portier_domain::time::Timestamp;

pub use config::SchedulerConfig;

use crate::ports::{Clock, DoorActuator, HolidayProvider, SystemClock};
use crate::resolver::OpeningHoursResolver;
use worker::{Envelope, Request, Worker};

/// State shared between the handle and the loop. Only the loop writes.
struct Shared<D, H> {
    door: D,
    resolver: RwLock<Arc<OpeningHoursResolver<H>>>,
    overwrite: Mutex<Option<StateOverwrite>>,
    reset_in_progress: AtomicBool,
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
}

impl<D, H: HolidayProvider> Shared<D, H> {
    fn resolver(&self) -> Arc<OpeningHoursResolver<H>> {
        Arc::clone(&self.resolver.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn replace_resolver(
        &self,
        resolver: Arc<OpeningHoursResolver<H>>,
    ) -> Arc<OpeningHoursResolver<H>> {
        let mut guard = self.resolver.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, resolver)
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn overwrite(&self) -> Option<StateOverwrite> {
        self.overwrite
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_overwrite(&self, overwrite: Option<StateOverwrite>) -> Option<StateOverwrite> {
        let mut guard = self.overwrite.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, overwrite)
    }

    /// What the door should be at `at`: an active overwrite wins over the schedule.
    fn status_at(&self, at: Timestamp) -> DoorStatus {
        let overwrite = self.overwrite().filter(|overwrite| overwrite.is_active_at(at));
        let (state, valid_until) = match &overwrite {
            Some(overwrite) => (overwrite.state, Some(overwrite.until)),
            None => {
                let resolved = self.resolver().state_for(at);
                (resolved.state, resolved.valid_until)
            }
        };
        DoorStatus {
            state,
            valid_until,
            reset_in_progress: self.reset_in_progress.load(Ordering::SeqCst),
            overwrite,
        }
    }
}

/// Handle on the door scheduling loop.
///
/// Construct with [`DoorScheduler::new`], then [`start`](Self::start) it once
/// inside a tokio runtime. Every mutating call is handed to the loop and
/// fails with [`SchedulerError::Stopped`] or
/// [`SchedulerError::RequestTimedOut`] without any effect if the loop does not
/// take it.
pub struct DoorScheduler<D, H> {
    shared: Arc<Shared<D, H>>,
    requests: mpsc::Sender<Envelope<H>>,
    shutdown: watch::Sender<bool>,
    /// Flips to `true` (or closes) once the loop has exited.
    exited: watch::Receiver<bool>,
    pending: Mutex<Option<Pending<H>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// What the loop takes over when it is started.
struct Pending<H> {
    requests: mpsc::Receiver<Envelope<H>>,
    exited: watch::Sender<bool>,
}

impl<D, H> DoorScheduler<D, H>
where
    D: DoorActuator + 'static,
    H: HolidayProvider + 'static,
{
    pub fn new(door: D, resolver: OpeningHoursResolver<H>, config: SchedulerConfig) -> Self {
        Self::with_clock(door, resolver, config, SystemClock)
    }

    /// Like [`new`](Self::new), but every decision of the loop is taken at
    /// the time reported by `clock`.
    pub fn with_clock(
        door: D,
        resolver: OpeningHoursResolver<H>,
        config: SchedulerConfig,
        clock: impl Clock + 'static,
    ) -> Self {
        let (requests, pending) = mpsc::channel(1);
        let (shutdown, _) = watch::channel(false);
        let (exited_tx, exited) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                door,
                resolver: RwLock::new(Arc::new(resolver)),
                overwrite: Mutex::new(None),
                reset_in_progress: AtomicBool::new(false),
                config,
                clock: Arc::new(clock),
            }),
            requests,
            shutdown,
            exited,
            pending: Mutex::new(Some(Pending {
                requests: pending,
                exited: exited_tx,
            })),
            task: Mutex::new(None),
        }
    }

    /// Spawn the scheduling loop on the current tokio runtime.
    ///
    /// The desired state is applied right away.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyStarted`] on every call but the first,
    /// and [`SchedulerError::Stopped`] if the scheduler was stopped before it
    /// ever ran.
    pub fn start(&self) -> Result<(), SchedulerError> {
        if *self.shutdown.borrow() {
            return Err(SchedulerError::Stopped);
        }
        let Some(Pending { requests, exited }) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return Err(SchedulerError::AlreadyStarted);
        };

        let worker = Worker::new(
            Arc::clone(&self.shared),
            requests,
            self.shutdown.subscribe(),
            exited,
        );
        let handle = tokio::spawn(worker.run());
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Stop the loop and wait until it has exited.
    ///
    /// A command or hard reset already in progress finishes first; no
    /// command is sent afterwards. Concurrent and repeated calls all wait for
    /// the same exit.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "door scheduler task failed");
            }
        }

        let never_started = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if never_started {
            return;
        }
        let mut exited = self.exited.clone();
        // closed when the task died without flagging its exit
        if exited.wait_for(|exited| *exited).await.is_err() {
            tracing::debug!("door scheduler task ended without signalling exit");
        }
    }

    /// Force the door into `state` until `until`, regardless of the schedule.
    ///
    /// The loop re-applies the desired state immediately with a fresh retry
    /// budget.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Stopped`] or [`SchedulerError::RequestTimedOut`]
    /// if the loop did not take the request; nothing changed in that case.
    pub async fn overwrite(
        &self,
        state: DoorState,
        until: Timestamp,
        issued_by: impl Into<String>,
    ) -> Result<(), SchedulerError> {
        let overwrite = StateOverwrite {
            state,
            until,
            issued_by: issued_by.into(),
        };
        self.hand_off(Request::Overwrite(overwrite)).await
    }

    /// Recompute and re-send the desired state right away (soft reset).
    ///
    /// # Errors
    ///
    /// Same as [`overwrite`](Self::overwrite).
    pub async fn recompute(&self) -> Result<(), SchedulerError> {
        self.hand_off(Request::Recompute).await
    }

    /// Hard reset: clear any overwrite, then cycle the lock
    /// unlock → lock → unlock before applying the desired state again.
    ///
    /// Returns once the loop has taken the request; the cycle itself runs in
    /// the background with `reset_in_progress` set.
    ///
    /// # Errors
    ///
    /// Same as [`overwrite`](Self::overwrite).
    pub async fn reset(&self) -> Result<(), SchedulerError> {
        self.hand_off(Request::HardReset).await
    }

    /// Buzz the door open once. Does not change the desired state.
    ///
    /// # Errors
    ///
    /// Returns [`PortierError::Scheduler`] if the loop did not take the
    /// request or the command timed out, and [`PortierError::Hardware`] if the
    /// door rejected it.
    pub async fn open(&self) -> Result<(), PortierError> {
        let (reply, outcome) = oneshot::channel();
        self.hand_off(Request::Open(reply)).await?;
        outcome.await.map_err(|_| SchedulerError::Stopped)?
    }

    /// Swap the opening hours the loop evaluates, e.g. after a config reload.
    ///
    /// # Errors
    ///
    /// Same as [`overwrite`](Self::overwrite).
    pub async fn replace_resolver(
        &self,
        resolver: OpeningHoursResolver<H>,
    ) -> Result<(), SchedulerError> {
        self.hand_off(Request::Replace(Arc::new(resolver))).await
    }

    /// The opening hours currently in force.
    #[must_use]
    pub fn resolver(&self) -> Arc<OpeningHoursResolver<H>> {
        self.shared.resolver()
    }

    /// Snapshot of the desired state right now.
    #[must_use]
    pub fn current(&self) -> DoorStatus {
        self.status_at(self.shared.now())
    }

    /// Snapshot of the desired state at `at`, given the current overwrite
    /// and opening hours.
    #[must_use]
    pub fn status_at(&self, at: Timestamp) -> DoorStatus {
        self.shared.status_at(at)
    }

    async fn hand_off(&self, request: Request<H>) -> Result<(), SchedulerError> {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow_and_update() {
            return Err(SchedulerError::Stopped);
        }

        let (accepted, mut acceptance) = oneshot::channel();
        let envelope = Envelope { request, accepted };
        let deadline = tokio::time::sleep(self.shared.config.request_timeout);
        tokio::pin!(deadline);

        tokio::select! {
            biased;
            _ = shutdown.wait_for(|stopped| *stopped) => return Err(SchedulerError::Stopped),
            sent = self.requests.send(envelope) => {
                sent.map_err(|_| SchedulerError::Stopped)?;
            }
            () = &mut deadline => return Err(SchedulerError::RequestTimedOut),
        }

        let gave_up = tokio::select! {
            biased;
            accepted = &mut acceptance => {
                return accepted.map_err(|_| SchedulerError::Stopped);
            }
            _ = shutdown.wait_for(|stopped| *stopped) => SchedulerError::Stopped,
            () = &mut deadline => SchedulerError::RequestTimedOut,
        };

        // the loop may have taken the request right before we gave up
        acceptance.close();
        match acceptance.try_recv() {
            Ok(()) => Ok(()),
            Err(_) => Err(gave_up),
        }
    }
}
