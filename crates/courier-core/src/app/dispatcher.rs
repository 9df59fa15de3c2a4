//! Dispatcher - the bounded FIFO queue of task ids and the loop draining it.
//!
//! - `enqueue`/`reserve` never block: a full queue is `QueueFull`.
//! - The dispatch loop spawns one executor per dequeued id, optionally
//!   gated by a semaphore (`max_concurrency`).
//! - `stop` signals the loop over a `watch` channel, then waits for every
//!   in-flight executor. Ids still queued at that point are dropped and stay
//!   `pending` in the store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::config::EngineConfig;
use crate::domain::{CourierError, TaskId};

use super::executor::TaskExecutor;

pub struct Dispatcher {
    capacity: usize,
    max_concurrency: Option<usize>,
    sender: mpsc::Sender<TaskId>,
    // taken by `start`; still here means the loop never ran
    receiver: Mutex<Option<mpsc::Receiver<TaskId>>>,
    executor: Arc<TaskExecutor>,
    in_flight: Arc<AtomicUsize>,
    shutdown_tx: watch::Sender<bool>,
    dispatch_loop: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

/// A queue slot held before the id exists, so a record is only created once
/// there is room to dispatch it.
pub struct EnqueueSlot<'a> {
    permit: mpsc::Permit<'a, TaskId>,
}

impl EnqueueSlot<'_> {
    pub fn send(self, task_id: TaskId) {
        self.permit.send(task_id);
    }
}

impl Dispatcher {
    pub fn new(config: &EngineConfig, executor: Arc<TaskExecutor>) -> Self {
        let capacity = config.queue_capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            capacity,
            max_concurrency: config.max_concurrency,
            sender,
            receiver: Mutex::new(Some(receiver)),
            executor,
            in_flight: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
            dispatch_loop: tokio::sync::Mutex::new(None),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ids waiting in the queue.
    pub fn queued(&self) -> usize {
        self.capacity.saturating_sub(self.sender.capacity())
    }

    /// Executors currently processing a task.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub fn enqueue(&self, task_id: TaskId) -> Result<(), CourierError> {
        if self.is_stopped() {
            return Err(CourierError::EngineStopped);
        }
        self.sender.try_send(task_id).map_err(|err| match err {
            TrySendError::Full(_) => CourierError::QueueFull {
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => CourierError::EngineStopped,
        })
    }

    pub fn reserve(&self) -> Result<EnqueueSlot<'_>, CourierError> {
        if self.is_stopped() {
            return Err(CourierError::EngineStopped);
        }
        match self.sender.try_reserve() {
            Ok(permit) => Ok(EnqueueSlot { permit }),
            Err(TrySendError::Full(())) => Err(CourierError::QueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Closed(())) => Err(CourierError::EngineStopped),
        }
    }

    /// Spawn the dispatch loop. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), CourierError> {
        if self.is_stopped() {
            return Err(CourierError::EngineStopped);
        }
        // held by a concurrent `stop`
        let mut slot = self
            .dispatch_loop
            .try_lock()
            .map_err(|_| CourierError::EngineStopped)?;
        let receiver = self
            .receiver
            .lock()
            .take()
            .ok_or(CourierError::AlreadyStarted)?;

        let dispatch_loop = DispatchLoop {
            receiver,
            shutdown_rx: self.shutdown_tx.subscribe(),
            executor: Arc::clone(&self.executor),
            limiter: self.max_concurrency.map(|n| Arc::new(Semaphore::new(n))),
            in_flight: Arc::clone(&self.in_flight),
            executors: JoinSet::new(),
        };
        *slot = Some(tokio::spawn(dispatch_loop.run()));

        tracing::info!(
            capacity = self.capacity,
            max_concurrency = ?self.max_concurrency,
            "dispatch engine started"
        );
        Ok(())
    }

    /// Stop accepting work and wait for in-flight executors. Idempotent.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let never_started = self.receiver.lock().take();
        if let Some(mut receiver) = never_started {
            let abandoned = close_and_drain(&mut receiver);
            if abandoned > 0 {
                tracing::warn!(abandoned, "engine stopped before start; queued tasks stay pending");
            }
        }

        let mut slot = self.dispatch_loop.lock().await;
        if let Some(handle) = slot.take() {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "dispatch loop terminated abnormally");
            }
            tracing::info!("dispatch engine stopped");
        }
    }
}

/// Close the queue and count the ids left in it.
fn close_and_drain(receiver: &mut mpsc::Receiver<TaskId>) -> usize {
    receiver.close();
    let mut abandoned = 0;
    while receiver.try_recv().is_ok() {
        abandoned += 1;
    }
    abandoned
}

struct DispatchLoop {
    receiver: mpsc::Receiver<TaskId>,
    shutdown_rx: watch::Receiver<bool>,
    executor: Arc<TaskExecutor>,
    limiter: Option<Arc<Semaphore>>,
    in_flight: Arc<AtomicUsize>,
    executors: JoinSet<()>,
}

enum Step {
    Shutdown,
    Dispatch(TaskId),
    Reaped(Result<(), JoinError>),
}

impl DispatchLoop {
    async fn run(mut self) {
        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            // wait for an executor slot before taking the next id
            let permit = match self.limiter.clone() {
                Some(limiter) => tokio::select! {
                    _ = self.shutdown_rx.changed() => break,
                    permit = limiter.acquire_owned() => match permit {
                        Ok(permit) => Some(permit),
                        Err(_) => break,
                    },
                },
                None => None,
            };

            let has_executors = !self.executors.is_empty();
            let step = tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => Step::Shutdown,
                Some(joined) = self.executors.join_next(), if has_executors => Step::Reaped(joined),
                next = self.receiver.recv() => match next {
                    Some(task_id) => Step::Dispatch(task_id),
                    None => Step::Shutdown,
                },
            };

            match step {
                Step::Shutdown => break,
                Step::Dispatch(task_id) => self.spawn_executor(task_id, permit),
                Step::Reaped(joined) => Self::reap(joined),
            }
        }

        let abandoned = close_and_drain(&mut self.receiver);
        if abandoned > 0 {
            tracing::warn!(abandoned, "engine stopping; queued tasks stay pending");
        }

        tracing::debug!(in_flight = self.executors.len(), "waiting for in-flight executors");
        while let Some(joined) = self.executors.join_next().await {
            Self::reap(joined);
        }
    }

    fn spawn_executor(&mut self, task_id: TaskId, permit: Option<OwnedSemaphorePermit>) {
        let executor = Arc::clone(&self.executor);
        let guard = InFlight::enter(&self.in_flight);
        self.executors.spawn(async move {
            let _guard = guard;
            let _permit = permit;
            executor.process(task_id).await;
        });
    }

    fn reap(joined: Result<(), JoinError>) {
        if let Err(err) = joined {
            if err.is_panic() {
                tracing::error!(error = %err, "executor panicked");
            } else {
                tracing::warn!(error = %err, "executor cancelled");
            }
        }
    }
}

/// Counts an executor as in flight until dropped.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
