//! Fixed-size thread pool for reaction-engine calls.
//!
//! Workers share one task channel and one result channel. Each submitted job
//! produces exactly one result message, or `None` when the job panicked.
//! Results carry the batch number they were submitted under so that late
//! arrivals from an abandoned collection are discarded.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex,
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, error, warn};

type Job<R> = Box<dyn FnOnce() -> R + Send + 'static>;

enum Message<R> {
    Run { batch: u64, job: Job<R> },
    Stop,
}

/// Results drained for one batch.
#[derive(Debug)]
pub struct Collected<R> {
    /// One entry per job that reported back; `None` marks a panicked job.
    pub results: Vec<Option<R>>,
    /// Jobs that had not reported when collection gave up.
    pub missing: usize,
}

pub struct WorkerPool<R: Send + 'static> {
    task_tx: Sender<Message<R>>,
    result_rx: Receiver<(u64, Option<R>)>,
    handles: Vec<JoinHandle<()>>,
    batch: u64,
    pending: usize,
}

impl<R: Send + 'static> WorkerPool<R> {
    /// Spawn `size` workers (at least one).
    pub fn new(size: usize) -> std::io::Result<Self> {
        let (task_tx, task_rx) = mpsc::channel::<Message<R>>();
        let (result_tx, result_rx) = mpsc::channel();
        let task_rx = Arc::new(Mutex::new(task_rx));

        let mut handles = Vec::with_capacity(size.max(1));
        for worker_id in 0..size.max(1) {
            let task_rx = Arc::clone(&task_rx);
            let result_tx = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("retrotree-worker-{worker_id}"))
                .spawn(move || run_worker(worker_id, task_rx, result_tx))?;
            handles.push(handle);
        }
        debug!(workers = handles.len(), "worker pool started");

        Ok(WorkerPool {
            task_tx,
            result_rx,
            handles,
            batch: 0,
            pending: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Start a new batch; results of earlier batches will be ignored from now on.
    pub fn begin_batch(&mut self) {
        self.batch += 1;
        self.pending = 0;
    }

    /// Queue one job in the current batch.
    pub fn submit<F>(&mut self, job: F) -> bool
    where
        F: FnOnce() -> R + Send + 'static,
    {
        let sent = self
            .task_tx
            .send(Message::Run {
                batch: self.batch,
                job: Box::new(job),
            })
            .is_ok();
        if sent {
            self.pending += 1;
        } else {
            error!("task channel closed, job dropped");
        }
        sent
    }

    /// Jobs submitted in the current batch and not yet collected.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Drain the current batch. Each wait is bounded by `timeout`; a timeout or a
    /// closed channel ends collection early and reports the shortfall.
    pub fn collect(&mut self, timeout: Duration) -> Collected<R> {
        let mut results = Vec::with_capacity(self.pending);
        while self.pending > 0 {
            let started = Instant::now();
            match self.result_rx.recv_timeout(timeout) {
                Ok((batch, result)) if batch == self.batch => {
                    self.pending -= 1;
                    results.push(result);
                }
                Ok((batch, _)) => {
                    debug!(batch, current = self.batch, "discarding stale result");
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        missing = self.pending,
                        waited_ms = started.elapsed().as_millis() as u64,
                        "timed out waiting for worker results"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    error!(missing = self.pending, "result channel disconnected");
                    break;
                }
            }
        }

        let missing = self.pending;
        self.pending = 0;
        Collected { results, missing }
    }

    /// Stop every worker and wait for them to exit.
    pub fn shutdown(mut self) {
        self.stop_workers();
    }

    fn stop_workers(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        for _ in 0..self.handles.len() {
            let _ = self.task_tx.send(Message::Stop);
        }
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("worker thread exited abnormally");
            }
        }
        debug!("worker pool stopped");
    }
}

impl<R: Send + 'static> Drop for WorkerPool<R> {
    fn drop(&mut self) {
        self.stop_workers();
    }
}

fn run_worker<R: Send + 'static>(
    worker_id: usize,
    task_rx: Arc<Mutex<Receiver<Message<R>>>>,
    result_tx: Sender<(u64, Option<R>)>,
) {
    loop {
        let message = {
            let Ok(receiver) = task_rx.lock() else {
                error!(worker_id, "task queue lock poisoned");
                return;
            };
            match receiver.recv() {
                Ok(message) => message,
                Err(_) => return,
            }
        };

        match message {
            Message::Stop => return,
            Message::Run { batch, job } => {
                let result = match panic::catch_unwind(AssertUnwindSafe(job)) {
                    Ok(result) => Some(result),
                    Err(_) => {
                        error!(worker_id, "task panicked");
                        None
                    }
                };
                if result_tx.send((batch, result)).is_err() {
                    return;
                }
            }
        }
    }
}
