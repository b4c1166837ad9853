//! Fixed-size worker pool for spike delivery
//!
//! A FIFO task queue drained by a fixed set of worker threads. Each
//! submission returns a [`TaskHandle`] future that resolves when the
//! task finishes. Shutdown drains the queue, then joins every worker.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Receiver};
use parking_lot::{Condvar, Mutex};

use crate::error::{Result, RuntimeError};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolQueue {
    tasks: VecDeque<Job>,
    stop: bool,
}

struct PoolShared {
    queue: Mutex<PoolQueue>,
    condvar: Condvar,
}

/// Completion future for a task submitted to the pool
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<std::thread::Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task completes and return its result
    ///
    /// Fails with [`RuntimeError::TaskFailed`] when the task panicked or
    /// the pool was torn down before running it.
    pub fn wait(self) -> Result<T> {
        match self.receiver.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(RuntimeError::task_failed("task panicked")),
            Err(_) => Err(RuntimeError::task_failed("task was dropped before running")),
        }
    }
}

/// Fixed set of worker threads draining a FIFO task queue
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Create a pool with `num_threads` workers (at least one)
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        log::info!("Creating worker pool with {} threads", num_threads);

        let shared = Arc::new(PoolShared {
            queue: Mutex::new(PoolQueue {
                tasks: VecDeque::new(),
                stop: false,
            }),
            condvar: Condvar::new(),
        });

        let workers = (0..num_threads)
            .map(|index| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("synfire-worker-{}", index))
                    .spawn(move || worker_loop(index, shared))
                    .unwrap_or_else(|e| panic!("failed to spawn worker thread: {}", e))
            })
            .collect();

        Self { shared, workers }
    }

    /// Submit a task and receive a completion future
    ///
    /// Tasks must not rely on ordering relative to other tasks. Enqueue
    /// on a stopped pool fails with [`RuntimeError::PoolStopped`].
    pub fn enqueue<F, T>(&self, task: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = bounded(1);
        let job: Job = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(task));
            // The receiver may be gone; delivery is best-effort
            let _ = sender.send(result);
        });

        {
            let mut queue = self.shared.queue.lock();
            if queue.stop {
                return Err(RuntimeError::PoolStopped);
            }
            queue.tasks.push_back(job);
        }
        self.shared.condvar.notify_one();

        Ok(TaskHandle { receiver })
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Number of tasks waiting to be executed
    pub fn pending_tasks(&self) -> usize {
        self.shared.queue.lock().tasks.len()
    }

    /// Whether the pool has been stopped
    pub fn is_stopped(&self) -> bool {
        self.shared.queue.lock().stop
    }

    /// Stop accepting tasks, drain the queue, and join every worker
    pub fn shutdown(&mut self) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.stop {
                return;
            }
            queue.stop = true;
        }
        self.shared.condvar.notify_all();

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        log::info!("Worker pool shutdown complete");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.workers.len())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

fn worker_loop(index: usize, shared: Arc<PoolShared>) {
    log::debug!("Worker thread {} started", index);
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(job) = queue.tasks.pop_front() {
                    break job;
                }
                if queue.stop {
                    log::debug!("Worker thread {} stopping", index);
                    return;
                }
                shared.condvar.wait(&mut queue);
            }
        };
        // Panics are contained inside the job's catch_unwind
        job();
    }
}
