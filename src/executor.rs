//! Serial background executor.
//!
//! [`SerialExecutor`] runs submitted closures one at a time, in submission order, on a single
//! dedicated thread. Producers on any thread hand work over through a channel; the worker is its
//! only consumer and blocks while the queue is empty.
//!
//! ```
//! use ble_session::executor::SerialExecutor;
//! use std::sync::mpsc;
//!
//! let executor = SerialExecutor::new(Some("example")).unwrap();
//! let (tx, rx) = mpsc::channel();
//! for i in 0..3 {
//!     let tx = tx.clone();
//!     executor.submit(move || tx.send(i).unwrap()).unwrap();
//! }
//! executor.join();
//! assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
//! ```

use log::*;
use static_assertions::assert_impl_all;
use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};

use crate::error::SubmitError;
use crate::util::lock;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Receives panics raised by tasks. Called on the worker thread.
pub type PanicHandler = Arc<dyn Fn(TaskPanic) + Send + Sync>;

/// A task that panicked instead of returning.
#[derive(Clone, Debug)]
pub struct TaskPanic {
    executor: String,
    message: String,
}

impl TaskPanic {
    /// Label of the executor the task ran on.
    pub fn executor(&self) -> &str {
        &self.executor
    }

    /// Panic message, if the payload was a string.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TaskPanic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "task on {} panicked: {}", self.executor, self.message)
    }
}

pub struct SerialExecutorBuilder {
    name: Option<String>,
    panic_handler: Option<PanicHandler>,
}

impl SerialExecutorBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            panic_handler: None,
        }
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the default handler, which logs the panic at `error` level.
    pub fn panic_handler(&mut self, f: impl Fn(TaskPanic) + Send + Sync + 'static) -> &mut Self {
        self.panic_handler = Some(Arc::new(f));
        self
    }

    /// Spawns the worker thread.
    pub fn build(&self) -> io::Result<SerialExecutor> {
        SerialExecutor::build(self)
    }
}

assert_impl_all!(SerialExecutorBuilder: Send, Sync);

struct Shared {
    label: String,
    pending: AtomicUsize,
    running: AtomicBool,
}

pub struct SerialExecutor {
    name: Option<String>,
    shared: Arc<Shared>,
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

assert_impl_all!(SerialExecutor: Send, Sync);

impl SerialExecutor {
    /// Starts an executor with the default panic handler.
    pub fn new(name: Option<&str>) -> io::Result<Self> {
        let mut b = SerialExecutorBuilder::new();
        if let Some(name) = name {
            b.name(name);
        }
        b.build()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Queues `task` to run after every task submitted before it.
    ///
    /// Fails with [`SubmitError::AlreadyShutdown`] once [`shutdown`](Self::shutdown) was called.
    pub fn submit<F>(&self, task: F) -> Result<(), SubmitError>
        where F: FnOnce() + Send + 'static
    {
        let sender = lock(&self.sender);
        let sender = sender.as_ref().ok_or(SubmitError::AlreadyShutdown)?;
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(Box::new(task)).is_err() {
            // Worker thread is gone.
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(SubmitError::AlreadyShutdown);
        }
        Ok(())
    }

    /// Number of queued tasks that haven't started yet. Only a snapshot.
    pub fn pending_count(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    /// Whether a task is running or queued.
    pub fn is_busy(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst) || self.pending_count() > 0
    }

    pub fn is_shutdown(&self) -> bool {
        lock(&self.sender).is_none()
    }

    /// Stops accepting tasks. Already queued tasks still run, then the worker exits.
    /// Calling it again does nothing.
    pub fn shutdown(&self) {
        if lock(&self.sender).take().is_some() {
            debug!("{} shutting down, {} task(s) pending", self.shared.label, self.pending_count());
        }
    }

    /// Shuts down and waits until the worker has run every queued task.
    ///
    /// From within a task this only shuts down, since the worker can't wait for itself.
    pub fn join(&self) {
        self.shutdown();
        if thread::current().id() == self.worker_id {
            return;
        }
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("{} worker thread panicked", self.shared.label);
            }
        }
    }

    fn build(b: &SerialExecutorBuilder) -> io::Result<Self> {
        let label = match &b.name {
            Some(name) => format!("serial-executor `{}`", name),
            None => "serial-executor".to_owned(),
        };
        let shared = Arc::new(Shared {
            label: label.clone(),
            pending: AtomicUsize::new(0),
            running: AtomicBool::new(false),
        });
        let panic_handler: PanicHandler = match &b.panic_handler {
            Some(h) => h.clone(),
            None => Arc::new(|p: TaskPanic| error!("{}", p)),
        };
        let (sender, receiver) = mpsc::channel();

        let worker = {
            let shared = shared.clone();
            thread::Builder::new()
                .name(label)
                .spawn(move || run(&shared, receiver, &*panic_handler))?
        };

        Ok(Self {
            name: b.name.clone(),
            shared,
            sender: Mutex::new(Some(sender)),
            worker_id: worker.thread().id(),
            worker: Mutex::new(Some(worker)),
        })
    }
}

impl Drop for SerialExecutor {
    fn drop(&mut self) {
        self.join();
    }
}

impl fmt::Debug for SerialExecutor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SerialExecutor")
            .field("name", &self.name)
            .field("pending", &self.pending_count())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

fn run(shared: &Shared, receiver: mpsc::Receiver<Task>, panic_handler: &(dyn Fn(TaskPanic) + Send + Sync)) {
    debug!("{} started", shared.label);

    // Ends once the sender is dropped and the queue is drained.
    for task in receiver.iter() {
        shared.running.store(true, Ordering::SeqCst);
        shared.pending.fetch_sub(1, Ordering::SeqCst);

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            let p = TaskPanic {
                executor: shared.label.clone(),
                message: panic_message(&*payload),
            };
            if panic::catch_unwind(AssertUnwindSafe(|| panic_handler(p))).is_err() {
                error!("{} panic handler panicked", shared.label);
            }
        }

        shared.running.store(false, Ordering::SeqCst);
    }

    debug!("{} stopped", shared.label);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_owned()
    }
}
