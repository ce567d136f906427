//! Dispatch target doubles.
//!
//! - [`InlineDispatchTarget`] runs work as soon as it is submitted.
//! - [`RecordingDispatchTarget`] holds work until the test drains it.
//! - [`SerialQueue`] is a real single-thread queue with front-of-queue insertion.
//!
//! All three record which path ([`DispatchPriority`]) each submission used.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};

use call_adapter::{DispatchPriority, DispatchTarget, Work};

type Hook = Box<dyn Fn() + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// InlineDispatchTarget
// ---------------------------------------------------------------------------

/// Runs every submission immediately on the submitting thread.
#[derive(Default)]
pub struct InlineDispatchTarget {
    paths: Mutex<Vec<DispatchPriority>>,
    before_run: Option<Hook>,
}

impl InlineDispatchTarget {
    /// Creates a target with no hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a target that calls `hook` after accepting each submission and
    /// before running it.
    ///
    /// Lets a test act in the window between an outcome being captured and it
    /// being delivered (for example, to cancel the call).
    pub fn with_hook(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            paths: Mutex::new(Vec::new()),
            before_run: Some(Box::new(hook)),
        }
    }

    /// Paths used so far, in submission order.
    pub fn paths(&self) -> Vec<DispatchPriority> {
        lock(&self.paths).clone()
    }

    fn run(&self, priority: DispatchPriority, work: Work) {
        lock(&self.paths).push(priority);
        if let Some(hook) = &self.before_run {
            hook();
        }
        work();
    }
}

impl DispatchTarget for InlineDispatchTarget {
    fn schedule(&self, work: Work) {
        self.run(DispatchPriority::Ordinary, work);
    }

    fn schedule_at_front(&self, work: Work) {
        self.run(DispatchPriority::FrontOfQueue, work);
    }
}

// ---------------------------------------------------------------------------
// RecordingDispatchTarget
// ---------------------------------------------------------------------------

/// Holds submissions until [`RecordingDispatchTarget::run_pending`] is called.
#[derive(Default)]
pub struct RecordingDispatchTarget {
    pending: Mutex<Vec<Work>>,
    paths: Mutex<Vec<DispatchPriority>>,
}

impl RecordingDispatchTarget {
    /// Creates an empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths used so far, in submission order.
    pub fn paths(&self) -> Vec<DispatchPriority> {
        lock(&self.paths).clone()
    }

    /// Number of submissions not yet run.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Runs pending work in submission order on the current thread.
    ///
    /// Work submitted while draining runs in the same call. Returns how many
    /// units ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch: Vec<Work> = lock(&self.pending).drain(..).collect();
            if batch.is_empty() {
                return ran;
            }
            for work in batch {
                work();
                ran += 1;
            }
        }
    }

    fn push(&self, priority: DispatchPriority, work: Work) {
        lock(&self.paths).push(priority);
        lock(&self.pending).push(work);
    }
}

impl DispatchTarget for RecordingDispatchTarget {
    fn schedule(&self, work: Work) {
        self.push(DispatchPriority::Ordinary, work);
    }

    fn schedule_at_front(&self, work: Work) {
        self.push(DispatchPriority::FrontOfQueue, work);
    }
}

// ---------------------------------------------------------------------------
// SerialQueue
// ---------------------------------------------------------------------------

#[derive(Default)]
struct QueueState {
    work: VecDeque<Work>,
    // Number of front-of-queue entries at the head of `work`.
    front: usize,
    paths: Vec<DispatchPriority>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    ready: Condvar,
}

/// A dedicated thread running submitted work one unit at a time.
///
/// Ordinary work is appended. Front-of-queue work is inserted after any
/// front-of-queue work that is still pending and ahead of all ordinary work.
/// Dropping the queue runs whatever is still pending, then joins the thread.
pub struct SerialQueue {
    shared: Arc<Shared>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl SerialQueue {
    /// Starts the queue thread.
    pub fn start(name: &str) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState::default()),
            ready: Condvar::new(),
        });
        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || Self::run(&worker))?;
        let thread_id = handle.thread().id();

        Ok(Self {
            shared,
            thread_id,
            handle: Some(handle),
        })
    }

    /// The id of the thread that runs submitted work.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Paths used so far, in submission order.
    pub fn paths(&self) -> Vec<DispatchPriority> {
        lock(&self.shared.state).paths.clone()
    }

    fn run(shared: &Shared) {
        loop {
            let work = {
                let mut state = lock(&shared.state);
                loop {
                    if let Some(work) = state.work.pop_front() {
                        state.front = state.front.saturating_sub(1);
                        break work;
                    }
                    if state.shutdown {
                        return;
                    }
                    state = shared
                        .ready
                        .wait(state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            };
            work();
        }
    }

    fn push(&self, priority: DispatchPriority, work: Work) {
        let mut state = lock(&self.shared.state);
        state.paths.push(priority);
        match priority {
            DispatchPriority::Ordinary => state.work.push_back(work),
            DispatchPriority::FrontOfQueue => {
                let at = state.front;
                state.work.insert(at, work);
                state.front += 1;
            }
        }
        drop(state);
        self.shared.ready.notify_one();
    }
}

impl DispatchTarget for SerialQueue {
    fn schedule(&self, work: Work) {
        self.push(DispatchPriority::Ordinary, work);
    }

    fn schedule_at_front(&self, work: Work) {
        self.push(DispatchPriority::FrontOfQueue, work);
    }
}

impl Drop for SerialQueue {
    fn drop(&mut self) {
        lock(&self.shared.state).shutdown = true;
        self.shared.ready.notify_all();
        if thread::current().id() == self.thread_id {
            // Dropped from its own work; the thread exits once that work returns.
            return;
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Serial queue thread panicked");
            }
        }
    }
}
