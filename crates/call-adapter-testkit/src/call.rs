//! A scripted delegate call.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use call_adapter::{AsyncCall, BoxListener, CallError, CallRequest, Outcome};

/// Where a [`ScriptedCall`] reports its outcome after `enqueue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Synchronously, inside `enqueue`.
    Inline,
    /// On a freshly spawned thread.
    Spawned,
    /// When the test calls [`ScriptedCall::complete_pending`].
    Manual,
}

/// An [`AsyncCall`] that completes with a fixed outcome.
///
/// Mirrors a transport call's lifecycle: it can be started once, and
/// cancellation is only recorded; the scripted outcome is reported regardless.
pub struct ScriptedCall<T> {
    request: CallRequest,
    outcome: Outcome<T>,
    completion: Completion,
    canceled: AtomicBool,
    executed: AtomicBool,
    enqueues: AtomicUsize,
    pending: Mutex<Option<BoxListener<T>>>,
    completion_thread: Arc<Mutex<Option<ThreadId>>>,
}

impl<T: Clone + Send + Sync + 'static> ScriptedCall<T> {
    /// A call that succeeds with `value`, completing inline.
    pub fn succeeding(value: T) -> Self {
        Self::new(Outcome::Success(value))
    }

    /// A call that fails with `error`, completing inline.
    pub fn failing(error: CallError) -> Self {
        Self::new(Outcome::Failure(error))
    }

    fn new(outcome: Outcome<T>) -> Self {
        Self {
            request: CallRequest::new("GET", "http://localhost/"),
            outcome,
            completion: Completion::Inline,
            canceled: AtomicBool::new(false),
            executed: AtomicBool::new(false),
            enqueues: AtomicUsize::new(0),
            pending: Mutex::new(None),
            completion_thread: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets where the outcome is reported.
    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    /// Sets the request this call describes.
    pub fn with_request(mut self, request: CallRequest) -> Self {
        self.request = request;
        self
    }

    /// How many times `enqueue` registered a listener.
    pub fn enqueue_count(&self) -> usize {
        self.enqueues.load(Ordering::SeqCst)
    }

    /// The thread the outcome was reported on (or `execute` ran on), once it has been.
    pub fn completion_thread(&self) -> Option<ThreadId> {
        *self
            .completion_thread
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reports the outcome to a listener held by [`Completion::Manual`], on the
    /// current thread. Returns `false` if no listener was pending.
    pub fn complete_pending(&self) -> bool {
        let listener = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match listener {
            Some(listener) => {
                report(&self.completion_thread, listener, self.outcome.clone());
                true
            }
            None => false,
        }
    }

    fn start(&self) -> Result<(), CallError> {
        if self.executed.swap(true, Ordering::SeqCst) {
            return Err(CallError::AlreadyExecuted);
        }
        Ok(())
    }
}

fn report<T>(thread_slot: &Mutex<Option<ThreadId>>, listener: BoxListener<T>, outcome: Outcome<T>) {
    *thread_slot
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(thread::current().id());
    match outcome {
        Outcome::Success(value) => listener.on_success(value),
        Outcome::Failure(error) => listener.on_failure(error),
    }
}

impl<T: Clone + Send + Sync + 'static> AsyncCall<T> for ScriptedCall<T> {
    fn execute(&self) -> Result<T, CallError> {
        self.start()?;
        *self
            .completion_thread
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(thread::current().id());
        match &self.outcome {
            Outcome::Success(value) => Ok(value.clone()),
            Outcome::Failure(error) => Err(error.clone()),
        }
    }

    fn enqueue(&self, listener: Option<BoxListener<T>>) -> Result<(), CallError> {
        let listener = listener.ok_or_else(|| CallError::InvalidArgument {
            message: "listener must not be None".to_string(),
        })?;
        self.start()?;
        self.enqueues.fetch_add(1, Ordering::SeqCst);

        match self.completion {
            Completion::Inline => {
                report(&self.completion_thread, listener, self.outcome.clone());
            }
            Completion::Spawned => {
                let slot = Arc::clone(&self.completion_thread);
                let outcome = self.outcome.clone();
                thread::Builder::new()
                    .name("scripted-call-completion".to_string())
                    .spawn(move || report(&slot, listener, outcome))
                    .map_err(|e| CallError::transport(e.to_string()))?;
            }
            Completion::Manual => {
                *self
                    .pending
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(listener);
            }
        }
        Ok(())
    }

    fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    fn is_executed(&self) -> bool {
        self.executed.load(Ordering::SeqCst)
    }

    fn request(&self) -> &CallRequest {
        &self.request
    }

    fn duplicate(&self) -> Box<dyn AsyncCall<T>> {
        Box::new(
            Self::new(self.outcome.clone())
                .with_completion(self.completion)
                .with_request(self.request.clone()),
        )
    }
}
