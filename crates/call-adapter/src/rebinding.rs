//! The rebinding call decorator.
//!
//! [`RebindingCall`] wraps a delegate [`AsyncCall`] and changes one thing about
//! it: the thread on which the asynchronous listener runs. Every outcome the
//! delegate reports on its native completion thread is captured in a
//! [`ForwardingTask`] and submitted to a [`DispatchTarget`]; the caller's
//! listener only ever runs when the target executes that task.
//!
//! ## Cancellation
//!
//! A success captured on the completion thread is not delivered as-is. The
//! forwarding task asks the delegate whether it was canceled at the moment the
//! task runs on the target thread, and delivers [`CallError::Canceled`] instead
//! of the response if so. Failures are delivered unchanged without that check.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::{
    AsyncCall, BoxListener, CallError, CallId, CallRequest, CompletionListener, DispatchPriority,
    DispatchTarget, Outcome,
};

// ---------------------------------------------------------------------------
// RebindingCall
// ---------------------------------------------------------------------------

/// An [`AsyncCall`] whose listener notifications are delivered on a
/// [`DispatchTarget`].
///
/// Synchronous execution, cancellation, and state queries forward to the
/// delegate verbatim. The delegate and target are shared, never reassigned, and
/// the delegate remains the only owner of lifecycle state.
pub struct RebindingCall<T> {
    id: CallId,
    delegate: Arc<dyn AsyncCall<T>>,
    target: Arc<dyn DispatchTarget>,
    priority: DispatchPriority,
}

impl<T: Send + 'static> RebindingCall<T> {
    /// Wraps `delegate` so that its listener runs on `target`.
    pub fn new(
        delegate: Arc<dyn AsyncCall<T>>,
        target: Arc<dyn DispatchTarget>,
        priority: DispatchPriority,
    ) -> Self {
        Self {
            id: CallId::new_random(),
            delegate,
            target,
            priority,
        }
    }

    /// Identifier attached to this call's log events.
    pub fn id(&self) -> CallId {
        self.id
    }

    /// The dispatch path used for every forwarded outcome.
    pub fn priority(&self) -> DispatchPriority {
        self.priority
    }

    /// Returns an independent copy wrapping a duplicate of the delegate.
    ///
    /// The copy shares the dispatch target and priority but has a fresh
    /// identifier and fresh cancellation and execution state.
    pub fn duplicate_rebinding(&self) -> Self {
        Self::new(
            Arc::from(self.delegate.duplicate()),
            Arc::clone(&self.target),
            self.priority,
        )
    }
}

impl<T: Send + 'static> AsyncCall<T> for RebindingCall<T> {
    fn execute(&self) -> Result<T, CallError> {
        self.delegate.execute()
    }

    fn enqueue(&self, listener: Option<BoxListener<T>>) -> Result<(), CallError> {
        let Some(listener) = listener else {
            warn!(call_id = %self.id, "enqueue rejected: no listener supplied");
            return Err(CallError::InvalidArgument {
                message: "listener must not be None".to_string(),
            });
        };

        debug!(
            call_id = %self.id,
            priority = %self.priority,
            request = %self.delegate.request(),
            "Enqueueing call"
        );

        self.delegate.enqueue(Some(Box::new(RebindingListener {
            call_id: self.id,
            delegate: Arc::clone(&self.delegate),
            target: Arc::clone(&self.target),
            priority: self.priority,
            listener,
        })))
    }

    fn cancel(&self) {
        self.delegate.cancel()
    }

    fn is_canceled(&self) -> bool {
        self.delegate.is_canceled()
    }

    fn is_executed(&self) -> bool {
        self.delegate.is_executed()
    }

    fn request(&self) -> &CallRequest {
        self.delegate.request()
    }

    fn duplicate(&self) -> Box<dyn AsyncCall<T>> {
        Box::new(self.duplicate_rebinding())
    }
}

impl<T> std::fmt::Debug for RebindingCall<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebindingCall")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("request", self.delegate.request())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Internal listener registered with the delegate
// ---------------------------------------------------------------------------

/// Listener the wrapper hands to its delegate. Runs on the delegate's
/// completion thread and does nothing except schedule a [`ForwardingTask`].
struct RebindingListener<T> {
    call_id: CallId,
    delegate: Arc<dyn AsyncCall<T>>,
    target: Arc<dyn DispatchTarget>,
    priority: DispatchPriority,
    listener: BoxListener<T>,
}

impl<T: Send + 'static> RebindingListener<T> {
    fn forward(self, outcome: Outcome<T>) {
        let Self {
            call_id,
            delegate,
            target,
            priority,
            listener,
        } = self;

        trace!(
            call_id = %call_id,
            outcome = outcome.kind(),
            priority = %priority,
            "Delegate completed; scheduling forwarding task"
        );

        let task = ForwardingTask::new(call_id, delegate, listener, outcome);
        target.submit(priority, Box::new(move || task.run()));
    }
}

impl<T: Send + 'static> CompletionListener<T> for RebindingListener<T> {
    fn on_success(self: Box<Self>, response: T) {
        self.forward(Outcome::Success(response));
    }

    fn on_failure(self: Box<Self>, error: CallError) {
        self.forward(Outcome::Failure(error));
    }
}

// ---------------------------------------------------------------------------
// ForwardingTask
// ---------------------------------------------------------------------------

/// One captured outcome on its way to the caller's listener.
///
/// Built on the delegate's completion thread and consumed by [`run`] on the
/// dispatch target's thread.
///
/// [`run`]: ForwardingTask::run
pub struct ForwardingTask<T> {
    call_id: CallId,
    delegate: Arc<dyn AsyncCall<T>>,
    listener: BoxListener<T>,
    outcome: Outcome<T>,
}

impl<T> ForwardingTask<T> {
    /// Captures `outcome` for delivery to `listener`.
    pub fn new(
        call_id: CallId,
        delegate: Arc<dyn AsyncCall<T>>,
        listener: BoxListener<T>,
        outcome: Outcome<T>,
    ) -> Self {
        Self {
            call_id,
            delegate,
            listener,
            outcome,
        }
    }

    /// Delivers the captured outcome to the listener.
    ///
    /// A captured success becomes [`CallError::Canceled`] if the delegate
    /// reports cancellation at this point. A captured failure is delivered
    /// as-is.
    pub fn run(self) {
        let Self {
            call_id,
            delegate,
            listener,
            outcome,
        } = self;

        match outcome {
            Outcome::Success(response) => {
                if delegate.is_canceled() {
                    debug!(
                        call_id = %call_id,
                        "Call canceled before delivery; reporting cancellation instead of response"
                    );
                    listener.on_failure(CallError::Canceled);
                } else {
                    listener.on_success(response);
                }
            }
            Outcome::Failure(error) => listener.on_failure(error),
        }
    }
}

impl<T> std::fmt::Debug for ForwardingTask<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingTask")
            .field("call_id", &self.call_id)
            .field("outcome", &self.outcome.kind())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};

    use super::*;
    use crate::{listener_fn, Work};

    /// Delegate whose completion the test triggers by hand, standing in for
    /// the transport's completion thread.
    struct StubCall {
        request: CallRequest,
        canceled: AtomicBool,
        executed: AtomicBool,
        enqueues: AtomicUsize,
        pending: Mutex<Option<BoxListener<u32>>>,
        enqueue_error: Option<CallError>,
    }

    impl StubCall {
        fn new() -> Arc<Self> {
            Arc::new(Self::with_enqueue_error(None))
        }

        fn with_enqueue_error(enqueue_error: Option<CallError>) -> Self {
            Self {
                request: CallRequest::new("GET", "http://localhost/"),
                canceled: AtomicBool::new(false),
                executed: AtomicBool::new(false),
                enqueues: AtomicUsize::new(0),
                pending: Mutex::new(None),
                enqueue_error,
            }
        }

        fn complete(&self, outcome: Outcome<u32>) {
            let listener = self.pending.lock().unwrap().take().expect("no listener");
            match outcome {
                Outcome::Success(v) => listener.on_success(v),
                Outcome::Failure(e) => listener.on_failure(e),
            }
        }
    }

    impl AsyncCall<u32> for StubCall {
        fn execute(&self) -> Result<u32, CallError> {
            self.executed.store(true, Ordering::SeqCst);
            Ok(42)
        }

        fn enqueue(&self, listener: Option<BoxListener<u32>>) -> Result<(), CallError> {
            if let Some(err) = &self.enqueue_error {
                return Err(err.clone());
            }
            self.enqueues.fetch_add(1, Ordering::SeqCst);
            self.executed.store(true, Ordering::SeqCst);
            *self.pending.lock().unwrap() = listener;
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

        fn duplicate(&self) -> Box<dyn AsyncCall<u32>> {
            Box::new(Self::with_enqueue_error(self.enqueue_error.clone()))
        }
    }

    /// Target that holds work until the test drains it.
    #[derive(Default)]
    struct HeldTarget {
        queue: Mutex<Vec<(DispatchPriority, Work)>>,
    }

    impl HeldTarget {
        fn paths(&self) -> Vec<DispatchPriority> {
            self.queue.lock().unwrap().iter().map(|(p, _)| *p).collect()
        }

        fn drain(&self) {
            let work: Vec<_> = self.queue.lock().unwrap().drain(..).collect();
            for (_, w) in work {
                w();
            }
        }
    }

    impl DispatchTarget for HeldTarget {
        fn schedule(&self, work: Work) {
            self.queue
                .lock()
                .unwrap()
                .push((DispatchPriority::Ordinary, work));
        }

        fn schedule_at_front(&self, work: Work) {
            self.queue
                .lock()
                .unwrap()
                .push((DispatchPriority::FrontOfQueue, work));
        }
    }

    type Seen = mpsc::Receiver<Result<u32, CallError>>;

    fn channel_listener() -> (BoxListener<u32>, Seen) {
        let (tx, rx) = mpsc::channel();
        let tx2 = tx.clone();
        let listener = listener_fn(
            move |v| tx.send(Ok(v)).unwrap(),
            move |e| tx2.send(Err(e)).unwrap(),
        );
        (listener, rx)
    }

    fn wrap(
        delegate: &Arc<StubCall>,
        priority: DispatchPriority,
    ) -> (RebindingCall<u32>, Arc<HeldTarget>) {
        let target = Arc::new(HeldTarget::default());
        let call = RebindingCall::new(delegate.clone(), target.clone(), priority);
        (call, target)
    }

    #[test]
    fn test_success_is_delivered_only_when_target_runs() {
        let delegate = StubCall::new();
        let (call, target) = wrap(&delegate, DispatchPriority::Ordinary);
        let (listener, seen) = channel_listener();

        call.enqueue(Some(listener)).unwrap();
        assert!(seen.try_recv().is_err());

        delegate.complete(Outcome::Success(7));
        assert!(seen.try_recv().is_err(), "listener ran on completion thread");

        target.drain();
        assert_eq!(seen.try_recv().unwrap(), Ok(7));
        assert!(seen.try_recv().is_err());
    }

    #[test]
    fn test_cancel_between_capture_and_delivery_downgrades_success() {
        let delegate = StubCall::new();
        let (call, target) = wrap(&delegate, DispatchPriority::Ordinary);
        let (listener, seen) = channel_listener();

        call.enqueue(Some(listener)).unwrap();
        delegate.complete(Outcome::Success(7));
        call.cancel();
        target.drain();

        assert_eq!(seen.try_recv().unwrap(), Err(CallError::Canceled));
        assert!(seen.try_recv().is_err());
    }

    #[test]
    fn test_failure_is_not_rechecked_against_cancellation() {
        let delegate = StubCall::new();
        let (call, target) = wrap(&delegate, DispatchPriority::Ordinary);
        let (listener, seen) = channel_listener();

        call.enqueue(Some(listener)).unwrap();
        delegate.complete(Outcome::Failure(CallError::transport("connection reset")));
        call.cancel();
        target.drain();

        assert_eq!(
            seen.try_recv().unwrap(),
            Err(CallError::transport("connection reset"))
        );
    }

    #[test]
    fn test_cancel_after_delivery_sends_nothing_further() {
        let delegate = StubCall::new();
        let (call, target) = wrap(&delegate, DispatchPriority::Ordinary);
        let (listener, seen) = channel_listener();

        call.enqueue(Some(listener)).unwrap();
        delegate.complete(Outcome::Success(1));
        target.drain();
        call.cancel();
        target.drain();

        assert_eq!(seen.try_recv().unwrap(), Ok(1));
        assert!(seen.try_recv().is_err());
        assert!(call.is_canceled());
    }

    #[test]
    fn test_missing_listener_is_rejected_before_delegate_is_touched() {
        let delegate = StubCall::new();
        let (call, target) = wrap(&delegate, DispatchPriority::Ordinary);

        let err = call.enqueue(None).unwrap_err();

        assert!(matches!(err, CallError::InvalidArgument { .. }));
        assert_eq!(delegate.enqueues.load(Ordering::SeqCst), 0);
        assert!(!call.is_executed());
        assert!(target.paths().is_empty());
    }

    #[test]
    fn test_delegate_registration_error_propagates() {
        let delegate = Arc::new(StubCall::with_enqueue_error(Some(
            CallError::AlreadyExecuted,
        )));
        let (call, _target) = wrap(&delegate, DispatchPriority::Ordinary);
        let (listener, _seen) = channel_listener();

        assert_eq!(
            call.enqueue(Some(listener)),
            Err(CallError::AlreadyExecuted)
        );
    }

    #[test]
    fn test_priority_selects_dispatch_path_for_both_outcomes() {
        for priority in [DispatchPriority::Ordinary, DispatchPriority::FrontOfQueue] {
            for outcome in [Outcome::Success(1), Outcome::Failure(CallError::Canceled)] {
                let delegate = StubCall::new();
                let (call, target) = wrap(&delegate, priority);
                let (listener, _seen) = channel_listener();

                call.enqueue(Some(listener)).unwrap();
                delegate.complete(outcome);

                assert_eq!(target.paths(), vec![priority]);
            }
        }
    }

    #[test]
    fn test_passthrough_operations() {
        let delegate = StubCall::new();
        let (call, _target) = wrap(&delegate, DispatchPriority::Ordinary);

        assert_eq!(call.request(), &CallRequest::new("GET", "http://localhost/"));
        assert!(!call.is_executed());
        assert_eq!(call.execute(), Ok(42));
        assert!(call.is_executed());
        assert!(!call.is_canceled());
        call.cancel();
        assert!(delegate.is_canceled());
    }

    #[test]
    fn test_duplicate_keeps_target_and_priority_with_fresh_state() {
        let delegate = StubCall::new();
        let (call, target) = wrap(&delegate, DispatchPriority::FrontOfQueue);
        call.cancel();

        let copy = call.duplicate_rebinding();

        assert_ne!(copy.id(), call.id());
        assert_eq!(copy.priority(), DispatchPriority::FrontOfQueue);
        assert!(!copy.is_canceled());
        assert!(!copy.is_executed());
        assert!(Arc::ptr_eq(&copy.target, &(target.clone() as Arc<dyn DispatchTarget>)));
    }

    #[test]
    fn test_forwarding_task_checks_cancellation_when_run() {
        let delegate = StubCall::new();
        let (listener, seen) = channel_listener();
        let task = ForwardingTask::new(
            CallId::new_random(),
            delegate.clone(),
            listener,
            Outcome::Success(5),
        );

        delegate.cancel();
        task.run();

        assert_eq!(seen.try_recv().unwrap(), Err(CallError::Canceled));
    }
}
