//! The call abstraction and its completion listener.
//!
//! [`AsyncCall`] is the capability set every call offers, whether it is a
//! transport-native call or a decorator such as [`crate::RebindingCall`].
//! [`CompletionListener`] receives the terminal outcome of an asynchronous call.

use crate::{CallError, CallRequest};

/// Receives the terminal outcome of an asynchronous call.
///
/// Both methods consume the listener, so a listener can be notified at most
/// once across both of them.
pub trait CompletionListener<T>: Send {
    /// Called with the response of a successful call.
    fn on_success(self: Box<Self>, response: T);

    /// Called when the call failed or was canceled.
    fn on_failure(self: Box<Self>, error: CallError);
}

/// Owned, type-erased listener as passed to [`AsyncCall::enqueue`].
pub type BoxListener<T> = Box<dyn CompletionListener<T>>;

/// A request/response call that can be run synchronously or asynchronously.
///
/// Implementations own their lifecycle state. `cancel`, `is_canceled`,
/// `is_executed`, and `request` must be safe to call from any thread.
pub trait AsyncCall<T>: Send + Sync {
    /// Runs the call on the current thread and returns its response.
    ///
    /// Blocks for the duration of the underlying transport call.
    fn execute(&self) -> Result<T, CallError>;

    /// Starts the call asynchronously and registers `listener` for its outcome.
    ///
    /// Returns [`CallError::InvalidArgument`] if `listener` is `None`. Once
    /// registration succeeds the listener is notified exactly once, unless the
    /// call never resolves.
    fn enqueue(&self, listener: Option<BoxListener<T>>) -> Result<(), CallError>;

    /// Requests cancellation. Never blocks.
    fn cancel(&self);

    /// Returns `true` once cancellation has been requested.
    fn is_canceled(&self) -> bool;

    /// Returns `true` once the call has been started by `execute` or `enqueue`.
    fn is_executed(&self) -> bool;

    /// Describes the request this call performs.
    fn request(&self) -> &CallRequest;

    /// Returns a new, not-yet-started call for the same request.
    fn duplicate(&self) -> Box<dyn AsyncCall<T>>;
}

// ---------------------------------------------------------------------------
// Closure-backed listeners
// ---------------------------------------------------------------------------

/// A [`CompletionListener`] built from two closures. See [`listener_fn`].
pub struct FnListener<S, F> {
    on_success: S,
    on_failure: F,
}

impl<T, S, F> CompletionListener<T> for FnListener<S, F>
where
    S: FnOnce(T) + Send,
    F: FnOnce(CallError) + Send,
{
    fn on_success(self: Box<Self>, response: T) {
        (self.on_success)(response)
    }

    fn on_failure(self: Box<Self>, error: CallError) {
        (self.on_failure)(error)
    }
}

/// Builds a boxed listener from a success closure and a failure closure.
pub fn listener_fn<T, S, F>(on_success: S, on_failure: F) -> BoxListener<T>
where
    S: FnOnce(T) + Send + 'static,
    F: FnOnce(CallError) + Send + 'static,
{
    Box::new(FnListener {
        on_success,
        on_failure,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn test_listener_fn_routes_success_and_failure() {
        let (tx, rx) = mpsc::channel();
        let tx2 = tx.clone();
        let listener = listener_fn(
            move |v: u32| tx.send(Ok(v)).unwrap(),
            move |e| tx2.send(Err(e)).unwrap(),
        );
        listener.on_success(3);
        assert_eq!(rx.recv().unwrap(), Ok(3));

        let (tx, rx) = mpsc::channel();
        let tx2 = tx.clone();
        let listener = listener_fn(
            move |v: u32| tx.send(Ok(v)).unwrap(),
            move |e| tx2.send(Err(e)).unwrap(),
        );
        listener.on_failure(CallError::Canceled);
        assert_eq!(rx.recv().unwrap(), Err(CallError::Canceled));
    }
}
