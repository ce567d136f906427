//! A listener that reports what it was told, and where.

use std::thread::{self, ThreadId};
use std::time::Duration;

use tokio::sync::mpsc;

use call_adapter::{BoxListener, CallError, CompletionListener, Outcome};

/// One notification received by a [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub struct Notification<T> {
    /// What the listener was told.
    pub outcome: Outcome<T>,
    /// The thread the listener ran on.
    pub thread: ThreadId,
}

/// Forwards its notification, with the observing thread, to a [`Notifications`]
/// receiver.
pub struct RecordingListener<T> {
    tx: mpsc::UnboundedSender<Notification<T>>,
}

impl<T: Send + 'static> RecordingListener<T> {
    /// Creates a boxed listener and the receiver that observes it.
    pub fn channel() -> (BoxListener<T>, Notifications<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Box::new(Self { tx }), Notifications { rx })
    }

    fn record(self, outcome: Outcome<T>) {
        // The receiver may already be gone when a test has finished asserting.
        let _ = self.tx.send(Notification {
            outcome,
            thread: thread::current().id(),
        });
    }
}

impl<T: Send + 'static> CompletionListener<T> for RecordingListener<T> {
    fn on_success(self: Box<Self>, response: T) {
        self.record(Outcome::Success(response));
    }

    fn on_failure(self: Box<Self>, error: CallError) {
        self.record(Outcome::Failure(error));
    }
}

/// Receiving side of a [`RecordingListener`].
pub struct Notifications<T> {
    rx: mpsc::UnboundedReceiver<Notification<T>>,
}

impl<T> Notifications<T> {
    /// Waits up to `within` for the next notification.
    pub async fn next(&mut self, within: Duration) -> Option<Notification<T>> {
        tokio::time::timeout(within, self.rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Returns a notification that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<Notification<T>> {
        self.rx.try_recv().ok()
    }

    /// Returns `true` once the listener has been dropped and every
    /// notification it sent has been received.
    pub fn is_finished(&mut self) -> bool {
        matches!(
            self.rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        )
    }
}
