//! The dispatch target port.
//!
//! A dispatch target is a single logical thread with a pending-work queue (a
//! UI thread's event loop, a dedicated worker). This crate only consumes the
//! trait; hosts supply the implementation.

use std::sync::Arc;

use crate::DispatchPriority;

/// A unit of work handed to a [`DispatchTarget`].
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// A serial execution context that runs submitted work later on its own thread.
///
/// Work runs in submission order, except that work submitted through
/// [`DispatchTarget::schedule_at_front`] is placed ahead of all pending
/// ordinary work (but behind front-of-queue work that is already pending).
/// Neither method waits for the target thread; production targets run `work`
/// later, never inside the submitting call.
pub trait DispatchTarget: Send + Sync {
    /// Appends `work` to the back of the queue.
    fn schedule(&self, work: Work);

    /// Inserts `work` ahead of all pending ordinary work.
    fn schedule_at_front(&self, work: Work);

    /// Submits `work` through the path selected by `priority`.
    fn submit(&self, priority: DispatchPriority, work: Work) {
        match priority {
            DispatchPriority::Ordinary => self.schedule(work),
            DispatchPriority::FrontOfQueue => self.schedule_at_front(work),
        }
    }
}

impl<D: DispatchTarget + ?Sized> DispatchTarget for Arc<D> {
    fn schedule(&self, work: Work) {
        (**self).schedule(work)
    }

    fn schedule_at_front(&self, work: Work) {
        (**self).schedule_at_front(work)
    }
}
