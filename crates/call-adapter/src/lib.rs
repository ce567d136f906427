//! Delivers asynchronous call outcomes on a caller-chosen serial thread.
//!
//! A transport reports call completion on whatever thread it likes. Code that
//! owns a single-threaded context (a UI thread, an event loop) wants those
//! notifications on *its* thread instead. This crate provides
//! [`RebindingCall`], a decorator over any [`AsyncCall`] that re-dispatches
//! listener notifications onto a [`DispatchTarget`], and
//! [`RebindingCallAdapterFactory`], which decides per call site whether to
//! apply it.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! Transports implement [`AsyncCall`]; hosts implement [`DispatchTarget`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`call`] | The `AsyncCall` and `CompletionListener` traits |
//! | [`dispatch`] | The `DispatchTarget` port |
//! | [`rebinding`] | `RebindingCall` and `ForwardingTask` |
//! | [`factory`] | Call-site adapter selection |
//! | [`config`] | Rebind options and JSON call-site configuration |
//! | [`identifiers`] | Newtype identifiers (`CallId`, `ResponseType`, etc.) |
//! | [`types`] | Shared value types (`DispatchPriority`, `Outcome`, etc.) |
//! | [`errors`] | Call and configuration error types |

pub mod call;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod factory;
pub mod identifiers;
pub mod rebinding;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use call::{listener_fn, AsyncCall, BoxListener, CompletionListener, FnListener};
pub use config::{AdapterConfig, DispatchOptions};
pub use dispatch::{DispatchTarget, Work};
pub use errors::{CallError, ConfigurationError};
pub use factory::{CallSiteMarker, RebindingCallAdapter, RebindingCallAdapterFactory};
pub use identifiers::{CallId, CallSiteName, MarkerName, ResponseType};
pub use rebinding::{ForwardingTask, RebindingCall};
pub use types::{CallRequest, DispatchPriority, Outcome, ReturnShape};
