//! Test doubles for the `call-adapter` crate.
//!
//! Nothing here is meant for production: [`SerialQueue`] is a fixture with
//! just enough of a dispatcher to observe threading and ordering, and
//! [`ScriptedCall`] replays a fixed outcome instead of talking to a transport.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`targets`] | `InlineDispatchTarget`, `RecordingDispatchTarget`, `SerialQueue` |
//! | [`call`] | `ScriptedCall` and its `Completion` modes |
//! | [`listener`] | `RecordingListener` and `Notifications` |

use tracing_subscriber::EnvFilter;

pub mod call;
pub mod listener;
pub mod targets;

pub use call::{Completion, ScriptedCall};
pub use listener::{Notification, Notifications, RecordingListener};
pub use targets::{InlineDispatchTarget, RecordingDispatchTarget, SerialQueue};

/// Installs a test-writer `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
