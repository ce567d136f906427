//! Adapter selection for call sites.
//!
//! [`RebindingCallAdapterFactory`] inspects a call site's declared
//! [`ReturnShape`] and its markers once, when the call site is built, and
//! either declines (no rebind marker) or returns a [`RebindingCallAdapter`]
//! with the response type and priority baked in. Misconfiguration is reported
//! here rather than when a call runs.

use std::sync::Arc;

use tracing::debug;

use crate::{
    AsyncCall, ConfigurationError, DispatchOptions, DispatchPriority, DispatchTarget, MarkerName,
    RebindingCall, ResponseType, ReturnShape,
};

/// A marker attached to a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallSiteMarker {
    /// Deliver this call site's asynchronous outcomes on the dispatch target.
    Rebind(DispatchOptions),
    /// A marker meant for some other layer; passed through untouched.
    Other(MarkerName),
}

// ---------------------------------------------------------------------------

/// Produces [`RebindingCallAdapter`]s bound to one dispatch target.
#[derive(Clone)]
pub struct RebindingCallAdapterFactory {
    target: Arc<dyn DispatchTarget>,
}

impl RebindingCallAdapterFactory {
    /// Creates a factory whose adapters deliver outcomes on `target`.
    pub fn create(target: Arc<dyn DispatchTarget>) -> Self {
        Self { target }
    }

    /// Selects an adapter for a call site.
    ///
    /// Returns `Ok(None)` when the call site carries no rebind marker.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::DuplicateMarker`] if more than one rebind marker is present.
    /// - [`ConfigurationError::IncompatibleReturnShape`] if the call site does not return a call.
    /// - [`ConfigurationError::UnparameterizedCall`] if the call has no response type.
    pub fn get(
        &self,
        return_shape: &ReturnShape,
        markers: &[CallSiteMarker],
    ) -> Result<Option<RebindingCallAdapter>, ConfigurationError> {
        let mut options = None;
        let mut rebind_count = 0;
        let mut remaining_markers = Vec::with_capacity(markers.len());
        for marker in markers {
            match marker {
                CallSiteMarker::Rebind(o) => {
                    rebind_count += 1;
                    options.get_or_insert(*o);
                }
                other => remaining_markers.push(other.clone()),
            }
        }

        if rebind_count > 1 {
            return Err(ConfigurationError::DuplicateMarker {
                count: rebind_count,
            });
        }
        let Some(options) = options else {
            debug!(return_shape = %return_shape, "No rebind marker; call site left unadapted");
            return Ok(None);
        };

        let response_type = match return_shape {
            ReturnShape::Call {
                response_type: Some(t),
            } => t.clone(),
            ReturnShape::Call {
                response_type: None,
            } => return Err(ConfigurationError::UnparameterizedCall),
            ReturnShape::Other { type_name } => {
                return Err(ConfigurationError::IncompatibleReturnShape {
                    found: type_name.clone(),
                })
            }
        };

        let priority = options.priority();
        debug!(response_type = %response_type, priority = %priority, "Selected rebinding adapter");
        Ok(Some(RebindingCallAdapter {
            response_type,
            priority,
            target: Arc::clone(&self.target),
            remaining_markers,
        }))
    }
}

impl std::fmt::Debug for RebindingCallAdapterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebindingCallAdapterFactory")
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------

/// Adapter selected for one call site. Wraps that call site's calls in
/// [`RebindingCall`]s with a fixed priority.
#[derive(Clone)]
pub struct RebindingCallAdapter {
    response_type: ResponseType,
    priority: DispatchPriority,
    target: Arc<dyn DispatchTarget>,
    remaining_markers: Vec<CallSiteMarker>,
}

impl RebindingCallAdapter {
    /// Response type the delegate calls produce.
    pub fn response_type(&self) -> &ResponseType {
        &self.response_type
    }

    /// Priority every adapted call uses.
    pub fn priority(&self) -> DispatchPriority {
        self.priority
    }

    /// The call site's markers minus the consumed rebind marker, in order.
    pub fn remaining_markers(&self) -> &[CallSiteMarker] {
        &self.remaining_markers
    }

    /// Wraps `call` so that its listener runs on this adapter's dispatch target.
    pub fn adapt<T: Send + 'static>(&self, call: Box<dyn AsyncCall<T>>) -> RebindingCall<T> {
        RebindingCall::new(Arc::from(call), Arc::clone(&self.target), self.priority)
    }
}

impl std::fmt::Debug for RebindingCallAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebindingCallAdapter")
            .field("response_type", &self.response_type)
            .field("priority", &self.priority)
            .field("remaining_markers", &self.remaining_markers)
            .finish_non_exhaustive()
    }
}
