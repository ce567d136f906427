//! Shared value types for the call adapter domain.
//!
//! Unlike the identifiers in [`crate::identifiers`], these types carry values
//! that participate in adapter behaviour: which queue path a forwarded outcome
//! takes, what a call is requesting, and what a call site declares it returns.

use serde::{Deserialize, Serialize};

use crate::{CallError, ResponseType};

// ---------------------------------------------------------------------------
// Dispatch priority
// ---------------------------------------------------------------------------

/// Which dispatch-target path a wrapper uses for every outcome it forwards.
///
/// Fixed per wrapper at construction. [`DispatchPriority::FrontOfQueue`] jumps
/// ahead of previously queued ordinary work, but not ahead of front-of-queue
/// work that is already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPriority {
    /// Submit through [`crate::DispatchTarget::schedule`].
    #[default]
    Ordinary,
    /// Submit through [`crate::DispatchTarget::schedule_at_front`].
    FrontOfQueue,
}

impl DispatchPriority {
    /// Returns `true` for [`DispatchPriority::FrontOfQueue`].
    pub fn is_front_of_queue(self) -> bool {
        matches!(self, Self::FrontOfQueue)
    }
}

impl From<bool> for DispatchPriority {
    fn from(front_of_queue: bool) -> Self {
        if front_of_queue {
            Self::FrontOfQueue
        } else {
            Self::Ordinary
        }
    }
}

impl std::fmt::Display for DispatchPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ordinary => write!(f, "ordinary"),
            Self::FrontOfQueue => write!(f, "front_of_queue"),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

/// Description of the request a call performs.
///
/// Calls only describe their request; building and sending it is the
/// transport's business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallRequest {
    /// Request method (e.g. `"GET"`).
    pub method: String,
    /// Fully resolved request URL.
    pub url: String,
}

impl CallRequest {
    /// Creates a new [`CallRequest`].
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }
}

impl std::fmt::Display for CallRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// ---------------------------------------------------------------------------

/// The terminal outcome of one call attempt, as observed from the delegate.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The call produced a response.
    Success(T),
    /// The call failed.
    Failure(CallError),
}

impl<T> Outcome<T> {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
        }
    }
}

impl<T> From<Result<T, CallError>> for Outcome<T> {
    fn from(result: Result<T, CallError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }
}

// ---------------------------------------------------------------------------
// Call-site return shapes
// ---------------------------------------------------------------------------

/// The return type a call site declares, as seen by adapter selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnShape {
    /// The call site returns a call.
    ///
    /// `response_type` is `None` when the call type was declared without a
    /// type parameter.
    Call {
        /// Response type the call produces.
        response_type: Option<ResponseType>,
    },
    /// The call site returns something other than a call.
    Other {
        /// Name of the declared return type.
        type_name: String,
    },
}

impl ReturnShape {
    /// Shorthand for a parameterised call shape.
    pub fn call(response_type: ResponseType) -> Self {
        Self::Call {
            response_type: Some(response_type),
        }
    }
}

impl std::fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call {
                response_type: Some(t),
            } => write!(f, "Call<{t}>"),
            Self::Call {
                response_type: None,
            } => write!(f, "Call"),
            Self::Other { type_name } => write!(f, "{type_name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_flag() {
        assert_eq!(DispatchPriority::from(true), DispatchPriority::FrontOfQueue);
        assert_eq!(DispatchPriority::from(false), DispatchPriority::Ordinary);
        assert_eq!(DispatchPriority::default(), DispatchPriority::Ordinary);
    }

    #[test]
    fn test_outcome_from_result() {
        let ok: Outcome<u32> = Ok(7).into();
        assert_eq!(ok, Outcome::Success(7));
        let err: Outcome<u32> = Err(CallError::Canceled).into();
        assert_eq!(err.kind(), "failure");
    }

    #[test]
    fn test_return_shape_display() {
        let shape = ReturnShape::call(ResponseType::new("User").unwrap());
        assert_eq!(shape.to_string(), "Call<User>");
        assert_eq!(
            ReturnShape::Call {
                response_type: None
            }
            .to_string(),
            "Call"
        );
    }
}
