//! Runtime error type for the value runtime.
//!
//! Every operation here runs against an owning
//! [`EvalContext`](crate::context::EvalContext), so the "last error" lives
//! as a field on that context instead of in thread-local storage.

use std::fmt;

/// Errors the value runtime can report.
///
/// Arithmetic and cast failures surface as the dedicated `ERROR` [`Item`]
/// sentinel (spec §7) rather than this type; `LambdaError` is for the
/// smaller set of operations that return a real `Result` (frame discipline,
/// allocation, validator setup).
#[derive(Debug, Clone, PartialEq)]
pub enum LambdaError {
    /// A frame was closed out of LIFO order, or closed more times than opened.
    FrameMismatch,
    /// The defensive iteration-budget guard in `frame_end` tripped
    /// (`loop_count > original_length + 100`, spec §4.2/§9). Never expected
    /// in a correctly operating runtime; this is the "implementation bug"
    /// catch spec.md calls out.
    FrameCorruption,
    /// A heap handle did not resolve to a live entry (double free, or a
    /// foreign/invalid pointer). Logged and ignored at the call site per
    /// spec §7; this variant exists so callers that want to know can ask.
    UnknownHandle,
    /// Allocation failed (pool exhausted).
    AllocationFailed,
    /// Arithmetic or coercion failure with a human-readable cause.
    ValueError(String),
}

impl fmt::Display for LambdaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LambdaError::FrameMismatch => write!(f, "frame closed out of LIFO order"),
            LambdaError::FrameCorruption => {
                write!(f, "frame_end iteration budget exceeded (corrupt heap entries)")
            }
            LambdaError::UnknownHandle => write!(f, "heap handle does not resolve to a live entry"),
            LambdaError::AllocationFailed => write!(f, "allocation failed"),
            LambdaError::ValueError(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LambdaError {}

impl LambdaError {
    pub fn value(msg: impl Into<String>) -> Self {
        LambdaError::ValueError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_non_empty() {
        for e in [
            LambdaError::FrameMismatch,
            LambdaError::FrameCorruption,
            LambdaError::UnknownHandle,
            LambdaError::AllocationFailed,
            LambdaError::value("divide by zero"),
        ] {
            assert!(!e.to_string().is_empty());
        }
    }

    #[test]
    fn value_error_carries_message() {
        let e = LambdaError::value("integer overflow in addition");
        assert_eq!(e.to_string(), "integer overflow in addition");
    }
}
