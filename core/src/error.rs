//! Error taxonomy shared by every engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a failed operation.
///
/// Every kind is fatal to the enclosing call: the caller observes a full abort
/// and may resubmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller lacks the required authority
    Permission,
    /// A state guard rejected the call (wrong state, frozen funds, bad config)
    Precondition,
    /// A commitment or identifier did not check out
    Integrity,
    /// Overflow, underflow or division by zero
    Arithmetic,
    /// A nested call into a token, oracle or action handler failed
    ExternalCall,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Permission => "permission",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Arithmetic => "arithmetic",
            ErrorKind::ExternalCall => "external-call",
        };
        f.write_str(name)
    }
}
